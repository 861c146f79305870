//! petform CLI
//!
//! Command-line tool for inspecting, validating and submitting forms.

mod catalog;
mod source;

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use petform::mask::{self, MaskSpec};
use petform::{
    DispatchError, FieldState, FieldStore, FormConfiguration, FormPayload, FormSession,
    FormValues, SubmissionError, SubmitBehavior, ValidationErrors,
};

/// Schema-driven pet-care forms.
#[derive(Parser)]
#[command(name = "petform")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory searched for `<name>.json` schemas.
    #[arg(short, long, env = "PETFORM_SCHEMA_DIR")]
    schema_dir: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in forms.
    Catalog,

    /// Print a form schema as JSON.
    Show {
        /// Built-in form name, schema file, or schema name in the schema directory.
        form: String,
    },

    /// Check a schema file for configuration errors.
    Check {
        /// Path to the schema JSON.
        schema: PathBuf,
    },

    /// Validate a set of values and print each field's state.
    Validate {
        /// Built-in form name, schema file, or schema name in the schema directory.
        form: String,

        /// JSON object mapping field ids to values.
        values: PathBuf,
    },

    /// Submit a set of values.
    ///
    /// Forms that dispatch externally print their payload to stdout.
    Submit {
        /// Built-in form name, schema file, or schema name in the schema directory.
        form: String,

        /// JSON object mapping field ids to values.
        values: PathBuf,
    },

    /// Apply a mask to a value.
    Mask {
        /// Mask pattern using `#` placeholders, or `phone`.
        pattern: String,

        /// Raw or masked input.
        value: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationReport {
    form: String,
    is_valid: bool,
    fields: Vec<FieldState>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let schema_dir = cli.schema_dir.as_deref();

    match cli.command {
        Commands::Catalog => {
            println!("{:<14} {:<22} {:>6}", "NAME", "TITLE", "FIELDS");
            println!("{:-<44}", "");
            for name in catalog::NAMES {
                let Some(config) = catalog::form(name)? else {
                    continue;
                };
                println!(
                    "{:<14} {:<22} {:>6}",
                    name,
                    config.title,
                    config.input_fields().count()
                );
            }
        }

        Commands::Show { form } => {
            let config = source::load_form(&form, schema_dir)?;
            println!("{}", config.to_json_pretty()?);
        }

        Commands::Check { schema } => {
            let config = source::load_schema(&schema)
                .with_context(|| format!("{} is not a valid form", schema.display()))?;
            info!(
                "{} ({}) is valid: {} input field(s)",
                config.id,
                schema.display(),
                config.input_fields().count()
            );
        }

        Commands::Validate { form, values } => {
            let config = source::load_form(&form, schema_dir)?;
            let values = source::load_values(&values)?;
            let report = validate(config, &values)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.is_valid {
                bail!("{} has invalid fields", report.form);
            }
        }

        Commands::Submit { form, values } => {
            let config = source::load_form(&form, schema_dir)?;
            let values = source::load_values(&values)?;
            submit(config, &values).await?;
        }

        Commands::Mask { pattern, value } => {
            let spec = if pattern.eq_ignore_ascii_case("phone") {
                MaskSpec::Phone
            } else if mask::is_valid_pattern(&pattern) {
                MaskSpec::Pattern(pattern.as_str().into())
            } else {
                bail!("{pattern:?} is not a valid mask: use '#' placeholders and no alphanumerics");
            };
            let raw: String = mask::strip_mask(&value)
                .chars()
                .take(spec.capacity())
                .collect();
            println!("display: {}", spec.apply(&raw));
            println!("raw:     {raw}");
        }
    }

    Ok(())
}

/// Writes every known value into `store`, skipping unknown ids.
fn fill(store: &FieldStore, values: &FormValues) {
    for (field, value) in values {
        if let Err(e) = store.set_value(field, value) {
            warn!("skipping {field}: {e}");
        }
    }
}

fn validate(config: FormConfiguration, values: &FormValues) -> anyhow::Result<ValidationReport> {
    let store = FieldStore::new(config)?;
    fill(&store, values);
    store.touch_visible();

    Ok(ValidationReport {
        form: store.config().id.clone(),
        is_valid: store.validate().is_valid(),
        fields: store.states(),
    })
}

async fn submit(config: FormConfiguration, values: &FormValues) -> anyhow::Result<()> {
    let session = FormSession::with_dispatcher(config, |payload: FormPayload| async move {
        let json = serde_json::to_string_pretty(&payload)
            .map_err(|e| DispatchError::from_error(&e))?;
        println!("{json}");
        Ok::<(), DispatchError>(())
    })?;
    fill(session.store(), values);

    let config = session.config();
    let form = config.id.as_str();
    match session.submit().await {
        Ok(payload) => {
            // External dispatch already printed the payload.
            if config.submit_behavior == SubmitBehavior::LocalOnly {
                println!("{}", serde_json::to_string_pretty(&payload)?);
            }
            info!("{form} submitted with {} field(s)", payload.len());
            Ok(())
        }
        Err(SubmissionError::Invalid(errors)) => {
            print_errors(&errors);
            bail!("{form} was not submitted: {} error(s)", errors.len())
        }
        Err(e) => Err(e).context(format!("{form} was not submitted")),
    }
}

fn print_errors(errors: &ValidationErrors) {
    for (field, messages) in errors.by_field() {
        for message in messages {
            eprintln!("  {field}: {message}");
        }
    }
}
