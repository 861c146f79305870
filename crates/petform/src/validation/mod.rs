//! Rule evaluation for single fields and whole forms.
//!
//! Every rule on a field is evaluated independently and every failure is
//! reported, so one field can carry several errors at once.

pub mod checksum;

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::warn;

use crate::error::{ValidationError, ValidationErrors};
use crate::form::{FormConfiguration, FormValues};
use crate::mask;
use crate::schema::{FieldDefinition, RuleKind, ValidationRule};
use crate::visibility;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("email regex is valid")
});

/// Host-supplied predicate for CUSTOM rules: `(value, all_values) -> ok`.
pub type CustomPredicate = Arc<dyn Fn(&str, &FormValues) -> bool + Send + Sync>;

/// Outcome of validating a field or a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(ValidationErrors),
}

impl ValidationResult {
    /// Wraps an error list, `Valid` when it is empty.
    pub fn from_errors(errors: ValidationErrors) -> Self {
        if errors.is_empty() {
            Self::Valid
        } else {
            Self::Invalid(errors)
        }
    }

    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Returns the errors, if any.
    pub const fn errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Valid => None,
            Self::Invalid(errors) => Some(errors),
        }
    }

    /// Returns the errors, empty when valid.
    pub fn into_errors(self) -> ValidationErrors {
        match self {
            Self::Valid => ValidationErrors::new(),
            Self::Invalid(errors) => errors,
        }
    }

    /// Converts into a `Result`.
    ///
    /// # Errors
    ///
    /// Returns the collected errors when invalid.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        match self {
            Self::Valid => Ok(()),
            Self::Invalid(errors) => Err(errors),
        }
    }
}

/// Evaluates validation rules.
///
/// Holds the CUSTOM predicate registry and a cache of compiled PATTERN
/// regexes.
#[derive(Clone, Default)]
pub struct ValidationEngine {
    custom: HashMap<String, CustomPredicate>,
    patterns: HashMap<String, Regex>,
}

impl fmt::Debug for ValidationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationEngine")
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .field("patterns", &self.patterns.len())
            .finish()
    }
}

impl ValidationEngine {
    /// Creates an engine with no custom predicates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the predicate used by CUSTOM rules whose param is `key`.
    #[must_use]
    pub fn with_custom<F>(mut self, key: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&str, &FormValues) -> bool + Send + Sync + 'static,
    {
        self.custom.insert(key.into(), Arc::new(predicate));
        self
    }

    /// Compiles the PATTERN rules of `config` ahead of time.
    pub fn prepare(&mut self, config: &FormConfiguration) {
        let patterns = config
            .fields
            .iter()
            .flat_map(|f| &f.validators)
            .filter(|r| r.kind == RuleKind::Pattern)
            .filter_map(|r| r.param.as_deref());
        for pattern in patterns {
            if self.patterns.contains_key(pattern) {
                continue;
            }
            if let Some(regex) = compile_full_match(pattern) {
                self.patterns.insert(pattern.to_string(), regex);
            }
        }
    }

    /// Validates one field's value against all of its rules.
    pub fn validate_field(
        &self,
        field: &FieldDefinition,
        value: &str,
        values: &FormValues,
    ) -> ValidationResult {
        if field.is_action() {
            return ValidationResult::Valid;
        }

        let errors: ValidationErrors = field
            .validators
            .iter()
            .enumerate()
            .filter(|(_, rule)| !self.passes(field, rule, value, values))
            .map(|(index, rule)| ValidationError::new(&field.id, index, rule.kind, rule.message()))
            .collect::<Vec<_>>()
            .into();

        ValidationResult::from_errors(errors)
    }

    /// Validates every visible input field of `config`.
    ///
    /// Hidden fields never contribute errors.
    pub fn validate_form(
        &self,
        config: &FormConfiguration,
        values: &FormValues,
    ) -> ValidationResult {
        let visible = visibility::resolve(config, values);
        let mut errors = ValidationErrors::new();

        for field in config.input_fields() {
            if !visible.get(&field.id).copied().unwrap_or(true) {
                continue;
            }
            let value = values.get(&field.id).map_or("", String::as_str);
            errors.extend(self.validate_field(field, value, values).into_errors());
        }

        ValidationResult::from_errors(errors)
    }

    fn passes(
        &self,
        field: &FieldDefinition,
        rule: &ValidationRule,
        value: &str,
        values: &FormValues,
    ) -> bool {
        match rule.kind {
            RuleKind::Required => !value.trim().is_empty(),
            RuleKind::Email => value.is_empty() || EMAIL_REGEX.is_match(value.trim()),
            RuleKind::Phone => (10..=11).contains(&checksum::digits(value).len()),
            RuleKind::Cpf => checksum::is_valid_cpf(value),
            RuleKind::Cnpj => checksum::is_valid_cnpj(value),
            RuleKind::Cep => checksum::digits(value).len() == 8,
            RuleKind::MinLength => {
                value.is_empty()
                    || self.bounded(field, rule, |bound| measure(field, value) >= bound)
            }
            RuleKind::MaxLength => {
                value.is_empty()
                    || self.bounded(field, rule, |bound| measure(field, value) <= bound)
            }
            RuleKind::Pattern => value.is_empty() || self.full_match(field, rule, value),
            RuleKind::Numeric => value.is_empty() || value.trim().parse::<i64>().is_ok(),
            RuleKind::Decimal => value.is_empty() || parse_decimal(value).is_some(),
            RuleKind::PasswordStrength => {
                value.chars().count() >= 8
                    && value.chars().any(char::is_alphabetic)
                    && value.chars().any(|c| c.is_ascii_digit())
            }
            RuleKind::MatchesField => {
                let other = rule
                    .param
                    .as_deref()
                    .and_then(|id| values.get(id))
                    .map_or("", String::as_str);
                value.is_empty() || other.is_empty() || value == other
            }
            RuleKind::Custom => self.custom_passes(field, rule, value, values),
        }
    }

    fn bounded(
        &self,
        field: &FieldDefinition,
        rule: &ValidationRule,
        check: impl FnOnce(usize) -> bool,
    ) -> bool {
        match rule.length_bound() {
            Some(bound) => check(bound),
            None => {
                warn!(field = %field.id, kind = %rule.kind, "length rule without a usable bound");
                false
            }
        }
    }

    fn full_match(&self, field: &FieldDefinition, rule: &ValidationRule, value: &str) -> bool {
        let Some(pattern) = rule.param.as_deref() else {
            warn!(field = %field.id, "pattern rule without a regex");
            return false;
        };
        let regex = match self.patterns.get(pattern) {
            Some(regex) => Cow::Borrowed(regex),
            None => match compile_full_match(pattern) {
                Some(regex) => Cow::Owned(regex),
                None => {
                    warn!(field = %field.id, pattern, "pattern does not compile");
                    return false;
                }
            },
        };
        regex.is_match(value)
    }

    fn custom_passes(
        &self,
        field: &FieldDefinition,
        rule: &ValidationRule,
        value: &str,
        values: &FormValues,
    ) -> bool {
        let predicate = rule.param.as_deref().and_then(|key| self.custom.get(key));
        match predicate {
            Some(predicate) => predicate(value, values),
            None => {
                warn!(
                    field = %field.id,
                    key = rule.param.as_deref().unwrap_or_default(),
                    "no predicate registered for custom rule"
                );
                false
            }
        }
    }
}

fn compile_full_match(pattern: &str) -> Option<Regex> {
    Regex::new(&format!("^(?:{pattern})$")).ok()
}

/// Length used by MIN_LENGTH/MAX_LENGTH.
///
/// Masked fields count alphanumeric characters only; free text counts every
/// character.
fn measure(field: &FieldDefinition, value: &str) -> usize {
    if mask::is_masked(field) {
        value.chars().filter(|c| c.is_alphanumeric()).count()
    } else {
        value.chars().count()
    }
}

/// Parses a real number, accepting a single comma as decimal separator.
pub fn parse_decimal(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let normalized: Cow<'_, str> = if trimmed.matches(',').count() == 1 && !trimmed.contains('.') {
        Cow::Owned(trimmed.replace(',', "."))
    } else {
        Cow::Borrowed(trimmed)
    };
    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Validates one field with a default engine.
pub fn validate_field(
    field: &FieldDefinition,
    value: &str,
    values: &FormValues,
) -> ValidationResult {
    ValidationEngine::default().validate_field(field, value, values)
}

/// Validates a whole form with a default engine.
pub fn validate_form(config: &FormConfiguration, values: &FormValues) -> ValidationResult {
    ValidationEngine::default().validate_form(config, values)
}
