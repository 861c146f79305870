//! Error types for forms.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::schema::RuleKind;

/// Configuration and store errors.
#[derive(Debug, Error)]
pub enum FormError {
    /// Two fields share the same id.
    #[error("duplicate field id: {0}")]
    DuplicateField(String),

    /// A field id that is not declared in the active configuration.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// A rule or visibility condition names a field that does not exist.
    #[error("field {field} references undeclared field {referenced}")]
    UnknownReference { field: String, referenced: String },

    /// A rule parameter is missing or malformed.
    #[error("invalid {kind} parameter on field {field}: {message}")]
    InvalidRuleParam {
        field: String,
        kind: RuleKind,
        message: String,
    },

    /// A PATTERN rule carries a regex that does not compile.
    #[error("invalid pattern on field {field}: {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    /// Visibility rules depend on each other in a loop.
    #[error("visibility rules form a cycle through field {0}")]
    VisibilityCycle(String),

    /// An explicit mask has no placeholder or uses alphanumeric literals.
    #[error("invalid mask {mask:?} on field {field}")]
    InvalidMask { field: String, mask: String },

    /// Values cannot be written to SUBMIT or BUTTON fields.
    #[error("field {0} is an action and holds no value")]
    NotAnInput(String),

    /// Schema JSON could not be parsed.
    #[error("failed to parse form configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type alias for form operations.
pub type Result<T> = std::result::Result<T, FormError>;

/// A single failed rule on a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{field_id}: {message}")]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// Stable identifier: `{field_id}.{rule_index}.{kind}`.
    pub id: String,
    /// User-facing message.
    pub message: String,
    /// Field the failing rule belongs to.
    pub field_id: String,
    /// Kind of the rule that failed.
    pub kind: RuleKind,
}

impl ValidationError {
    /// Creates an error for the rule at `rule_index` of `field_id`.
    pub fn new(
        field_id: impl Into<String>,
        rule_index: usize,
        kind: RuleKind,
        message: impl Into<String>,
    ) -> Self {
        let field_id = field_id.into();
        Self {
            id: format!("{field_id}.{rule_index}.{kind}"),
            message: message.into(),
            field_id,
            kind,
        }
    }
}

/// Ordered collection of validation errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Creates a new empty collection.
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Appends an error.
    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Appends every error of `other`, keeping order.
    pub fn extend(&mut self, other: Self) {
        self.errors.extend(other.errors);
    }

    /// Returns whether there are any errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the total number of errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterates over all errors in order.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// Returns errors raised by a specific field.
    pub fn for_field<'a>(&'a self, field_id: &'a str) -> impl Iterator<Item = &'a ValidationError> {
        self.errors.iter().filter(move |e| e.field_id == field_id)
    }

    /// Returns errors raised by a specific rule kind.
    pub fn of_kind(&self, kind: RuleKind) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }

    /// Returns whether `field_id` has at least one error.
    pub fn has_field(&self, field_id: &str) -> bool {
        self.for_field(field_id).next().is_some()
    }

    /// Groups messages by field id.
    pub fn by_field(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for error in &self.errors {
            grouped
                .entry(error.field_id.as_str())
                .or_default()
                .push(error.message.as_str());
        }
        grouped
    }

    /// Consumes the collection, returning the errors in order.
    pub fn into_vec(self) -> Vec<ValidationError> {
        self.errors
    }
}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for error in &self.errors {
            writeln!(f, "{error}")?;
        }
        Ok(())
    }
}

/// Failure reported by a host dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DispatchError {
    message: String,
}

impl DispatchError {
    /// Creates a dispatch error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Wraps any displayable error.
    pub fn from_error(error: &impl std::fmt::Display) -> Self {
        Self::new(error.to_string())
    }

    /// Returns the underlying message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Why a submission did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// Validation failed on one or more visible fields.
    #[error("form is invalid ({} error(s))", .0.len())]
    Invalid(ValidationErrors),

    /// The host dispatcher reported a failure.
    #[error("dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    /// Another submission is still running.
    #[error("a submission is already in progress")]
    InProgress,

    /// The configuration was replaced before the dispatch result arrived.
    #[error("form configuration was replaced while the submission was in flight")]
    Superseded,

    /// The form dispatches externally but no dispatcher was supplied.
    #[error("form {0} dispatches externally but no dispatcher was supplied")]
    MissingDispatcher(String),
}
