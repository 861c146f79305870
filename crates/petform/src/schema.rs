//! Field-level schema types.
//!
//! Everything here is plain data: it can be built in code through the
//! builder methods or deserialized from JSON.

use serde::{Deserialize, Deserializer, Serialize};

/// Semantic type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    #[default]
    Text,
    Email,
    Phone,
    Password,
    Number,
    Decimal,
    Date,
    Select,
    Textarea,
    Switch,
    Radio,
    SegmentedControl,
    Submit,
    Button,
}

impl FieldType {
    /// Returns whether the field is an action (holds no value).
    pub const fn is_action(self) -> bool {
        matches!(self, Self::Submit | Self::Button)
    }

    /// Returns whether the field picks its value from a list of options.
    pub const fn has_options(self) -> bool {
        matches!(self, Self::Select | Self::Radio | Self::SegmentedControl)
    }
}

/// Kind of validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleKind {
    Required,
    Email,
    Phone,
    Cpf,
    Cnpj,
    Cep,
    MinLength,
    MaxLength,
    Pattern,
    Numeric,
    Decimal,
    PasswordStrength,
    MatchesField,
    Custom,
}

impl RuleKind {
    /// Returns the snake_case name used in error ids.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Cpf => "cpf",
            Self::Cnpj => "cnpj",
            Self::Cep => "cep",
            Self::MinLength => "min_length",
            Self::MaxLength => "max_length",
            Self::Pattern => "pattern",
            Self::Numeric => "numeric",
            Self::Decimal => "decimal",
            Self::PasswordStrength => "password_strength",
            Self::MatchesField => "matches_field",
            Self::Custom => "custom",
        }
    }

    /// Returns whether the rule cannot be evaluated without a parameter.
    pub const fn needs_param(self) -> bool {
        matches!(
            self,
            Self::MinLength | Self::MaxLength | Self::Pattern | Self::MatchesField | Self::Custom
        )
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation rule attached to a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRule {
    /// What to check.
    pub kind: RuleKind,
    /// Length bound, regex, referenced field id or custom predicate key.
    #[serde(
        default,
        deserialize_with = "scalar_param",
        skip_serializing_if = "Option::is_none"
    )]
    pub param: Option<String>,
    /// Message shown when the rule fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidationRule {
    /// Creates a rule with no parameter and the default message.
    pub const fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            param: None,
            message: None,
        }
    }

    fn with_param(kind: RuleKind, param: impl Into<String>) -> Self {
        Self {
            kind,
            param: Some(param.into()),
            message: None,
        }
    }

    pub const fn required() -> Self {
        Self::new(RuleKind::Required)
    }

    pub const fn email() -> Self {
        Self::new(RuleKind::Email)
    }

    pub const fn phone() -> Self {
        Self::new(RuleKind::Phone)
    }

    pub const fn cpf() -> Self {
        Self::new(RuleKind::Cpf)
    }

    pub const fn cnpj() -> Self {
        Self::new(RuleKind::Cnpj)
    }

    pub const fn cep() -> Self {
        Self::new(RuleKind::Cep)
    }

    pub fn min_length(min: usize) -> Self {
        Self::with_param(RuleKind::MinLength, min.to_string())
    }

    pub fn max_length(max: usize) -> Self {
        Self::with_param(RuleKind::MaxLength, max.to_string())
    }

    /// Full-match regex rule.
    pub fn pattern(regex: impl Into<String>) -> Self {
        Self::with_param(RuleKind::Pattern, regex)
    }

    pub const fn numeric() -> Self {
        Self::new(RuleKind::Numeric)
    }

    pub const fn decimal() -> Self {
        Self::new(RuleKind::Decimal)
    }

    pub const fn password_strength() -> Self {
        Self::new(RuleKind::PasswordStrength)
    }

    /// Requires this field to equal `field_id` when both are filled in.
    pub fn matches_field(field_id: impl Into<String>) -> Self {
        Self::with_param(RuleKind::MatchesField, field_id)
    }

    /// Defers to the predicate registered under `key`.
    pub fn custom(key: impl Into<String>) -> Self {
        Self::with_param(RuleKind::Custom, key)
    }

    /// Overrides the default message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Parses the parameter as a length bound.
    pub fn length_bound(&self) -> Option<usize> {
        self.param.as_deref().and_then(|p| p.trim().parse().ok())
    }

    /// Returns the message to show when this rule fails.
    pub fn message(&self) -> String {
        if let Some(message) = &self.message {
            return message.clone();
        }
        let param = self.param.as_deref().unwrap_or_default();
        match self.kind {
            RuleKind::Required => "This field is required.".to_string(),
            RuleKind::Email => "Enter a valid email address.".to_string(),
            RuleKind::Phone => "Enter a valid phone number.".to_string(),
            RuleKind::Cpf => "Enter a valid CPF.".to_string(),
            RuleKind::Cnpj => "Enter a valid CNPJ.".to_string(),
            RuleKind::Cep => "Enter a valid CEP.".to_string(),
            RuleKind::MinLength => {
                format!("Ensure this value has at least {param} characters.")
            }
            RuleKind::MaxLength => format!("Ensure this value has at most {param} characters."),
            RuleKind::Pattern => "Enter a value in the expected format.".to_string(),
            RuleKind::Numeric => "Enter a whole number.".to_string(),
            RuleKind::Decimal => "Enter a valid number.".to_string(),
            RuleKind::PasswordStrength => {
                "Use at least 8 characters with letters and numbers.".to_string()
            }
            RuleKind::MatchesField => "The values do not match.".to_string(),
            RuleKind::Custom => "Invalid value.".to_string(),
        }
    }
}

/// Accepts numbers and booleans as well as strings for `param`.
fn scalar_param<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Comparison used by a visibility condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonOperator {
    #[default]
    Equals,
    NotEquals,
    /// Comma separated list of accepted values.
    OneOf,
    Contains,
    IsEmpty,
    IsNotEmpty,
    GreaterThan,
    LessThan,
}

/// One predicate over another field's current value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityCondition {
    /// Controlling field id.
    pub field: String,
    #[serde(default)]
    pub operator: ComparisonOperator,
    #[serde(default)]
    pub value: String,
}

impl VisibilityCondition {
    pub fn new(
        field: impl Into<String>,
        operator: ComparisonOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, ComparisonOperator::Equals, value)
    }
}

/// Conjunction of conditions controlling whether a field is active.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityRule {
    pub conditions: Vec<VisibilityCondition>,
}

impl VisibilityRule {
    /// Visible only while `field` equals `value`.
    pub fn when(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            conditions: vec![VisibilityCondition::equals(field, value)],
        }
    }

    /// Adds another condition that must also hold.
    #[must_use]
    pub fn and(mut self, condition: VisibilityCondition) -> Self {
        self.conditions.push(condition);
        self
    }
}

impl From<VisibilityCondition> for VisibilityRule {
    fn from(condition: VisibilityCondition) -> Self {
        Self {
            conditions: vec![condition],
        }
    }
}

/// Display formatting applied on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldFormatting {
    /// Mask pattern using `#` as placeholder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask: Option<String>,
    pub capitalize: bool,
    pub uppercase: bool,
}

/// A key/label pair offered by SELECT, RADIO and SEGMENTED_CONTROL fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub key: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// Definition of a form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Field id, unique within a configuration.
    pub id: String,
    /// Field label.
    #[serde(default)]
    pub label: String,
    /// Semantic type.
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    /// Value the field starts with.
    #[serde(default)]
    pub default_value: String,
    /// Rules evaluated in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<ValidationRule>,
    /// Visibility rule; absent means always visible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<VisibilityRule>,
    /// Mask and case transforms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatting: Option<FieldFormatting>,
    /// Static options, or options supplied later by the host.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    /// Placeholder text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Help text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    /// Whether the field accepts input initially.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

const fn enabled_by_default() -> bool {
    true
}

impl FieldDefinition {
    /// Creates a new field definition.
    pub fn new(id: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            field_type,
            default_value: String::new(),
            validators: Vec::new(),
            visibility: None,
            formatting: None,
            options: Vec::new(),
            placeholder: None,
            help_text: None,
            enabled: true,
        }
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self
    }

    /// Adds a validation rule.
    #[must_use]
    pub fn validator(mut self, rule: ValidationRule) -> Self {
        self.validators.push(rule);
        self
    }

    /// Adds a REQUIRED rule.
    #[must_use]
    pub fn required(self) -> Self {
        self.validator(ValidationRule::required())
    }

    /// Sets the visibility rule.
    #[must_use]
    pub fn visible_when(mut self, rule: impl Into<VisibilityRule>) -> Self {
        self.visibility = Some(rule.into());
        self
    }

    /// Sets an explicit mask pattern.
    #[must_use]
    pub fn mask(mut self, pattern: impl Into<String>) -> Self {
        self.formatting.get_or_insert_with(FieldFormatting::default).mask = Some(pattern.into());
        self
    }

    /// Title-cases each word on every change.
    #[must_use]
    pub fn capitalize(mut self) -> Self {
        self.formatting.get_or_insert_with(FieldFormatting::default).capitalize = true;
        self
    }

    /// Upper-cases the value on every change.
    #[must_use]
    pub fn uppercase(mut self) -> Self {
        self.formatting.get_or_insert_with(FieldFormatting::default).uppercase = true;
        self
    }

    /// Adds a static option.
    #[must_use]
    pub fn option(mut self, key: impl Into<String>, label: impl Into<String>) -> Self {
        self.options.push(SelectOption::new(key, label));
        self
    }

    /// Sets placeholder text.
    #[must_use]
    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = Some(text.into());
        self
    }

    /// Sets help text.
    #[must_use]
    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = Some(text.into());
        self
    }

    /// Disables the field.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Returns whether the field is an action (SUBMIT or BUTTON).
    pub const fn is_action(&self) -> bool {
        self.field_type.is_action()
    }

    /// Returns whether the field carries a REQUIRED rule.
    pub fn is_required(&self) -> bool {
        self.validators.iter().any(|r| r.kind == RuleKind::Required)
    }

    /// Ids of fields this field's visibility depends on.
    pub fn visibility_dependencies(&self) -> impl Iterator<Item = &str> {
        self.visibility
            .iter()
            .flat_map(|rule| rule.conditions.iter().map(|c| c.field.as_str()))
    }

    /// Returns whether a MATCHES_FIELD rule on this field points at `field_id`.
    pub fn matches_against(&self, field_id: &str) -> bool {
        self.validators
            .iter()
            .any(|r| r.kind == RuleKind::MatchesField && r.param.as_deref() == Some(field_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_builder() {
        let field = FieldDefinition::new("name", "Name", FieldType::Text)
            .required()
            .validator(ValidationRule::max_length(50))
            .capitalize()
            .help_text("Your pet's name");

        assert_eq!(field.id, "name");
        assert!(field.is_required());
        assert_eq!(field.validators.len(), 2);
        assert!(field.formatting.as_ref().is_some_and(|f| f.capitalize));
        assert!(field.enabled);
    }

    #[test]
    fn test_default_messages() {
        assert_eq!(
            ValidationRule::min_length(3).message(),
            "Ensure this value has at least 3 characters."
        );
        assert_eq!(
            ValidationRule::required().with_message("Name it!").message(),
            "Name it!"
        );
    }

    #[test]
    fn test_field_from_json() {
        let json = r#"{
            "id": "breed",
            "label": "Breed",
            "type": "SELECT",
            "validators": [
                {"kind": "REQUIRED", "message": "Pick a breed"},
                {"kind": "MAX_LENGTH", "param": 30}
            ],
            "visibility": {"conditions": [{"field": "species", "value": "dog"}]},
            "options": [{"key": "lab", "label": "Labrador"}]
        }"#;

        let field: FieldDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(field.field_type, FieldType::Select);
        assert_eq!(field.validators[1].length_bound(), Some(30));
        assert_eq!(field.validators[0].message(), "Pick a breed");
        let rule = field.visibility.as_ref().unwrap();
        assert_eq!(rule.conditions[0].operator, ComparisonOperator::Equals);
        assert_eq!(field.visibility_dependencies().collect::<Vec<_>>(), ["species"]);
        assert!(field.enabled);
    }

    #[test]
    fn test_action_types() {
        assert!(FieldType::Submit.is_action());
        assert!(FieldType::Button.is_action());
        assert!(!FieldType::Switch.is_action());
        assert!(FieldType::SegmentedControl.has_options());
    }

    #[test]
    fn test_matches_against() {
        let field = FieldDefinition::new("confirmPassword", "Confirm", FieldType::Password)
            .validator(ValidationRule::matches_field("password"));
        assert!(field.matches_against("password"));
        assert!(!field.matches_against("email"));
    }
}
