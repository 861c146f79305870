//! Form configuration and builder.

use std::collections::{BTreeMap, HashMap, HashSet};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{FormError, Result};
use crate::mask;
use crate::schema::{FieldDefinition, RuleKind};

/// Current value of every input field, keyed by field id.
pub type FormValues = HashMap<String, String>;

/// Flat key/value set produced by a successful submission.
pub type FormPayload = BTreeMap<String, String>;

/// When field validation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationBehavior {
    /// Every change marks the field touched and shows its errors.
    #[default]
    OnChange,
    /// Errors appear once the field loses focus.
    OnBlur,
}

/// What a valid submission does with its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmitBehavior {
    /// Resolve immediately with the payload.
    #[default]
    LocalOnly,
    /// Hand the payload to the host dispatcher.
    DispatchExternal,
}

/// Immutable description of one form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormConfiguration {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub validation_behavior: ValidationBehavior,
    #[serde(default)]
    pub submit_behavior: SubmitBehavior,
    /// Styling metadata for the host; the engine never reads it.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub layout: serde_json::Value,
}

impl FormConfiguration {
    /// Starts a builder for a form with the given id.
    pub fn builder(id: impl Into<String>) -> FormBuilder {
        FormBuilder::new(id)
    }

    /// Parses and checks a JSON schema.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Parse`] if the text is not a valid schema, or the
    /// error of the first failed [`check`](Self::check).
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    /// Serializes the configuration as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Parse`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Looks up a field by id.
    pub fn field(&self, id: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Fields that hold values, in declaration order.
    pub fn input_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|f| !f.is_action())
    }

    /// Default value of every input field.
    pub fn default_values(&self) -> FormValues {
        self.input_fields()
            .map(|f| (f.id.clone(), f.default_value.clone()))
            .collect()
    }

    /// Verifies the structural invariants of the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: duplicate ids, dangling references,
    /// malformed rule parameters or masks, or cyclic visibility rules.
    pub fn check(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for field in &self.fields {
            if !ids.insert(field.id.as_str()) {
                return Err(FormError::DuplicateField(field.id.clone()));
            }
        }

        for field in &self.fields {
            for rule in &field.validators {
                check_rule_param(field, rule.kind, rule.param.as_deref(), &ids)?;
            }

            for dependency in field.visibility_dependencies() {
                if !ids.contains(dependency) {
                    return Err(FormError::UnknownReference {
                        field: field.id.clone(),
                        referenced: dependency.to_string(),
                    });
                }
            }

            if let Some(pattern) = field.formatting.as_ref().and_then(|f| f.mask.as_deref()) {
                if !mask::is_valid_pattern(pattern) {
                    return Err(FormError::InvalidMask {
                        field: field.id.clone(),
                        mask: pattern.to_string(),
                    });
                }
            }
        }

        self.check_visibility_cycles()
    }

    fn check_visibility_cycles(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit<'a>(
            config: &'a FormConfiguration,
            id: &'a str,
            marks: &mut HashMap<&'a str, Mark>,
        ) -> Result<()> {
            match marks.get(id) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => return Err(FormError::VisibilityCycle(id.to_string())),
                None => {}
            }
            marks.insert(id, Mark::Visiting);
            if let Some(field) = config.field(id) {
                for dependency in field.visibility_dependencies() {
                    visit(config, dependency, marks)?;
                }
            }
            marks.insert(id, Mark::Done);
            Ok(())
        }

        let mut marks = HashMap::new();
        for field in &self.fields {
            visit(self, &field.id, &mut marks)?;
        }
        Ok(())
    }
}

fn check_rule_param(
    field: &FieldDefinition,
    kind: RuleKind,
    param: Option<&str>,
    ids: &HashSet<&str>,
) -> Result<()> {
    let invalid = |message: &str| FormError::InvalidRuleParam {
        field: field.id.clone(),
        kind,
        message: message.to_string(),
    };

    let param = match param {
        Some(p) if !p.trim().is_empty() => p,
        _ if kind.needs_param() => return Err(invalid("missing parameter")),
        _ => return Ok(()),
    };

    match kind {
        RuleKind::MinLength | RuleKind::MaxLength => {
            param
                .trim()
                .parse::<usize>()
                .map_err(|_| invalid("expected a non-negative integer"))?;
        }
        RuleKind::Pattern => {
            Regex::new(param).map_err(|source| FormError::InvalidPattern {
                field: field.id.clone(),
                source,
            })?;
        }
        RuleKind::MatchesField if !ids.contains(param) => {
            return Err(FormError::UnknownReference {
                field: field.id.clone(),
                referenced: param.to_string(),
            });
        }
        _ => {}
    }
    Ok(())
}

/// Builds a [`FormConfiguration`] field by field.
#[derive(Debug)]
pub struct FormBuilder {
    config: FormConfiguration,
}

impl FormBuilder {
    /// Creates a new builder.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            config: FormConfiguration {
                id: id.into(),
                title: String::new(),
                description: None,
                fields: Vec::new(),
                validation_behavior: ValidationBehavior::default(),
                submit_behavior: SubmitBehavior::default(),
                layout: serde_json::Value::Null,
            },
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.config.description = Some(description.into());
        self
    }

    /// Adds a field to the form.
    #[must_use]
    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.config.fields.push(field);
        self
    }

    #[must_use]
    pub fn validation_behavior(mut self, behavior: ValidationBehavior) -> Self {
        self.config.validation_behavior = behavior;
        self
    }

    #[must_use]
    pub fn submit_behavior(mut self, behavior: SubmitBehavior) -> Self {
        self.config.submit_behavior = behavior;
        self
    }

    #[must_use]
    pub fn layout(mut self, layout: serde_json::Value) -> Self {
        self.config.layout = layout;
        self
    }

    /// Checks and returns the configuration.
    ///
    /// # Errors
    ///
    /// See [`FormConfiguration::check`].
    pub fn build(self) -> Result<FormConfiguration> {
        self.config.check()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldType, ValidationRule, VisibilityRule};

    fn text(id: &str) -> FieldDefinition {
        FieldDefinition::new(id, id, FieldType::Text)
    }

    #[test]
    fn test_form_builder() {
        let config = FormConfiguration::builder("pet")
            .title("New pet")
            .field(text("name").required())
            .field(text("breed"))
            .field(FieldDefinition::new("save", "Save", FieldType::Submit))
            .build()
            .unwrap();

        assert_eq!(config.fields.len(), 3);
        assert_eq!(config.input_fields().count(), 2);
        assert_eq!(config.validation_behavior, ValidationBehavior::OnChange);
        assert_eq!(config.submit_behavior, SubmitBehavior::LocalOnly);
        assert!(config.field("breed").is_some());
        assert_eq!(config.default_values().len(), 2);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = FormConfiguration::builder("f")
            .field(text("name"))
            .field(text("name"))
            .build()
            .unwrap_err();
        assert!(matches!(err, FormError::DuplicateField(id) if id == "name"));
    }

    #[test]
    fn test_dangling_references_rejected() {
        let err = FormConfiguration::builder("f")
            .field(text("b").visible_when(VisibilityRule::when("a", "X")))
            .build()
            .unwrap_err();
        assert!(matches!(err, FormError::UnknownReference { .. }));

        let err = FormConfiguration::builder("f")
            .field(text("confirm").validator(ValidationRule::matches_field("password")))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            FormError::UnknownReference { referenced, .. } if referenced == "password"
        ));
    }

    #[test]
    fn test_bad_rule_params_rejected() {
        let missing = ValidationRule {
            kind: RuleKind::MinLength,
            param: None,
            message: None,
        };
        let err = FormConfiguration::builder("f")
            .field(text("a").validator(missing))
            .build()
            .unwrap_err();
        assert!(matches!(err, FormError::InvalidRuleParam { kind: RuleKind::MinLength, .. }));

        let err = FormConfiguration::builder("f")
            .field(text("a").validator(ValidationRule::pattern("([a-z")))
            .build()
            .unwrap_err();
        assert!(matches!(err, FormError::InvalidPattern { .. }));
    }

    #[test]
    fn test_bad_mask_rejected() {
        let err = FormConfiguration::builder("f")
            .field(text("a").mask("+55 ##"))
            .build()
            .unwrap_err();
        assert!(matches!(err, FormError::InvalidMask { .. }));
    }

    #[test]
    fn test_visibility_cycle_rejected() {
        let err = FormConfiguration::builder("f")
            .field(text("a").visible_when(VisibilityRule::when("b", "1")))
            .field(text("b").visible_when(VisibilityRule::when("a", "1")))
            .build()
            .unwrap_err();
        assert!(matches!(err, FormError::VisibilityCycle(_)));

        let err = FormConfiguration::builder("f")
            .field(text("a").visible_when(VisibilityRule::when("a", "1")))
            .build()
            .unwrap_err();
        assert!(matches!(err, FormError::VisibilityCycle(id) if id == "a"));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "id": "pharmacy",
            "title": "Pharmacy",
            "validationBehavior": "ON_BLUR",
            "submitBehavior": "DISPATCH_EXTERNAL",
            "fields": [
                {"id": "name", "label": "Name", "validators": [{"kind": "REQUIRED"}]},
                {"id": "cnpj", "label": "CNPJ", "validators": [{"kind": "CNPJ"}]},
                {"id": "save", "label": "Save", "type": "SUBMIT"}
            ],
            "layout": {"columns": 2}
        }"#;

        let config = FormConfiguration::from_json(json).unwrap();
        assert_eq!(config.validation_behavior, ValidationBehavior::OnBlur);
        assert_eq!(config.submit_behavior, SubmitBehavior::DispatchExternal);
        assert_eq!(config.fields[2].field_type, FieldType::Submit);
        assert_eq!(config.layout["columns"], 2);

        let again = FormConfiguration::from_json(&config.to_json_pretty().unwrap()).unwrap();
        assert_eq!(again, config);
    }

    #[test]
    fn test_from_json_parse_error() {
        let err = FormConfiguration::from_json("{\"title\": 1}").unwrap_err();
        assert!(matches!(err, FormError::Parse(_)));
    }
}
