//! Conditional visibility.
//!
//! Visibility is a pure function of the current value map. Nothing is
//! cached between changes, so a partial update can never leave a field with
//! stale visibility.

use std::collections::HashMap;

use tracing::warn;

use crate::form::{FormConfiguration, FormValues};
use crate::schema::{ComparisonOperator, FieldDefinition, VisibilityCondition};
use crate::validation::parse_decimal;

impl ComparisonOperator {
    /// Compares a controlling field's value against the condition value.
    pub fn matches(self, actual: &str, expected: &str) -> bool {
        match self {
            Self::Equals => actual == expected,
            Self::NotEquals => actual != expected,
            Self::OneOf => expected.split(',').any(|candidate| candidate.trim() == actual),
            Self::Contains => actual.contains(expected),
            Self::IsEmpty => actual.trim().is_empty(),
            Self::IsNotEmpty => !actual.trim().is_empty(),
            Self::GreaterThan => compare_numbers(actual, expected, |a, b| a > b),
            Self::LessThan => compare_numbers(actual, expected, |a, b| a < b),
        }
    }
}

fn compare_numbers(actual: &str, expected: &str, op: impl FnOnce(f64, f64) -> bool) -> bool {
    match (parse_decimal(actual), parse_decimal(expected)) {
        (Some(a), Some(b)) => op(a, b),
        _ => false,
    }
}

impl VisibilityCondition {
    /// Evaluates the condition against a value map.
    pub fn holds(&self, values: &FormValues) -> bool {
        let actual = values.get(&self.field).map_or("", String::as_str);
        self.operator.matches(actual, &self.value)
    }
}

/// Returns whether `field` is visible given the current values.
///
/// A field without a rule is always visible; otherwise every condition must
/// hold.
pub fn is_visible(field: &FieldDefinition, values: &FormValues) -> bool {
    field
        .visibility
        .as_ref()
        .is_none_or(|rule| rule.conditions.iter().all(|c| c.holds(values)))
}

/// Resolves the visibility of every field in `config`.
///
/// A hidden controlling field contributes an empty value to the conditions
/// that reference it, so hiding propagates down dependency chains.
pub fn resolve(config: &FormConfiguration, values: &FormValues) -> HashMap<String, bool> {
    let mut resolver = Resolver {
        config,
        values,
        resolved: HashMap::with_capacity(config.fields.len()),
        in_progress: Vec::new(),
    };
    for field in &config.fields {
        resolver.visit(field);
    }
    resolver
        .resolved
        .into_iter()
        .map(|(id, visible)| (id.to_string(), visible))
        .collect()
}

struct Resolver<'a> {
    config: &'a FormConfiguration,
    values: &'a FormValues,
    resolved: HashMap<&'a str, bool>,
    in_progress: Vec<&'a str>,
}

impl<'a> Resolver<'a> {
    fn visit(&mut self, field: &'a FieldDefinition) -> bool {
        if let Some(&visible) = self.resolved.get(field.id.as_str()) {
            return visible;
        }
        if self.in_progress.contains(&field.id.as_str()) {
            // Rejected by `FormConfiguration::check`; only reachable for
            // configurations that skipped it.
            warn!(field = %field.id, "visibility cycle, treating field as visible");
            return true;
        }

        let Some(rule) = &field.visibility else {
            self.resolved.insert(&field.id, true);
            return true;
        };

        let config = self.config;
        let values = self.values;
        self.in_progress.push(&field.id);
        let mut visible = true;
        for condition in &rule.conditions {
            let controller_visible = config
                .field(&condition.field)
                .is_none_or(|controller| self.visit(controller));
            let actual = if controller_visible {
                values.get(&condition.field).map_or("", String::as_str)
            } else {
                ""
            };
            if !condition.operator.matches(actual, &condition.value) {
                visible = false;
                break;
            }
        }
        self.in_progress.pop();

        self.resolved.insert(&field.id, visible);
        visible
    }
}
