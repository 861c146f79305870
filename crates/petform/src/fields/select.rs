//! Choice field helpers.

use crate::schema::{FieldDefinition, FieldType};

fn with_choices(
    id: &str,
    label: &str,
    field_type: FieldType,
    choices: Vec<(&str, &str)>,
    required: bool,
) -> FieldDefinition {
    let mut field = choices
        .into_iter()
        .fold(FieldDefinition::new(id, label, field_type), |field, (key, label)| {
            field.option(key, label)
        });

    if required {
        field = field.required();
    }

    field
}

/// Creates a dropdown.
///
/// `choices` may be empty when the host supplies options later through
/// [`FieldStore::set_options`](crate::FieldStore::set_options).
pub fn choice_field(
    id: &str,
    label: &str,
    choices: Vec<(&str, &str)>,
    required: bool,
) -> FieldDefinition {
    with_choices(id, label, FieldType::Select, choices, required)
}

/// Creates a radio group.
pub fn radio_field(
    id: &str,
    label: &str,
    choices: Vec<(&str, &str)>,
    required: bool,
) -> FieldDefinition {
    with_choices(id, label, FieldType::Radio, choices, required)
}

/// Creates a segmented control, preselecting the first choice.
pub fn segmented_field(id: &str, label: &str, choices: Vec<(&str, &str)>) -> FieldDefinition {
    let first = choices.first().map(|(key, _)| (*key).to_string());
    let field = with_choices(id, label, FieldType::SegmentedControl, choices, true);
    match first {
        Some(key) => field.default_value(key),
        None => field,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_field() {
        let field = choice_field("species", "Species", vec![("dog", "Dog"), ("cat", "Cat")], true);
        assert_eq!(field.options.len(), 2);
        assert_eq!(field.options[1].key, "cat");
        assert!(field.is_required());
    }

    #[test]
    fn test_choice_field_without_options() {
        let field = choice_field("vet", "Veterinarian", vec![], false);
        assert!(field.options.is_empty());
        assert!(!field.is_required());
    }

    #[test]
    fn test_segmented_field_defaults_to_first_choice() {
        let field = segmented_field("sex", "Sex", vec![("male", "Male"), ("female", "Female")]);
        assert_eq!(field.field_type, FieldType::SegmentedControl);
        assert_eq!(field.default_value, "male");
    }
}
