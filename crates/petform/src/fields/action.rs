//! Action field helpers. Actions carry no value and are never validated.

use crate::schema::{FieldDefinition, FieldType};

/// Creates the button that submits the form.
pub fn submit_button(id: &str, label: &str) -> FieldDefinition {
    FieldDefinition::new(id, label, FieldType::Submit)
}

/// Creates a host-handled button.
pub fn button(id: &str, label: &str) -> FieldDefinition {
    FieldDefinition::new(id, label, FieldType::Button)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actions() {
        assert!(submit_button("save", "Save").is_action());
        assert!(button("cancel", "Cancel").is_action());
    }
}
