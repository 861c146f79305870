//! Switch field helper.

use crate::schema::{FieldDefinition, FieldType};

/// Value of a switch that is on.
pub const ON: &str = "true";
/// Value of a switch that is off.
pub const OFF: &str = "false";

/// Creates an on/off switch.
pub fn switch_field(id: &str, label: &str, on: bool) -> FieldDefinition {
    FieldDefinition::new(id, label, FieldType::Switch).default_value(if on { ON } else { OFF })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_field() {
        let field = switch_field("neutered", "Neutered", false);
        assert_eq!(field.id, "neutered");
        assert_eq!(field.default_value, "false");
        assert!(!field.is_required());
    }
}
