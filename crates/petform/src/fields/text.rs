//! Text-like field helpers.

use crate::schema::{FieldDefinition, FieldType, ValidationRule};

fn base(id: &str, label: &str, field_type: FieldType, required: bool) -> FieldDefinition {
    let field = FieldDefinition::new(id, label, field_type);
    if required {
        field.required()
    } else {
        field
    }
}

/// Creates a single-line text field with a maximum length.
pub fn text_field(id: &str, label: &str, max_length: usize, required: bool) -> FieldDefinition {
    base(id, label, FieldType::Text, required).validator(ValidationRule::max_length(max_length))
}

/// Creates a multi-line text field.
pub fn textarea_field(id: &str, label: &str, required: bool) -> FieldDefinition {
    base(id, label, FieldType::Textarea, required)
}

/// Creates an email field.
pub fn email_field(id: &str, label: &str, required: bool) -> FieldDefinition {
    base(id, label, FieldType::Email, required).validator(ValidationRule::email())
}

/// Creates a required password field.
///
/// With `strong` set the value must also pass PASSWORD_STRENGTH.
pub fn password_field(
    id: &str,
    label: &str,
    min_length: Option<usize>,
    strong: bool,
) -> FieldDefinition {
    let mut field = base(id, label, FieldType::Password, true);

    if let Some(min) = min_length {
        field = field.validator(ValidationRule::min_length(min));
    }
    if strong {
        field = field.validator(ValidationRule::password_strength());
    }

    field
}

/// Creates a required password confirmation bound to `password_id`.
pub fn confirm_password_field(id: &str, label: &str, password_id: &str) -> FieldDefinition {
    let rule = ValidationRule::matches_field(password_id).with_message("Passwords do not match");
    base(id, label, FieldType::Password, true).validator(rule)
}

/// Creates a Brazilian phone field, masked as landline or mobile.
pub fn phone_field(id: &str, label: &str, required: bool) -> FieldDefinition {
    base(id, label, FieldType::Phone, required).validator(ValidationRule::phone())
}

/// Creates a CPF field.
///
/// The id does not need to end in `cpf`; the mask is set explicitly.
pub fn cpf_field(id: &str, label: &str, required: bool) -> FieldDefinition {
    base(id, label, FieldType::Text, required)
        .mask(crate::mask::CPF_MASK)
        .validator(ValidationRule::cpf())
}

/// Creates a CNPJ field.
pub fn cnpj_field(id: &str, label: &str, required: bool) -> FieldDefinition {
    base(id, label, FieldType::Text, required)
        .mask(crate::mask::CNPJ_MASK)
        .validator(ValidationRule::cnpj())
}

/// Creates a CEP (postal code) field.
pub fn cep_field(id: &str, label: &str, required: bool) -> FieldDefinition {
    base(id, label, FieldType::Text, required)
        .mask(crate::mask::CEP_MASK)
        .validator(ValidationRule::cep())
}

/// Creates an integer field.
pub fn number_field(id: &str, label: &str, required: bool) -> FieldDefinition {
    base(id, label, FieldType::Number, required).validator(ValidationRule::numeric())
}

/// Creates a decimal field; a comma is accepted as the separator.
pub fn decimal_field(id: &str, label: &str, required: bool) -> FieldDefinition {
    base(id, label, FieldType::Decimal, required).validator(ValidationRule::decimal())
}

/// Creates a `DD/MM/YYYY` date field.
pub fn date_field(id: &str, label: &str, required: bool) -> FieldDefinition {
    base(id, label, FieldType::Date, required)
        .mask("##/##/####")
        .placeholder("DD/MM/AAAA")
}
