//! Field definition helpers.
//!
//! Shorthands for the field kinds pet-care forms use most. Each helper
//! returns a plain [`FieldDefinition`](crate::FieldDefinition) that can be
//! refined further with the builder methods.

mod action;
mod select;
mod text;
mod toggle;

pub use action::{button, submit_button};
pub use select::{choice_field, radio_field, segmented_field};
pub use text::{
    cep_field, cnpj_field, confirm_password_field, cpf_field, date_field, decimal_field,
    email_field, number_field, password_field, phone_field, text_field, textarea_field,
};
pub use toggle::{switch_field, OFF, ON};
