#![allow(dead_code)]

use petform::fields::{
    choice_field, confirm_password_field, cpf_field, email_field, password_field, phone_field,
    submit_button, switch_field, text_field,
};
use petform::{
    FormConfiguration, FormValues, SubmitBehavior, ValidationBehavior, VisibilityRule,
};

pub fn values(pairs: &[(&str, &str)]) -> FormValues {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// Email, password and confirmation.
pub fn login_form() -> FormConfiguration {
    FormConfiguration::builder("login")
        .title("Sign in")
        .field(email_field("email", "Email", true))
        .field(password_field("password", "Password", Some(8), false))
        .field(confirm_password_field("confirmPassword", "Confirm password", "password"))
        .field(submit_button("submit", "Sign in"))
        .build()
        .unwrap_or_else(|e| panic!("login form should be valid: {e}"))
}

/// Tutor registration with a field shown only for clinic referrals.
pub fn tutor_form(submit: SubmitBehavior, validation: ValidationBehavior) -> FormConfiguration {
    FormConfiguration::builder("tutor")
        .title("Tutor")
        .field(text_field("name", "Full name", 120, true).capitalize())
        .field(cpf_field("cpf", "CPF", true))
        .field(phone_field("phone", "Phone", true))
        .field(switch_field("referred", "Referred by a clinic", false))
        .field(
            text_field("clinic", "Clinic", 120, true)
                .visible_when(VisibilityRule::when("referred", "true")),
        )
        .field(choice_field("veterinarian", "Veterinarian", vec![], false))
        .field(submit_button("save", "Save"))
        .submit_behavior(submit)
        .validation_behavior(validation)
        .build()
        .unwrap_or_else(|e| panic!("tutor form should be valid: {e}"))
}

pub const VALID_CPF: &str = "52998224725";
pub const VALID_PHONE: &str = "11987654321";
