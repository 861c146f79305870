//! Built-in pet-care forms.

use petform::fields::{
    cep_field, choice_field, cnpj_field, confirm_password_field, cpf_field, date_field,
    decimal_field, email_field, number_field, password_field, phone_field, radio_field,
    segmented_field, submit_button, switch_field, text_field, textarea_field,
};
use petform::{
    ComparisonOperator, FormConfiguration, Result, SubmitBehavior, ValidationBehavior,
    ValidationRule, VisibilityCondition, VisibilityRule,
};
use serde_json::json;

/// Names of the built-in forms, in display order.
pub const NAMES: [&str; 8] = [
    "tutor",
    "pet",
    "consultation",
    "vaccination",
    "medication",
    "prescription",
    "exam",
    "pharmacy",
];

/// Builds the built-in form called `name`.
///
/// Returns `Ok(None)` when no such form exists.
pub fn form(name: &str) -> Result<Option<FormConfiguration>> {
    let config = match name {
        "tutor" => tutor()?,
        "pet" => pet()?,
        "consultation" => consultation()?,
        "vaccination" => vaccination()?,
        "medication" => medication()?,
        "prescription" => prescription()?,
        "exam" => exam()?,
        "pharmacy" => pharmacy()?,
        _ => return Ok(None),
    };
    Ok(Some(config))
}

fn tutor() -> Result<FormConfiguration> {
    FormConfiguration::builder("tutor")
        .title("Tutor registration")
        .description("Owner account used to book consultations")
        .field(text_field("name", "Full name", 120, true).capitalize())
        .field(email_field("email", "Email", true))
        .field(cpf_field("cpf", "CPF", true))
        .field(phone_field("phone", "Mobile phone", true))
        .field(cep_field("cep", "CEP", false))
        .field(password_field("password", "Password", Some(8), true))
        .field(confirm_password_field(
            "confirmPassword",
            "Confirm password",
            "password",
        ))
        .field(submit_button("register", "Create account"))
        .build()
}

fn pet() -> Result<FormConfiguration> {
    FormConfiguration::builder("pet")
        .title("Pet")
        .field(text_field("name", "Name", 60, true).capitalize())
        .field(choice_field(
            "species",
            "Species",
            vec![
                ("dog", "Dog"),
                ("cat", "Cat"),
                ("bird", "Bird"),
                ("other", "Other"),
            ],
            true,
        ))
        .field(
            text_field("breed", "Breed", 60, false).visible_when(VisibilityCondition::new(
                "species",
                ComparisonOperator::OneOf,
                "dog,cat",
            )),
        )
        .field(
            text_field("otherSpecies", "Which species?", 60, true)
                .visible_when(VisibilityRule::when("species", "other")),
        )
        .field(segmented_field(
            "sex",
            "Sex",
            vec![("male", "Male"), ("female", "Female")],
        ))
        .field(date_field("birthDate", "Birth date", false))
        .field(decimal_field("weight", "Weight (kg)", false))
        .field(switch_field("neutered", "Neutered", false))
        .field(
            text_field("microchip", "Microchip", 15, false)
                .mask("###############")
                .validator(ValidationRule::min_length(15)),
        )
        .field(submit_button("save", "Save"))
        .layout(json!({ "columns": 2 }))
        .build()
}

fn consultation() -> Result<FormConfiguration> {
    FormConfiguration::builder("consultation")
        .title("Consultation")
        .field(choice_field("pet", "Pet", vec![], true))
        .field(choice_field("veterinarian", "Veterinarian", vec![], true))
        .field(date_field("date", "Date", true))
        .field(
            textarea_field("reason", "Reason", true).validator(ValidationRule::max_length(500)),
        )
        .field(switch_field("emergency", "Emergency", false))
        .field(
            textarea_field("symptoms", "Symptoms", true)
                .visible_when(VisibilityRule::when("emergency", "true")),
        )
        .field(submit_button("book", "Book consultation"))
        .submit_behavior(SubmitBehavior::DispatchExternal)
        .build()
}

fn vaccination() -> Result<FormConfiguration> {
    FormConfiguration::builder("vaccination")
        .title("Vaccination record")
        .field(choice_field("pet", "Pet", vec![], true))
        .field(choice_field(
            "vaccine",
            "Vaccine",
            vec![
                ("rabies", "Rabies"),
                ("v8", "V8"),
                ("v10", "V10"),
                ("giardia", "Giardia"),
                ("flu", "Canine flu"),
                ("felv", "FeLV"),
                ("other", "Other"),
            ],
            true,
        ))
        .field(
            text_field("otherVaccine", "Vaccine name", 80, true)
                .visible_when(VisibilityRule::when("vaccine", "other")),
        )
        .field(date_field("appliedOn", "Applied on", true))
        .field(text_field("batch", "Batch", 20, true).uppercase())
        .field(date_field("nextDose", "Next dose", false))
        .field(cnpj_field("clinicCnpj", "Clinic CNPJ", false))
        .field(submit_button("save", "Save"))
        .build()
}

fn medication() -> Result<FormConfiguration> {
    FormConfiguration::builder("medication")
        .title("Medication")
        .field(text_field("name", "Medicine", 80, true))
        .field(decimal_field("dosage", "Dosage", true))
        .field(segmented_field(
            "unit",
            "Unit",
            vec![("mg", "mg"), ("ml", "ml"), ("drops", "drops")],
        ))
        .field(number_field("frequencyHours", "Every (hours)", true))
        .field(switch_field("continuous", "Continuous use", false))
        .field(
            number_field("durationDays", "Duration (days)", true)
                .visible_when(VisibilityRule::when("continuous", "false")),
        )
        .field(textarea_field("notes", "Notes", false))
        .field(submit_button("save", "Save"))
        .validation_behavior(ValidationBehavior::OnBlur)
        .build()
}

fn prescription() -> Result<FormConfiguration> {
    FormConfiguration::builder("prescription")
        .title("Prescription")
        .field(text_field("veterinarian", "Veterinarian", 120, true).capitalize())
        .field(
            text_field("crmv", "CRMV", 12, true)
                .uppercase()
                .validator(
                    ValidationRule::pattern("[A-Z]{2}-?[0-9]{3,6}")
                        .with_message("Use the state and number, e.g. SP-12345"),
                ),
        )
        .field(cpf_field("tutorCpf", "Tutor CPF", true))
        .field(choice_field("pet", "Pet", vec![], true))
        .field(textarea_field("items", "Prescribed items", true))
        .field(date_field("validUntil", "Valid until", false))
        .field(submit_button("issue", "Issue prescription"))
        .submit_behavior(SubmitBehavior::DispatchExternal)
        .build()
}

fn exam() -> Result<FormConfiguration> {
    FormConfiguration::builder("exam")
        .title("Exam")
        .field(choice_field("pet", "Pet", vec![], true))
        .field(radio_field(
            "type",
            "Exam type",
            vec![
                ("blood", "Blood count"),
                ("urine", "Urinalysis"),
                ("xray", "X-ray"),
                ("ultrasound", "Ultrasound"),
                ("other", "Other"),
            ],
            true,
        ))
        .field(
            switch_field("fasting", "Fasting required", true).visible_when(
                VisibilityCondition::new("type", ComparisonOperator::OneOf, "blood,ultrasound"),
            ),
        )
        .field(date_field("scheduledFor", "Scheduled for", true))
        .field(cnpj_field("labCnpj", "Laboratory CNPJ", false))
        .field(textarea_field("result", "Result", false))
        .field(submit_button("save", "Save"))
        .build()
}

fn pharmacy() -> Result<FormConfiguration> {
    FormConfiguration::builder("pharmacy")
        .title("Pharmacy order")
        .field(text_field("pharmacyName", "Pharmacy", 120, true))
        .field(cnpj_field("cnpj", "CNPJ", true))
        .field(phone_field("pharmacyPhone", "Phone", false))
        .field(switch_field("delivery", "Home delivery", false))
        .field(
            cep_field("deliveryCep", "CEP", true)
                .visible_when(VisibilityRule::when("delivery", "true")),
        )
        .field(
            text_field("address", "Address", 200, true)
                .visible_when(VisibilityRule::when("delivery", "true")),
        )
        .field(
            text_field("addressNumber", "Number", 10, true)
                .visible_when(VisibilityRule::when("delivery", "true")),
        )
        .field(submit_button("order", "Place order"))
        .submit_behavior(SubmitBehavior::DispatchExternal)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_form_builds() {
        for name in NAMES {
            let config = form(name)
                .unwrap_or_else(|e| panic!("{name} fails its checks: {e}"))
                .unwrap_or_else(|| panic!("{name} is listed but not built"));
            assert_eq!(config.id, name);
            assert!(!config.title.is_empty());
        }
    }

    #[test]
    fn test_unknown_form() {
        assert!(form("grooming").unwrap().is_none());
    }

    #[test]
    fn test_json_round_trip() {
        let config = form("pet").unwrap().unwrap();
        let json = config.to_json_pretty().unwrap();
        assert_eq!(FormConfiguration::from_json(&json).unwrap(), config);
    }
}
