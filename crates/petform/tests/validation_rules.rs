//! Tests for rule evaluation through the public API.

mod common;
use common::*;

use petform::validation::checksum::is_valid_cpf;
use petform::{
    validate_field, validate_form, FieldDefinition, FieldType, RuleKind, ValidationEngine,
    ValidationResult, ValidationRule,
};

#[test]
fn login_confirmation_mismatch() {
    let config = login_form();
    let result = validate_form(
        &config,
        &values(&[
            ("email", "a@b.com"),
            ("password", "abc12345"),
            ("confirmPassword", "abc123456"),
        ]),
    );

    let errors = result.errors().expect("mismatch should be reported");
    assert_eq!(errors.len(), 1);
    let error = errors.iter().next().unwrap();
    assert_eq!(error.field_id, "confirmPassword");
    assert_eq!(error.kind, RuleKind::MatchesField);
}

#[test]
fn login_confirmation_match() {
    let config = login_form();
    let result = validate_form(
        &config,
        &values(&[
            ("email", "a@b.com"),
            ("password", "abc12345"),
            ("confirmPassword", "abc12345"),
        ]),
    );
    assert_eq!(result, ValidationResult::Valid);
}

#[test]
fn required_rejects_blank_values() {
    let field = FieldDefinition::new("name", "Name", FieldType::Text).required();
    for blank in ["", "   ", "\t\n"] {
        let result = validate_field(&field, blank, &values(&[]));
        let errors = result.errors().unwrap();
        assert_eq!(errors.of_kind(RuleKind::Required).count(), 1, "{blank:?}");
    }
    assert!(validate_field(&field, "Rex", &values(&[])).is_valid());
}

#[test]
fn every_failing_rule_is_reported() {
    let field = FieldDefinition::new("code", "Code", FieldType::Text)
        .validator(ValidationRule::min_length(5))
        .validator(ValidationRule::numeric())
        .validator(ValidationRule::pattern("[0-9]+"));
    let result = validate_field(&field, "ab", &values(&[]));
    let kinds: Vec<_> = result.errors().unwrap().iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![RuleKind::MinLength, RuleKind::Numeric, RuleKind::Pattern]
    );
}

#[test]
fn error_ids_are_stable() {
    let field = FieldDefinition::new("email", "Email", FieldType::Email)
        .required()
        .validator(ValidationRule::email());
    let first = validate_field(&field, "nope", &values(&[]));
    let second = validate_field(&field, "nope", &values(&[]));
    assert_eq!(first, second);
    assert_eq!(
        first.errors().unwrap().iter().next().unwrap().id,
        "email.1.email"
    );
}

#[test]
fn cpf_checksum_properties() {
    assert!(is_valid_cpf(VALID_CPF));
    assert!(is_valid_cpf("529.982.247-25"));

    // Changing any single digit breaks the checksum.
    for position in 0..VALID_CPF.len() {
        let mut digits: Vec<char> = VALID_CPF.chars().collect();
        let current = digits[position].to_digit(10).unwrap();
        digits[position] = char::from_digit((current + 1) % 10, 10).unwrap();
        let mutated: String = digits.into_iter().collect();
        assert!(!is_valid_cpf(&mutated), "{mutated} should be rejected");
    }

    for repeated in (0..10).map(|d| d.to_string().repeat(11)) {
        assert!(!is_valid_cpf(&repeated), "{repeated} should be rejected");
    }
    assert!(!is_valid_cpf("5299822472"));
}

#[test]
fn custom_rule_uses_registered_predicate() {
    let field = FieldDefinition::new("age", "Age", FieldType::Number)
        .validator(ValidationRule::custom("adult").with_message("Must be 18 or older"));
    let engine = ValidationEngine::new().with_custom("adult", |value, _| {
        value.parse::<u32>().is_ok_and(|age| age >= 18)
    });

    assert!(engine.validate_field(&field, "30", &values(&[])).is_valid());
    let result = engine.validate_field(&field, "12", &values(&[]));
    assert_eq!(
        result.errors().unwrap().iter().next().unwrap().message,
        "Must be 18 or older"
    );
}

#[test]
fn unregistered_custom_rule_fails() {
    let field = FieldDefinition::new("age", "Age", FieldType::Number)
        .validator(ValidationRule::custom("adult"));
    assert!(!validate_field(&field, "30", &values(&[])).is_valid());
}
