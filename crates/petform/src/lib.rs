//! # petform
//!
//! Schema-driven forms for pet-care applications.
//!
//! A form is described by a [`FormConfiguration`], usually loaded from JSON.
//! This crate provides:
//! - Field definitions with declarative validation rules
//! - Input masks for Brazilian documents, phones and postal codes
//! - Conditional visibility between fields
//! - A per-form [`FieldStore`] that keeps field state consistent
//! - A [`SubmissionOrchestrator`] that validates and dispatches payloads
//!
//! ## Quick Start
//!
//! ```rust
//! use petform::fields::{confirm_password_field, email_field, password_field, submit_button};
//! use petform::{FormConfiguration, FormSession, RuleKind};
//!
//! let config = FormConfiguration::builder("signup")
//!     .title("Create account")
//!     .field(email_field("email", "Email", true))
//!     .field(password_field("password", "Password", Some(8), false))
//!     .field(confirm_password_field("confirmPassword", "Confirm password", "password"))
//!     .field(submit_button("submit", "Sign up"))
//!     .build()?;
//!
//! let session = FormSession::new(config)?;
//! session.set_value("email", "a@b.com")?;
//! session.set_value("password", "abc12345")?;
//!
//! let confirm = session.set_value("confirmPassword", "abc123456")?;
//! assert_eq!(confirm.errors.len(), 1);
//! assert_eq!(confirm.errors[0].kind, RuleKind::MatchesField);
//!
//! let confirm = session.set_value("confirmPassword", "abc12345")?;
//! assert!(confirm.is_valid());
//! assert!(session.validate().is_valid());
//! # Ok::<(), petform::FormError>(())
//! ```
//!
//! ## Loading From JSON
//!
//! ```rust
//! use petform::{FieldType, FormConfiguration};
//!
//! let config = FormConfiguration::from_json(r#"{
//!     "id": "pet",
//!     "title": "Pet",
//!     "fields": [
//!         { "id": "name", "label": "Name", "type": "TEXT",
//!           "validators": [{ "kind": "REQUIRED" }] },
//!         { "id": "species", "label": "Species", "type": "SELECT",
//!           "options": [{ "key": "dog", "label": "Dog" }] }
//!     ]
//! }"#)?;
//!
//! assert_eq!(config.fields.len(), 2);
//! assert_eq!(config.fields[1].field_type, FieldType::Select);
//! # Ok::<(), petform::FormError>(())
//! ```
//!
//! ## Masks
//!
//! ```rust
//! use petform::{apply_mask, strip_mask};
//!
//! assert_eq!(apply_mask("52998224725", "###.###.###-##"), "529.982.247-25");
//! assert_eq!(strip_mask("529.982.247-25"), "52998224725");
//! ```

mod error;
mod events;
pub mod fields;
mod form;
pub mod mask;
mod schema;
mod session;
mod state;
mod submit;
pub mod validation;
pub mod visibility;

pub use error::{
    DispatchError, FormError, Result, SubmissionError, ValidationError, ValidationErrors,
};
pub use events::{EventBus, FormEvent, DEFAULT_CHANNEL_CAPACITY};
pub use form::{
    FormBuilder, FormConfiguration, FormPayload, FormValues, SubmitBehavior, ValidationBehavior,
};
pub use mask::{apply_mask, strip_mask};
pub use schema::{
    ComparisonOperator, FieldDefinition, FieldFormatting, FieldType, RuleKind, SelectOption,
    ValidationRule, VisibilityCondition, VisibilityRule,
};
pub use session::FormSession;
pub use state::{FieldState, FieldStore, SubmissionSnapshot};
pub use submit::{Dispatcher, SubmissionOrchestrator, SubmitStatus};
pub use validation::{validate_field, validate_form, ValidationEngine, ValidationResult};
pub use visibility::is_visible;
