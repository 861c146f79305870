//! A field store and a submission orchestrator bound together.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use crate::error::{Result, SubmissionError};
use crate::events::FormEvent;
use crate::form::{FormConfiguration, FormPayload};
use crate::schema::SelectOption;
use crate::state::{FieldState, FieldStore};
use crate::submit::{Dispatcher, SubmissionOrchestrator, SubmitStatus};
use crate::validation::{ValidationEngine, ValidationResult};

/// One live form: its field states and its submission state machine.
///
/// Cheap to clone; clones share the same form.
#[derive(Debug, Clone)]
pub struct FormSession {
    store: Arc<FieldStore>,
    orchestrator: Arc<SubmissionOrchestrator>,
}

impl FormSession {
    /// Opens a session that resolves submissions locally.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails its checks.
    pub fn new(config: FormConfiguration) -> Result<Self> {
        Ok(Self::from_parts(
            FieldStore::new(config)?,
            SubmissionOrchestrator::new(),
        ))
    }

    /// Opens a session whose valid submissions go to `dispatcher` when the
    /// form is configured with `DISPATCH_EXTERNAL`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails its checks.
    pub fn with_dispatcher(
        config: FormConfiguration,
        dispatcher: impl Dispatcher + 'static,
    ) -> Result<Self> {
        Ok(Self::from_parts(
            FieldStore::new(config)?,
            SubmissionOrchestrator::with_dispatcher(dispatcher),
        ))
    }

    /// Opens a session with a custom validation engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails its checks.
    pub fn with_engine(
        config: FormConfiguration,
        engine: ValidationEngine,
        orchestrator: SubmissionOrchestrator,
    ) -> Result<Self> {
        Ok(Self::from_parts(
            FieldStore::with_engine(config, engine)?,
            orchestrator,
        ))
    }

    /// Binds an existing store and orchestrator.
    pub fn from_parts(store: FieldStore, orchestrator: SubmissionOrchestrator) -> Self {
        Self {
            store: Arc::new(store),
            orchestrator: Arc::new(orchestrator),
        }
    }

    pub fn store(&self) -> &FieldStore {
        &self.store
    }

    pub fn config(&self) -> Arc<FormConfiguration> {
        self.store.config()
    }

    /// See [`FieldStore::set_value`].
    ///
    /// # Errors
    ///
    /// Returns an error for unknown fields and action fields.
    pub fn set_value(&self, field_id: &str, input: &str) -> Result<FieldState> {
        self.store.set_value(field_id, input)
    }

    /// See [`FieldStore::touch`].
    ///
    /// # Errors
    ///
    /// Returns an error for unknown fields and action fields.
    pub fn touch(&self, field_id: &str) -> Result<FieldState> {
        self.store.touch(field_id)
    }

    /// See [`FieldStore::set_options`].
    ///
    /// # Errors
    ///
    /// Returns an error for unknown fields and action fields.
    pub fn set_options(&self, field_id: &str, options: Vec<SelectOption>) -> Result<()> {
        self.store.set_options(field_id, options)
    }

    pub fn state(&self, field_id: &str) -> Option<FieldState> {
        self.store.state(field_id)
    }

    pub fn validate(&self) -> ValidationResult {
        self.store.validate()
    }

    pub fn status(&self) -> SubmitStatus {
        self.orchestrator.status()
    }

    /// Submits the form. See [`SubmissionOrchestrator::submit`].
    ///
    /// # Errors
    ///
    /// See [`SubmissionOrchestrator::submit`].
    pub async fn submit(&self) -> std::result::Result<FormPayload, SubmissionError> {
        self.orchestrator.submit(&self.store).await
    }

    /// Swaps in a new configuration, or reloads the current one when
    /// `config` is `None`.
    ///
    /// A submission still in flight for the previous configuration has its
    /// result discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if the new configuration fails its checks.
    pub fn replace_configuration(&self, config: Option<FormConfiguration>) -> Result<()> {
        self.store.reset_all(config)?;
        self.orchestrator.settle(&self.store);
        Ok(())
    }

    pub fn watch(&self, field_id: &str) -> Option<watch::Receiver<FieldState>> {
        self.store.watch(field_id)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FormEvent> {
        self.store.subscribe()
    }
}
