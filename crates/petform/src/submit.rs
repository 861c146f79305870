//! Submission state machine.
//!
//! ```text
//! Idle -> Validating -> Invalid(errors)
//!                    -> Submitting -> Succeeded(payload)
//!                                  -> Failed(error)
//! ```

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::BoxFuture;
use tracing::{debug, info, warn};

use crate::error::{DispatchError, SubmissionError, ValidationErrors};
use crate::events::FormEvent;
use crate::form::{FormPayload, SubmitBehavior};
use crate::state::FieldStore;
use crate::validation::ValidationResult;

/// Where the submission state machine currently is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmitStatus {
    #[default]
    Idle,
    Validating,
    /// Validation failed; a new submission may start.
    Invalid(ValidationErrors),
    Submitting,
    Succeeded(FormPayload),
    Failed(SubmissionError),
}

impl SubmitStatus {
    /// Returns whether a submission is running.
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Validating | Self::Submitting)
    }

    /// Short name, for logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Invalid(_) => "invalid",
            Self::Submitting => "submitting",
            Self::Succeeded(_) => "succeeded",
            Self::Failed(_) => "failed",
        }
    }
}

/// Host operation that receives the payload of a valid submission.
///
/// Implemented for any `Fn(FormPayload) -> impl Future<Output = Result<(),
/// DispatchError>>`.
pub trait Dispatcher: Send + Sync {
    /// Sends the payload somewhere.
    fn dispatch(&self, payload: FormPayload) -> BoxFuture<'static, Result<(), DispatchError>>;
}

impl<F, Fut> Dispatcher for F
where
    F: Fn(FormPayload) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), DispatchError>> + Send + 'static,
{
    fn dispatch(&self, payload: FormPayload) -> BoxFuture<'static, Result<(), DispatchError>> {
        Box::pin(self(payload))
    }
}

/// Drives validation and dispatch for one form.
///
/// Only one submission runs at a time: a call to [`submit`](Self::submit)
/// while another is in flight returns [`SubmissionError::InProgress`]
/// without touching the store or the dispatcher. A submission whose future
/// is dropped before it resolves releases the form back to `Idle`.
pub struct SubmissionOrchestrator {
    tracker: Mutex<Tracker>,
    dispatcher: Option<Arc<dyn Dispatcher>>,
}

#[derive(Debug, Default)]
struct Tracker {
    status: SubmitStatus,
    /// Bumped by every submission that starts; only the latest may move
    /// the status.
    ticket: u64,
    /// Store generation the latest submission started from.
    generation: u64,
}

/// Releases a busy status when a submission future is dropped early.
struct InFlight<'a> {
    orchestrator: &'a SubmissionOrchestrator,
    store: &'a FieldStore,
    ticket: u64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.orchestrator.release(self.ticket) {
            warn!("submission dropped before it resolved");
            self.store
                .events()
                .publish(FormEvent::StatusChanged(SubmitStatus::Idle));
        }
    }
}

impl std::fmt::Debug for SubmissionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionOrchestrator")
            .field("status", &self.status())
            .field("dispatcher", &self.dispatcher.is_some())
            .finish()
    }
}

impl Default for SubmissionOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionOrchestrator {
    /// Creates an orchestrator without a dispatcher.
    ///
    /// Forms configured with `DISPATCH_EXTERNAL` fail with
    /// [`SubmissionError::MissingDispatcher`].
    pub fn new() -> Self {
        Self {
            tracker: Mutex::new(Tracker::default()),
            dispatcher: None,
        }
    }

    /// Creates an orchestrator that hands valid payloads to `dispatcher`.
    pub fn with_dispatcher(dispatcher: impl Dispatcher + 'static) -> Self {
        Self {
            tracker: Mutex::new(Tracker::default()),
            dispatcher: Some(Arc::new(dispatcher)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Tracker> {
        self.tracker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state.
    pub fn status(&self) -> SubmitStatus {
        self.lock().status.clone()
    }

    /// Returns to `Idle` after the configuration changed.
    ///
    /// A finished submission is cleared. A running one is released only when
    /// it started from an older store generation; its result is discarded
    /// when it resolves.
    pub fn settle(&self, store: &FieldStore) {
        let generation = store.generation();
        let mut tracker = self.lock();
        let stale = tracker.status.is_busy() && tracker.generation < generation;
        if stale || (!tracker.status.is_busy() && tracker.status != SubmitStatus::Idle) {
            if stale {
                debug!(generation, "releasing superseded submission");
            }
            tracker.status = SubmitStatus::Idle;
            drop(tracker);
            store.events().publish(FormEvent::StatusChanged(SubmitStatus::Idle));
        }
    }

    /// Moves a running submission to `next`.
    ///
    /// Ignored once the submission lost its ticket or was released.
    fn transition(&self, store: &FieldStore, ticket: u64, next: SubmitStatus) -> bool {
        {
            let mut tracker = self.lock();
            if tracker.ticket != ticket || !tracker.status.is_busy() {
                return false;
            }
            tracker.status = next.clone();
        }
        debug!(status = next.name(), "submission status");
        store.events().publish(FormEvent::StatusChanged(next));
        true
    }

    /// Puts a still-busy submission back to `Idle` without an event.
    fn release(&self, ticket: u64) -> bool {
        let mut tracker = self.lock();
        if tracker.ticket == ticket && tracker.status.is_busy() {
            tracker.status = SubmitStatus::Idle;
            true
        } else {
            false
        }
    }

    fn supersede(&self, form: &str, ticket: u64) -> SubmissionError {
        warn!(form, "discarding result of a superseded submission");
        self.release(ticket);
        SubmissionError::Superseded
    }

    /// Validates the form and, when valid, resolves or dispatches the
    /// payload of visible fields.
    ///
    /// Dropping the returned future before it resolves puts the status back
    /// to `Idle`.
    ///
    /// # Errors
    ///
    /// - [`SubmissionError::InProgress`] if another submission is running
    /// - [`SubmissionError::Invalid`] if any visible field fails validation
    /// - [`SubmissionError::MissingDispatcher`] or
    ///   [`SubmissionError::Dispatch`] if dispatch could not complete
    /// - [`SubmissionError::Superseded`] if the configuration was replaced
    ///   before the submission resolved
    pub async fn submit(&self, store: &FieldStore) -> Result<FormPayload, SubmissionError> {
        let generation = store.generation();
        let ticket = {
            let mut tracker = self.lock();
            if tracker.status.is_busy() {
                debug!("submission already in progress, ignoring");
                return Err(SubmissionError::InProgress);
            }
            tracker.ticket += 1;
            tracker.generation = generation;
            tracker.status = SubmitStatus::Validating;
            tracker.ticket
        };
        let _guard = InFlight {
            orchestrator: self,
            store,
            ticket,
        };
        store
            .events()
            .publish(FormEvent::StatusChanged(SubmitStatus::Validating));

        let snapshot = store.begin_submission();
        let config = Arc::clone(&snapshot.config);
        if snapshot.generation != generation {
            return Err(self.supersede(&config.id, ticket));
        }

        if let ValidationResult::Invalid(errors) = snapshot.result {
            info!(form = %config.id, errors = errors.len(), "submission rejected by validation");
            self.transition(store, ticket, SubmitStatus::Invalid(errors.clone()));
            store.events().publish(FormEvent::FormSubmitted {
                values: snapshot.payload,
                is_valid: false,
            });
            return Err(SubmissionError::Invalid(errors));
        }

        let outcome = match config.submit_behavior {
            SubmitBehavior::LocalOnly => {
                self.transition(store, ticket, SubmitStatus::Submitting);
                Ok(())
            }
            SubmitBehavior::DispatchExternal => {
                let Some(dispatcher) = self.dispatcher.clone() else {
                    let error = SubmissionError::MissingDispatcher(config.id.clone());
                    return Err(self.fail(store, ticket, error));
                };
                self.transition(store, ticket, SubmitStatus::Submitting);
                info!(form = %config.id, fields = snapshot.payload.len(), "dispatching submission");
                dispatcher.dispatch(snapshot.payload.clone()).await
            }
        };

        if store.generation() != snapshot.generation {
            return Err(self.supersede(&config.id, ticket));
        }

        match outcome {
            Ok(()) => {
                info!(form = %config.id, "submission succeeded");
                let succeeded = SubmitStatus::Succeeded(snapshot.payload.clone());
                if self.transition(store, ticket, succeeded) {
                    store.events().publish(FormEvent::FormSubmitted {
                        values: snapshot.payload.clone(),
                        is_valid: true,
                    });
                }
                Ok(snapshot.payload)
            }
            Err(error) => Err(self.fail(store, ticket, SubmissionError::Dispatch(error))),
        }
    }

    fn fail(&self, store: &FieldStore, ticket: u64, error: SubmissionError) -> SubmissionError {
        warn!(%error, "submission failed");
        if self.transition(store, ticket, SubmitStatus::Failed(error.clone())) {
            store.events().publish(FormEvent::SubmitFailed {
                error: error.clone(),
            });
        }
        error
    }
}
