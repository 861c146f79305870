//! Form events and a typed publish/subscribe channel.
//!
//! Uses [`tokio::sync::broadcast`] for fan-out delivery. Delivery is best
//! effort: publishing with no subscriber is not an error.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

use crate::error::SubmissionError;
use crate::form::FormPayload;
use crate::schema::SelectOption;
use crate::submit::SubmitStatus;

/// Default capacity for event channels.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Notification emitted by a form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    /// A field's raw value changed.
    FieldChanged {
        field_id: String,
        old_value: String,
        new_value: String,
    },
    /// A field was marked touched.
    FieldTouched { field_id: String },
    /// A field appeared or disappeared.
    VisibilityChanged { field_id: String, visible: bool },
    /// Options of a choice field were replaced by the host.
    OptionsChanged {
        field_id: String,
        options: Vec<SelectOption>,
    },
    /// The configuration was loaded again or replaced.
    Reset { generation: u64 },
    /// The submission state machine moved.
    StatusChanged(SubmitStatus),
    /// A submission finished validation.
    ///
    /// `values` is the payload of visible fields.
    FormSubmitted { values: FormPayload, is_valid: bool },
    /// Dispatch failed or could not start.
    SubmitFailed { error: SubmissionError },
}

/// Typed broadcast channel.
///
/// Delivers every published message to all active subscribers. Messages
/// published while nobody listens are dropped.
///
/// # Examples
///
/// ```
/// use petform::EventBus;
///
/// let bus = EventBus::new(16);
/// let mut sub = bus.subscribe();
///
/// bus.publish("pets-changed");
///
/// assert_eq!(sub.try_recv().unwrap(), "pets-changed");
/// assert_eq!(bus.total_published(), 1);
/// ```
#[derive(Debug)]
pub struct EventBus<T> {
    sender: broadcast::Sender<T>,
    published: AtomicU64,
}

impl<T: Clone> EventBus<T> {
    /// Creates a bus with the given channel capacity.
    ///
    /// When the channel is full the oldest messages are dropped and lagging
    /// subscribers see `RecvError::Lagged`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            published: AtomicU64::new(0),
        }
    }

    /// Publishes a message, returning how many subscribers received it.
    pub fn publish(&self, message: T) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        self.sender.send(message).unwrap_or(0)
    }

    /// Subscribes to messages published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Total messages published since creation.
    #[must_use]
    pub fn total_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

impl<T: Clone> Default for EventBus<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}
