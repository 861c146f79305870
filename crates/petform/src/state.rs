//! Per-field runtime state.
//!
//! The [`FieldStore`] exclusively owns the [`FieldState`] of every field of
//! one active configuration. All methods take `&self`; the store is meant to
//! be shared through an `Arc` between the host UI and a submission in
//! flight.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tracing::debug;

use crate::error::{FormError, Result, ValidationError};
use crate::events::{EventBus, FormEvent};
use crate::form::{FormConfiguration, FormPayload, FormValues, ValidationBehavior};
use crate::mask;
use crate::schema::{FieldDefinition, SelectOption};
use crate::validation::{ValidationEngine, ValidationResult};
use crate::visibility;

/// Runtime state of a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldState {
    pub field_id: String,
    /// Canonical, unmasked value.
    pub raw_value: String,
    /// Value as shown to the user.
    pub display_value: String,
    /// Current errors; empty until the field is touched.
    pub errors: Vec<ValidationError>,
    pub is_touched: bool,
    pub is_enabled: bool,
    pub is_visible: bool,
}

impl FieldState {
    fn initial(field: &FieldDefinition, visible: bool) -> Self {
        let formatted = mask::format_input(field, &field.default_value);
        Self {
            field_id: field.id.clone(),
            raw_value: formatted.raw,
            display_value: formatted.display,
            errors: Vec::new(),
            is_touched: false,
            is_enabled: field.enabled,
            is_visible: visible,
        }
    }

    /// Returns whether the field currently shows no errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// First error message, for hosts that show one line per field.
    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(|e| e.message.as_str())
    }
}

/// Everything a submission needs, captured under one lock.
#[derive(Debug, Clone)]
pub struct SubmissionSnapshot {
    /// Configuration instance the snapshot belongs to.
    pub generation: u64,
    /// Configuration the payload was captured from.
    pub config: Arc<FormConfiguration>,
    /// Result of validating all visible fields.
    pub result: ValidationResult,
    /// Raw values of visible input fields.
    pub payload: FormPayload,
}

struct StoreInner {
    config: Arc<FormConfiguration>,
    engine: ValidationEngine,
    generation: u64,
    states: HashMap<String, FieldState>,
    watchers: HashMap<String, watch::Sender<FieldState>>,
}

impl StoreInner {
    fn load(config: Arc<FormConfiguration>, mut engine: ValidationEngine, generation: u64) -> Self {
        engine.prepare(&config);
        let values = config.default_values();
        let visible = visibility::resolve(&config, &values);
        let states = config
            .input_fields()
            .map(|field| {
                let shown = visible.get(&field.id).copied().unwrap_or(true);
                (field.id.clone(), FieldState::initial(field, shown))
            })
            .collect();
        Self {
            config,
            engine,
            generation,
            states,
            watchers: HashMap::new(),
        }
    }

    fn values(&self) -> FormValues {
        self.states
            .iter()
            .map(|(id, state)| (id.clone(), state.raw_value.clone()))
            .collect()
    }

    fn visible_payload(&self) -> FormPayload {
        self.config
            .input_fields()
            .filter_map(|field| self.states.get(&field.id))
            .filter(|state| state.is_visible)
            .map(|state| (state.field_id.clone(), state.raw_value.clone()))
            .collect()
    }

    /// Returns the configuration if `field_id` names an input field.
    fn config_for_input(&self, field_id: &str) -> Result<Arc<FormConfiguration>> {
        match self.config.field(field_id) {
            None => Err(FormError::UnknownField(field_id.to_string())),
            Some(field) if field.is_action() => Err(FormError::NotAnInput(field_id.to_string())),
            Some(_) => Ok(Arc::clone(&self.config)),
        }
    }

    /// Recomputes visibility, returning the ids that flipped.
    fn refresh_visibility(&mut self, events: &EventBus<FormEvent>) -> Vec<String> {
        let visible = visibility::resolve(&self.config, &self.values());
        let mut flipped = Vec::new();
        for state in self.states.values_mut() {
            let now = visible.get(&state.field_id).copied().unwrap_or(true);
            if state.is_visible != now {
                state.is_visible = now;
                debug!(field = %state.field_id, visible = now, "visibility changed");
                events.publish(FormEvent::VisibilityChanged {
                    field_id: state.field_id.clone(),
                    visible: now,
                });
                flipped.push(state.field_id.clone());
            }
        }
        flipped
    }

    /// Re-runs validation for `ids`. Errors only surface on touched,
    /// visible fields.
    fn revalidate<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        let config = Arc::clone(&self.config);
        let values = self.values();
        for id in ids {
            let (Some(field), Some(state)) = (config.field(id), self.states.get_mut(id)) else {
                continue;
            };
            state.errors = if state.is_touched && state.is_visible {
                self.engine
                    .validate_field(field, &state.raw_value, &values)
                    .into_errors()
                    .into_vec()
            } else {
                Vec::new()
            };
        }
    }

    fn touch_visible(&mut self) {
        let ids: Vec<String> = self
            .states
            .values_mut()
            .filter(|state| state.is_visible)
            .map(|state| {
                state.is_touched = true;
                state.field_id.clone()
            })
            .collect();
        self.revalidate(ids.iter().map(String::as_str));
        self.notify(ids.iter().map(String::as_str));
    }

    fn notify<'a>(&self, ids: impl IntoIterator<Item = &'a str>) {
        for id in ids {
            if let (Some(sender), Some(state)) = (self.watchers.get(id), self.states.get(id)) {
                sender.send_replace(state.clone());
            }
        }
    }

    fn notify_all(&self) {
        for (id, sender) in &self.watchers {
            if let Some(state) = self.states.get(id) {
                sender.send_replace(state.clone());
            }
        }
    }
}

/// Owns the state of every field of the active configuration.
pub struct FieldStore {
    inner: RwLock<StoreInner>,
    events: EventBus<FormEvent>,
}

impl std::fmt::Debug for FieldStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.read();
        f.debug_struct("FieldStore")
            .field("form", &inner.config.id)
            .field("generation", &inner.generation)
            .field("fields", &inner.states.len())
            .finish_non_exhaustive()
    }
}

impl FieldStore {
    /// Loads a configuration with the default validation engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails its checks.
    pub fn new(config: FormConfiguration) -> Result<Self> {
        Self::with_engine(config, ValidationEngine::new())
    }

    /// Loads a configuration with a custom validation engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails its checks.
    pub fn with_engine(config: FormConfiguration, engine: ValidationEngine) -> Result<Self> {
        config.check()?;
        Ok(Self {
            inner: RwLock::new(StoreInner::load(Arc::new(config), engine, 0)),
            events: EventBus::default(),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The active configuration.
    pub fn config(&self) -> Arc<FormConfiguration> {
        Arc::clone(&self.read().config)
    }

    /// Counter bumped every time the configuration is reloaded.
    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    /// Sets a field's value from raw or masked input.
    ///
    /// The value is masked, visibility is recomputed for the whole form,
    /// then the field and every MATCHES_FIELD dependent are revalidated.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown fields and action fields.
    pub fn set_value(&self, field_id: &str, input: &str) -> Result<FieldState> {
        let mut inner = self.write();
        let config = inner.config_for_input(field_id)?;
        let Some(field) = config.field(field_id) else {
            return Err(FormError::UnknownField(field_id.to_string()));
        };

        let formatted = mask::format_input(field, input);
        let touch = config.validation_behavior == ValidationBehavior::OnChange;
        let Some(state) = inner.states.get_mut(field_id) else {
            return Err(FormError::UnknownField(field_id.to_string()));
        };
        let old_value = std::mem::replace(&mut state.raw_value, formatted.raw);
        state.display_value = formatted.display;
        if touch {
            state.is_touched = true;
        }
        let new_value = state.raw_value.clone();

        let flipped = inner.refresh_visibility(&self.events);

        let mut affected: Vec<&str> = vec![field_id];
        affected.extend(
            config
                .input_fields()
                .filter(|f| f.matches_against(field_id))
                .map(|f| f.id.as_str()),
        );
        affected.extend(flipped.iter().map(String::as_str));
        let mut seen = HashSet::new();
        affected.retain(|id| seen.insert(*id));

        inner.revalidate(affected.iter().copied());

        if old_value != new_value {
            debug!(field = field_id, old = %old_value, new = %new_value, "field changed");
            self.events.publish(FormEvent::FieldChanged {
                field_id: field_id.to_string(),
                old_value,
                new_value,
            });
        }
        inner.notify(affected.iter().copied());

        inner
            .states
            .get(field_id)
            .cloned()
            .ok_or_else(|| FormError::UnknownField(field_id.to_string()))
    }

    /// Marks a field touched without changing its value, surfacing errors.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown fields and action fields.
    pub fn touch(&self, field_id: &str) -> Result<FieldState> {
        let mut inner = self.write();
        inner.config_for_input(field_id)?;
        let Some(state) = inner.states.get_mut(field_id) else {
            return Err(FormError::UnknownField(field_id.to_string()));
        };
        let first_touch = !state.is_touched;
        state.is_touched = true;

        inner.revalidate([field_id]);
        if first_touch {
            self.events.publish(FormEvent::FieldTouched {
                field_id: field_id.to_string(),
            });
        }
        inner.notify([field_id]);

        inner
            .states
            .get(field_id)
            .cloned()
            .ok_or_else(|| FormError::UnknownField(field_id.to_string()))
    }

    /// Marks every visible field touched and revalidates them.
    pub fn touch_visible(&self) {
        self.write().touch_visible();
    }

    /// Enables or disables a field.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown fields and action fields.
    pub fn set_enabled(&self, field_id: &str, enabled: bool) -> Result<()> {
        let mut inner = self.write();
        inner.config_for_input(field_id)?;
        if let Some(state) = inner.states.get_mut(field_id) {
            state.is_enabled = enabled;
        }
        inner.notify([field_id]);
        Ok(())
    }

    /// Replaces the options of a choice field.
    ///
    /// Options may arrive after the field was first rendered; the current
    /// value is kept even if it is not among the new options.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown fields and action fields.
    pub fn set_options(&self, field_id: &str, options: Vec<SelectOption>) -> Result<()> {
        let mut inner = self.write();
        inner.config_for_input(field_id)?;
        let config = Arc::make_mut(&mut inner.config);
        if let Some(field) = config.fields.iter_mut().find(|f| f.id == field_id) {
            field.options.clone_from(&options);
        }
        debug!(field = field_id, count = options.len(), "options replaced");
        self.events.publish(FormEvent::OptionsChanged {
            field_id: field_id.to_string(),
            options,
        });
        Ok(())
    }

    /// Current options of a choice field.
    pub fn options(&self, field_id: &str) -> Vec<SelectOption> {
        self.read()
            .config
            .field(field_id)
            .map(|f| f.options.clone())
            .unwrap_or_default()
    }

    /// Returns a copy of a field's state.
    pub fn state(&self, field_id: &str) -> Option<FieldState> {
        self.read().states.get(field_id).cloned()
    }

    /// States of every input field in declaration order.
    pub fn states(&self) -> Vec<FieldState> {
        let inner = self.read();
        inner
            .config
            .input_fields()
            .filter_map(|f| inner.states.get(&f.id).cloned())
            .collect()
    }

    /// Raw values of every input field, visible or not.
    pub fn values(&self) -> FormValues {
        self.read().values()
    }

    /// Raw values of the visible input fields.
    pub fn visible_values(&self) -> FormPayload {
        self.read().visible_payload()
    }

    /// Validates the whole form against the current values.
    pub fn validate(&self) -> ValidationResult {
        let inner = self.read();
        inner.engine.validate_form(&inner.config, &inner.values())
    }

    /// Touches, validates and captures the payload in one step.
    pub fn begin_submission(&self) -> SubmissionSnapshot {
        let mut inner = self.write();
        inner.touch_visible();
        SubmissionSnapshot {
            generation: inner.generation,
            config: Arc::clone(&inner.config),
            result: inner.engine.validate_form(&inner.config, &inner.values()),
            payload: inner.visible_payload(),
        }
    }

    /// Resets every field to its default, optionally swapping in a new
    /// configuration.
    ///
    /// Bumps the generation so results of submissions started before the
    /// reset are discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if the new configuration fails its checks; the
    /// current state is left untouched in that case.
    pub fn reset_all(&self, new_config: Option<FormConfiguration>) -> Result<()> {
        if let Some(config) = &new_config {
            config.check()?;
        }

        let mut inner = self.write();
        let config = new_config.map_or_else(|| Arc::clone(&inner.config), Arc::new);
        let generation = inner.generation + 1;
        let watchers = std::mem::take(&mut inner.watchers);
        let engine = std::mem::take(&mut inner.engine);
        *inner = StoreInner::load(config, engine, generation);
        let kept: HashMap<_, _> = watchers
            .into_iter()
            .filter(|(id, _)| inner.states.contains_key(id))
            .collect();
        inner.watchers = kept;
        inner.notify_all();

        debug!(form = %inner.config.id, generation, "form reset");
        self.events.publish(FormEvent::Reset { generation });
        Ok(())
    }

    /// Observes one field's state.
    pub fn watch(&self, field_id: &str) -> Option<watch::Receiver<FieldState>> {
        let mut inner = self.write();
        let state = inner.states.get(field_id)?.clone();
        Some(
            inner
                .watchers
                .entry(field_id.to_string())
                .or_insert_with(|| watch::channel(state).0)
                .subscribe(),
        )
    }

    /// Subscribes to form-wide events.
    pub fn subscribe(&self) -> broadcast::Receiver<FormEvent> {
        self.events.subscribe()
    }

    /// Event channel shared with the submission orchestrator.
    pub fn events(&self) -> &EventBus<FormEvent> {
        &self.events
    }
}
