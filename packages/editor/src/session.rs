//! # Edit Session
//!
//! The single entry point for UI events. A session owns the document, the
//! history, the durable store and the access gate, plus the runtime flags
//! that used to be page globals: edit mode, the restoring guard, the
//! typing debounce and the initial settle timer.
//!
//! ## Flow
//!
//! ```text
//! mutation ──► reconcile ──► commit ──► history push ──► persist
//!                                                   └──► availability event
//! undo/redo ──► cursor move ──► restore ──► reconcile ──► persist
//! ```
//!
//! Runtime operations never fail from the caller's point of view. Invalid
//! requests are logged and reported as [`Outcome::Ignored`]; persistence
//! failures surface as [`SessionEvent::PersistFailed`].
//!
//! Time is injected as a monotonic [`Duration`]; drivers call
//! [`EditSession::tick`] at [`EditSession::next_deadline`].

use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::EditorConfig;
use crate::debounce::Debounce;
use crate::document::{Control, Document, NodeKey};
use crate::gate::AccessGate;
use crate::history::{Availability, History};
use crate::keymap::{KeyChord, Shortcut};
use crate::mutations::{Mutation, MutationError, MutationResult};
use crate::normalize::normalize_legacy;
use crate::reconciler::{ReconcileContext, ReconcileReport, Reconciler};
use crate::rules::RuleSet;
use crate::snapshot::Snapshot;
use crate::store::{DurableStore, MemoryStore};
use crate::EditorError;

/// What a session operation did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    /// A new state was pushed to history and persisted
    Committed,
    /// The document changed; the commit waits for the debounce
    Deferred,
    /// Nothing new to record
    Unchanged,
    /// The request did not apply
    Ignored,
}

/// Notifications for the UI, drained with [`EditSession::drain_events`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    AvailabilityChanged(Availability),

    EditModeChanged {
        #[serde(rename = "editMode")]
        edit_mode: bool,
    },

    Persisted { bytes: usize },

    PersistFailed { reason: String },

    StoredStateDiscarded { reason: String },
}

/// Synchronous text prompt used by add controls
pub trait Prompt {
    /// `None` means the user cancelled
    fn ask(&mut self, message: &str) -> Option<String>;
}

impl<F> Prompt for F
where
    F: FnMut(&str) -> Option<String>,
{
    fn ask(&mut self, message: &str) -> Option<String> {
        self(message)
    }
}

/// Prompt with a prepared answer, handed out once
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answer(pub Option<String>);

impl Answer {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Some(value.into()))
    }

    pub fn cancel() -> Self {
        Self(None)
    }
}

impl Prompt for Answer {
    fn ask(&mut self, _message: &str) -> Option<String> {
        self.0.take()
    }
}

pub struct EditSession<S: DurableStore = MemoryStore> {
    config: EditorConfig,
    rules: RuleSet,
    reconciler: Reconciler,
    document: Document,
    history: History,
    store: S,
    gate: Box<dyn AccessGate>,
    edit_mode: bool,
    restoring: bool,
    debounce: Debounce,
    settle_at: Option<Duration>,
    last_report: ReconcileReport,
    events: VecDeque<SessionEvent>,
}

impl<S: DurableStore> EditSession<S> {
    /// Open a session over `template`. Persisted state under the configured
    /// key replaces the template when it decodes; otherwise the template is
    /// kept and a [`SessionEvent::StoredStateDiscarded`] is queued.
    pub fn open(
        config: EditorConfig,
        template: Document,
        store: S,
        gate: impl AccessGate + 'static,
        now: Duration,
    ) -> Result<Self, EditorError> {
        config.validate()?;
        let rules = RuleSet::compile(&config.rules)?;

        let mut session = Self {
            history: History::new(config.max_history),
            debounce: Debounce::new(config.debounce()),
            settle_at: Some(now + config.settle()),
            rules,
            reconciler: Reconciler::new(),
            document: template,
            store,
            gate: Box::new(gate),
            edit_mode: false,
            restoring: false,
            last_report: ReconcileReport::default(),
            events: VecDeque::new(),
            config,
        };

        session.load_persisted();
        session.reconcile();
        Ok(session)
    }

    fn load_persisted(&mut self) {
        let key = self.config.storage_key.clone();
        let stored = match self.store.load(&key) {
            Ok(Some(stored)) => stored,
            Ok(None) => return,
            Err(err) => {
                warn!("[livedit.store] could not read {}: {}", key, err);
                self.events.push_back(SessionEvent::StoredStateDiscarded {
                    reason: err.to_string(),
                });
                return;
            }
        };

        match Snapshot::from_stored(stored).restore(&mut self.document) {
            Ok(()) => {
                let repaired = normalize_legacy(&mut self.document, &self.rules);
                info!(
                    repaired,
                    "[livedit.session] restored persisted state from {}", key
                );
            }
            Err(err) => {
                warn!("[livedit.session] discarding malformed state under {}: {}", key, err);
                self.events.push_back(SessionEvent::StoredStateDiscarded {
                    reason: err.to_string(),
                });
            }
        }
    }

    /// Re-derive affordances for the current mode and access
    pub fn reconcile(&mut self) -> ReconcileReport {
        let ctx = ReconcileContext {
            edit_mode: self.edit_mode,
            show_controls: self.edit_mode && self.gate.is_elevated(),
        };
        self.last_report = self.reconciler.reconcile(&mut self.document, &self.rules, ctx);
        self.last_report
    }

    /// The single history push entry point
    pub fn commit(&mut self) -> Outcome {
        if self.restoring {
            debug!("[livedit.history] push ignored during restore");
            return Outcome::Ignored;
        }
        self.debounce.cancel();

        let snapshot = match Snapshot::capture(&self.document) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("[livedit.history] capture failed: {}", err);
                return Outcome::Unchanged;
            }
        };

        if !self.history.push(snapshot.clone()) {
            return Outcome::Unchanged;
        }

        debug!(
            len = self.history.len(),
            cursor = ?self.history.cursor(),
            bytes = snapshot.len(),
            "[livedit.history] pushed snapshot"
        );
        self.persist(&snapshot);
        self.publish_availability();
        Outcome::Committed
    }

    /// Step back one state. Pending typing is committed first so it is
    /// what gets undone.
    #[instrument(level = "debug", skip(self), fields(cursor = ?self.history.cursor()))]
    pub fn undo(&mut self) -> bool {
        self.flush_pending();
        self.step(true)
    }

    #[instrument(level = "debug", skip(self), fields(cursor = ?self.history.cursor()))]
    pub fn redo(&mut self) -> bool {
        self.flush_pending();
        self.step(false)
    }

    fn step(&mut self, back: bool) -> bool {
        if self.restoring {
            return false;
        }
        self.restoring = true;

        let target = if back {
            self.history.step_back().cloned()
        } else {
            self.history.step_forward().cloned()
        };

        let restored = match target {
            None => false,
            Some(snapshot) => match snapshot.restore(&mut self.document) {
                Ok(()) => {
                    self.reconcile();
                    self.persist(&snapshot);
                    true
                }
                Err(err) => {
                    warn!("[livedit.history] restore failed: {}", err);
                    // put the cursor back where the document still is
                    if back {
                        self.history.step_forward();
                    } else {
                        self.history.step_back();
                    }
                    false
                }
            },
        };

        self.publish_availability();
        self.restoring = false;
        restored
    }

    fn flush_pending(&mut self) {
        if self.debounce.is_pending() {
            self.commit();
        }
    }

    fn persist(&mut self, snapshot: &Snapshot) {
        match self.store.save(&self.config.storage_key, snapshot.as_str()) {
            Ok(()) => {
                self.events.push_back(SessionEvent::Persisted {
                    bytes: snapshot.len(),
                });
            }
            Err(err) => {
                warn!("[livedit.store] persist failed: {}", err);
                self.events.push_back(SessionEvent::PersistFailed {
                    reason: err.to_string(),
                });
            }
        }
    }

    fn publish_availability(&mut self) {
        self.events
            .push_back(SessionEvent::AvailabilityChanged(self.history.availability()));
    }

    pub fn toggle_edit_mode(&mut self) -> bool {
        self.set_edit_mode(!self.edit_mode)
    }

    /// Enter or leave edit mode; returns the resulting mode. Entering needs
    /// an elevated gate. Leaving commits pending typing and persists.
    pub fn set_edit_mode(&mut self, on: bool) -> bool {
        if on == self.edit_mode {
            return self.edit_mode;
        }

        if on && !self.gate.is_elevated() {
            info!("[livedit.session] edit mode requires elevated access");
            return false;
        }

        if !on {
            self.flush_pending();
            match Snapshot::capture(&self.document) {
                Ok(snapshot) => self.persist(&snapshot),
                Err(err) => warn!("[livedit.store] capture failed: {}", err),
            }
        }

        self.edit_mode = on;
        self.reconcile();
        info!(edit_mode = on, "[livedit.session] edit mode changed");
        self.events
            .push_back(SessionEvent::EditModeChanged { edit_mode: on });
        self.edit_mode
    }

    /// Re-check the gate, leaving edit mode if elevation was revoked
    pub fn refresh_access(&mut self) -> bool {
        if self.edit_mode && !self.gate.is_elevated() {
            self.set_edit_mode(false);
        } else {
            self.reconcile();
        }
        self.edit_mode
    }

    /// Apply a mutation, reconcile and commit. Text edits are deferred to
    /// the debounce instead of committed.
    pub fn apply(&mut self, mutation: Mutation, now: Duration) -> Result<MutationResult, MutationError> {
        let result = mutation.apply(&mut self.document, &self.rules)?;
        debug!(mutation = mutation.name(), created = ?result.created, "[livedit.session] applied");

        if mutation.is_structural() {
            self.reconcile();
            self.commit();
        } else {
            self.debounce.arm(now);
        }
        Ok(result)
    }

    fn apply_logged(&mut self, mutation: Mutation, now: Duration) -> Option<MutationResult> {
        let name = mutation.name();
        match self.apply(mutation, now) {
            Ok(result) => Some(result),
            Err(err) => {
                warn!("[livedit.session] {} rejected: {}", name, err);
                None
            }
        }
    }

    /// Clone the first `item_selector` row in `#container_id` as a blank row
    pub fn add_item(&mut self, container_id: &str, item_selector: &str) -> Outcome {
        let mutation = Mutation::AddItem {
            container_id: container_id.to_string(),
            item_selector: item_selector.to_string(),
        };
        match self.apply_logged(mutation, Duration::ZERO) {
            Some(_) => Outcome::Committed,
            None => Outcome::Ignored,
        }
    }

    pub fn delete_item(&mut self, key: NodeKey) -> Outcome {
        match self.apply_logged(Mutation::DeleteItem { node: key }, Duration::ZERO) {
            Some(_) => Outcome::Committed,
            None => Outcome::Ignored,
        }
    }

    /// Ask for a value and insert it as a sub-item of `container`. A
    /// cancelled or empty answer changes nothing.
    pub fn add_sub_item(&mut self, container: NodeKey, prompt: &mut dyn Prompt) -> Outcome {
        let rule = self
            .rules
            .add_controls
            .iter()
            .position(|rule| self.document.select(&rule.container).contains(&container));
        match rule {
            Some(rule) => self.add_sub_item_for_rule(container, rule, prompt),
            None => {
                debug!("[livedit.session] {} has no add-control rule", container);
                Outcome::Ignored
            }
        }
    }

    fn add_sub_item_for_rule(&mut self, container: NodeKey, rule: usize, prompt: &mut dyn Prompt) -> Outcome {
        let Some(spec) = self.rules.add_controls.get(rule) else {
            return Outcome::Ignored;
        };
        let message = format!("Enter {}:", spec.prompt);

        let text = match prompt.ask(&message) {
            Some(text) if !text.is_empty() => text,
            _ => return Outcome::Ignored,
        };

        let mutation = Mutation::AddSubItem {
            container,
            rule,
            text,
        };
        match self.apply_logged(mutation, Duration::ZERO) {
            Some(_) => Outcome::Committed,
            None => Outcome::Ignored,
        }
    }

    /// Free-text edit of an editable element; commits after the debounce
    pub fn input_text(&mut self, key: NodeKey, text: &str, now: Duration) -> Outcome {
        if !self.edit_mode {
            return Outcome::Ignored;
        }
        let mutation = Mutation::SetText {
            node: key,
            text: text.to_string(),
        };
        match self.apply_logged(mutation, now) {
            Some(_) => Outcome::Deferred,
            None => Outcome::Ignored,
        }
    }

    /// Focus left an edited element: commit right away
    pub fn blur(&mut self) -> Outcome {
        if !self.edit_mode {
            return Outcome::Ignored;
        }
        self.commit()
    }

    /// Fire whichever timers are due
    pub fn tick(&mut self, now: Duration) -> Outcome {
        let mut outcome = Outcome::Unchanged;

        if self.settle_at.is_some_and(|at| now >= at) {
            self.settle_at = None;
            if self.commit() == Outcome::Committed {
                outcome = Outcome::Committed;
            }
        }

        if self.debounce.fire(now) && self.commit() == Outcome::Committed {
            outcome = Outcome::Committed;
        }

        outcome
    }

    /// Record the initial snapshot now instead of waiting for the settle timer
    pub fn settle(&mut self) -> Outcome {
        self.settle_at = None;
        self.commit()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        match (self.settle_at, self.debounce.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Returns true when the key was consumed and the default action
    /// should be prevented
    pub fn handle_key(&mut self, chord: &KeyChord) -> bool {
        if !self.edit_mode {
            return false;
        }
        match Shortcut::resolve(chord) {
            Some(Shortcut::Undo) => {
                self.undo();
                true
            }
            Some(Shortcut::Redo) => {
                self.redo();
                true
            }
            None => false,
        }
    }

    /// The control or row button a click on `key` lands on: the element
    /// itself or its nearest ancestor that is one, so icons inside a
    /// control act for it
    pub fn activation_target(&self, key: NodeKey) -> Option<NodeKey> {
        let mut current = key;
        loop {
            let element = self.document.get(current)?;
            let row_button = element
                .id
                .as_deref()
                .is_some_and(|id| self.rules.row_button(id).is_some());
            if element.is_control() || row_button {
                return Some(current);
            }
            current = self.document.parent_key(current)?;
        }
    }

    /// Click on an element: delete controls, add controls and row buttons
    /// act; anything hidden, stale or inert is ignored.
    pub fn activate(&mut self, key: NodeKey, prompt: &mut dyn Prompt) -> Outcome {
        if self.document.get(key).is_none() {
            debug!("[livedit.session] stale key {}", key);
            return Outcome::Ignored;
        }
        let Some(target) = self.activation_target(key) else {
            return Outcome::Ignored;
        };
        let Some(element) = self.document.get(target) else {
            return Outcome::Ignored;
        };
        if element.affordance.hidden {
            return Outcome::Ignored;
        }

        let control = element.control();
        let row_button = element
            .id
            .as_deref()
            .and_then(|id| self.rules.row_button(id))
            .map(|rule| (rule.container_id.clone(), rule.item_selector.as_str().to_string()));

        match control {
            Some(Control::Delete) => match self.document.parent_key(target) {
                Some(item) => self.delete_item(item),
                None => Outcome::Ignored,
            },
            Some(Control::AddSubItem { rule }) => match self.document.parent_key(target) {
                Some(container) => self.add_sub_item_for_rule(container, rule, prompt),
                None => Outcome::Ignored,
            },
            None => match row_button {
                Some((container_id, item_selector)) => self.add_item(&container_id, &item_selector),
                None => Outcome::Ignored,
            },
        }
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain(..).collect()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn availability(&self) -> Availability {
        self.history.availability()
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring
    }

    pub fn has_pending_edit(&self) -> bool {
        self.debounce.is_pending()
    }

    pub fn is_elevated(&self) -> bool {
        self.gate.is_elevated()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn last_report(&self) -> ReconcileReport {
        self.last_report
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Committed state as it sits in the durable store
    pub fn persisted_state(&self) -> Option<String> {
        self.store.load(&self.config.storage_key).ok().flatten()
    }
}
