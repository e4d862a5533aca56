use livedit_editor::{
    Answer, Control, Document, DurableStore, EditSession, EditorConfig, EditorError, KeyChord,
    MemoryStore, NodeKey, Outcome, SharedGate,
};
use serde::Serialize;
use std::time::Duration;
use wasm_bindgen::prelude::*;

/// Browser storage gives roughly this much per origin
const STORAGE_QUOTA: usize = 5 * 1024 * 1024;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Status {
    edit_mode: bool,
    elevated: bool,
    can_undo: bool,
    can_redo: bool,
    pending: bool,
    history_length: usize,
    cursor: Option<usize>,
}

/// Editing session driven by page events. The page owns the timers and
/// localStorage: it passes `performance.now()` in, schedules `tick` at
/// `nextDeadline`, and writes `persistedState` back after each call.
#[wasm_bindgen]
pub struct LiveEditor {
    session: EditSession<MemoryStore>,
    gate: SharedGate,
}

impl LiveEditor {
    fn open(
        template_json: &str,
        config_json: Option<String>,
        stored_state: Option<String>,
        elevated: bool,
        now_ms: f64,
    ) -> Result<LiveEditor, EditorError> {
        let config = match config_json {
            Some(json) => EditorConfig::from_json(&json)?,
            None => EditorConfig::default(),
        };

        let mut store = MemoryStore::with_quota(STORAGE_QUOTA);
        if let Some(state) = stored_state {
            store.save(&config.storage_key, &state)?;
        }

        let gate = SharedGate::new(elevated);
        let template = Document::from_json(template_json)?;
        let session = EditSession::open(config, template, store, gate.clone(), duration(now_ms))?;
        Ok(LiveEditor { session, gate })
    }
}

#[wasm_bindgen]
impl LiveEditor {
    #[wasm_bindgen(constructor)]
    pub fn new(
        template_json: &str,
        config_json: Option<String>,
        stored_state: Option<String>,
        elevated: bool,
        now_ms: f64,
    ) -> Result<LiveEditor, JsValue> {
        Self::open(template_json, config_json, stored_state, elevated, now_ms)
            .map_err(|e| JsValue::from_str(&format!("Open error: {}", e)))
    }

    /// Grant or revoke elevation; returns the resulting edit mode
    #[wasm_bindgen(js_name = setElevated)]
    pub fn set_elevated(&mut self, elevated: bool) -> bool {
        if elevated {
            self.gate.grant();
        } else {
            self.gate.revoke();
        }
        self.session.refresh_access()
    }

    #[wasm_bindgen(js_name = toggleEditMode)]
    pub fn toggle_edit_mode(&mut self) -> bool {
        self.session.toggle_edit_mode()
    }

    pub fn undo(&mut self) -> bool {
        self.session.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.session.redo()
    }

    /// Returns true when the page should call `preventDefault`
    #[wasm_bindgen(js_name = handleKey)]
    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> bool {
        let chord = KeyChord {
            key: key.to_string(),
            ctrl,
            shift,
            alt,
            meta,
        };
        self.session.handle_key(&chord)
    }

    /// Message to show before activating `node`, if it asks for a value
    #[wasm_bindgen(js_name = promptFor)]
    pub fn prompt_for(&self, node: u32) -> Option<String> {
        let target = self.session.activation_target(node_key(node))?;
        let element = self.session.document().get(target)?;
        match element.control()? {
            Control::AddSubItem { rule } => self
                .session
                .rules()
                .add_controls
                .get(rule)
                .map(|rule| format!("Enter {}:", rule.prompt)),
            Control::Delete => None,
        }
    }

    /// Click on `node`; `answer` is the prompt result, if one was asked
    pub fn activate(&mut self, node: u32, answer: Option<String>) -> String {
        outcome_name(self.session.activate(node_key(node), &mut Answer(answer)))
    }

    #[wasm_bindgen(js_name = addItem)]
    pub fn add_item(&mut self, container_id: &str, item_selector: &str) -> String {
        outcome_name(self.session.add_item(container_id, item_selector))
    }

    pub fn input(&mut self, node: u32, text: &str, now_ms: f64) -> String {
        outcome_name(self.session.input_text(node_key(node), text, duration(now_ms)))
    }

    pub fn blur(&mut self) -> String {
        outcome_name(self.session.blur())
    }

    pub fn tick(&mut self, now_ms: f64) -> String {
        outcome_name(self.session.tick(duration(now_ms)))
    }

    /// Milliseconds on the `now_ms` clock, or undefined when idle
    #[wasm_bindgen(js_name = nextDeadline)]
    pub fn next_deadline(&self) -> Option<f64> {
        self.session
            .next_deadline()
            .map(|deadline| deadline.as_secs_f64() * 1000.0)
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.session.availability().can_undo
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.session.availability().can_redo
    }

    #[wasm_bindgen(js_name = editMode)]
    pub fn edit_mode(&self) -> bool {
        self.session.edit_mode()
    }

    /// Current tree with keys and derived affordances, for rendering
    #[wasm_bindgen(js_name = documentJson)]
    pub fn document_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.document().view())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Committed state to write to localStorage
    #[wasm_bindgen(js_name = persistedState)]
    pub fn persisted_state(&self) -> Option<String> {
        self.session.persisted_state()
    }

    /// Queued session events as a JSON array
    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.drain_events())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    pub fn status(&self) -> Result<String, JsValue> {
        let status = Status {
            edit_mode: self.session.edit_mode(),
            elevated: self.session.is_elevated(),
            can_undo: self.session.availability().can_undo,
            can_redo: self.session.availability().can_redo,
            pending: self.session.has_pending_edit(),
            history_length: self.session.history().len(),
            cursor: self.session.history().cursor(),
        };
        serde_json::to_string(&status)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}

fn node_key(node: u32) -> NodeKey {
    NodeKey::new(u64::from(node))
}

fn duration(ms: f64) -> Duration {
    if ms.is_finite() && ms > 0.0 {
        Duration::try_from_secs_f64(ms / 1000.0).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

fn outcome_name(outcome: Outcome) -> String {
    match outcome {
        Outcome::Committed => "committed",
        Outcome::Deferred => "deferred",
        Outcome::Unchanged => "unchanged",
        Outcome::Ignored => "ignored",
    }
    .to_string()
}
