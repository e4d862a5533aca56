//! # Livedit Editor
//!
//! Edit-history and reconciliation engine for live content editing.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ session: single entry point for UI events   │
//! │  - edit mode, access gate, timers           │
//! │  - commit → history push → durable store    │
//! └─────────────────────────────────────────────┘
//!           ↓ mutations           ↓ undo / redo
//! ┌──────────────────────┐ ┌────────────────────┐
//! │ mutations: add,      │ │ history: bounded   │
//! │ delete, sub-item,    │ │ snapshots + cursor │
//! │ set text             │ │                    │
//! └──────────────────────┘ └────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ reconciler: controls, visibility and        │
//! │ editability derived from affordance rules   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ document: element tree with node keys       │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Content is the source of truth**: controls and flags are derived
//! 2. **Snapshots are whole states**: undo restores, it never inverts
//! 3. **Reconcile after every write**: restores and mutations alike
//! 4. **Injected time**: no clocks inside the engine
//!
//! ## Usage
//!
//! ```rust,ignore
//! use livedit_editor::{Document, EditSession, EditorConfig, MemoryStore, StaticGate};
//!
//! let template = Document::from_json(include_str!("resume.json"))?;
//! let mut session = EditSession::open(
//!     EditorConfig::default(),
//!     template,
//!     MemoryStore::new(),
//!     StaticGate(true),
//!     now,
//! )?;
//!
//! session.settle();
//! session.toggle_edit_mode();
//! session.add_item("skills-container", ".skill-card");
//! session.undo();
//! ```

mod config;
mod debounce;
mod document;
mod errors;
mod gate;
mod history;
mod keymap;
mod mutations;
mod normalize;
mod reconciler;
mod rules;
mod selector;
mod session;
mod snapshot;
mod store;

pub use config::EditorConfig;
pub use debounce::{Debounce, DEFAULT_DEBOUNCE};
pub use document::{Affordance, Control, Document, Element, NodeKey, NodeView};
pub use errors::EditorError;
pub use gate::{AccessGate, SharedGate, StaticGate};
pub use history::{Availability, History, DEFAULT_MAX_HISTORY};
pub use keymap::{KeyChord, KeyChordError, Shortcut};
pub use mutations::{Mutation, MutationError, MutationResult};
pub use normalize::normalize_legacy;
pub use reconciler::{
    AddControls, AffordancePass, DeleteControls, EditOnlyVisibility, Editability, ReconcileContext,
    ReconcileReport, Reconciler,
};
pub use rules::{
    AddControlRule, AffordanceRules, CompiledAddControl, CompiledNormalize, CompiledRowButton,
    NormalizeRule, RowButtonRule, RuleSet,
};
pub use selector::{SelectorError, SelectorList};
pub use session::{Answer, EditSession, Outcome, Prompt, SessionEvent};
pub use snapshot::Snapshot;
pub use store::{DurableStore, FileStore, MemoryStore, StoreError};
