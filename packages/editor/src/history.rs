//! # Edit History
//!
//! Bounded, linear sequence of snapshots with a cursor marking the one on
//! display.
//!
//! ## Semantics
//!
//! - Pushing a snapshot equal to the current one does nothing
//! - Pushing while the cursor is behind the tail drops the redo branch
//! - Going over capacity evicts the oldest entry and shifts the cursor
//! - Stepping past either end is a silent no-op
//!
//! ```rust,ignore
//! let mut history = History::new(50);
//! history.push(Snapshot::capture(&doc)?);
//! if let Some(previous) = history.step_back() {
//!     previous.restore(&mut doc)?;
//! }
//! ```

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::snapshot::Snapshot;

pub const DEFAULT_MAX_HISTORY: usize = 50;

/// Whether undo and redo currently have somewhere to go
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub can_undo: bool,
    pub can_redo: bool,
}

#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<Snapshot>,
    cursor: Option<usize>,
    max_len: usize,
}

impl History {
    /// A capacity of zero is raised to one
    pub fn new(max_len: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: None,
            max_len: max_len.max(1),
        }
    }

    /// Record a new state. Returns false when it matched the current entry.
    pub fn push(&mut self, snapshot: Snapshot) -> bool {
        if self.current() == Some(&snapshot) {
            return false;
        }

        if let Some(cursor) = self.cursor {
            self.entries.truncate(cursor + 1);
        }
        self.entries.push_back(snapshot);

        while self.entries.len() > self.max_len {
            self.entries.pop_front();
        }

        self.cursor = Some(self.entries.len() - 1);
        true
    }

    pub fn step_back(&mut self) -> Option<&Snapshot> {
        let cursor = self.cursor.filter(|&cursor| cursor > 0)? - 1;
        self.cursor = Some(cursor);
        self.entries.get(cursor)
    }

    pub fn step_forward(&mut self) -> Option<&Snapshot> {
        let cursor = self.cursor.filter(|&cursor| cursor + 1 < self.entries.len())? + 1;
        self.cursor = Some(cursor);
        self.entries.get(cursor)
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.entries.get(self.cursor?)
    }

    pub fn availability(&self) -> Availability {
        match self.cursor {
            Some(cursor) => Availability {
                can_undo: cursor > 0,
                can_redo: cursor + 1 < self.entries.len(),
            },
            None => Availability::default(),
        }
    }

    pub fn can_undo(&self) -> bool {
        self.availability().can_undo
    }

    pub fn can_redo(&self) -> bool {
        self.availability().can_redo
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Entries oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}
