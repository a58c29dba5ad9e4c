//! Board history stack
//!
//! Every committed move is recorded with the snapshot taken right before it
//! was played, so undo is a pop plus a position restore. The stack only ever
//! grows by one per commit and is cleared on reset.

use crate::engine::Snapshot;

/// A committed move and the position it was played from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub move_text: String,
    /// Position before the move was applied.
    pub before: Snapshot,
}

/// LIFO stack of moves committed since the last reset.
#[derive(Debug, Clone, Default)]
pub struct History {
    records: Vec<MoveRecord>,
}

impl History {
    pub fn new() -> Self {
        History::default()
    }

    /// Record a committed move.
    pub fn push(&mut self, record: MoveRecord) {
        self.records.push(record);
    }

    /// Take back the most recent move, if any.
    pub fn pop(&mut self) -> Option<MoveRecord> {
        self.records.pop()
    }

    /// Most recent move without removing it.
    pub fn last(&self) -> Option<&MoveRecord> {
        self.records.last()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
