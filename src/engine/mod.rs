//! Rule engine module - chess legality and position tracking
//!
//! The session never interprets positions itself. It talks to an external
//! UCI engine through the `RuleEngine` trait and stores whatever snapshot
//! strings the engine hands back. Tests substitute a scripted engine.

pub mod uci;

// Re-export the production engine
pub use uci::{EngineConfig, UciEngine};

use std::fmt;

use crate::error::EngineError;

/// Opaque serialized position as produced by the rule engine (a FEN string).
///
/// The session stores and restores snapshots without ever parsing them;
/// only the console view looks inside to draw the board.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Snapshot(String);

impl Snapshot {
    pub fn new(fen: impl Into<String>) -> Self {
        Snapshot(fen.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Evaluation attached to a candidate move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    /// Centipawns from the side to move.
    Centipawns(i32),
    /// Forced mate in the given number of moves (negative = getting mated).
    Mate(i32),
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Centipawns(cp) => write!(f, "{}", cp),
            Score::Mate(n) => write!(f, "#{}", n),
        }
    }
}

/// A candidate move with its evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredMove {
    pub move_text: String,
    pub score: Score,
}

/// Boundary to the chess rule engine.
///
/// Every call may fail: the engine is an external process. Implementations
/// keep their own notion of the current position; `set_position` must accept
/// any snapshot previously returned by `current_position`.
pub trait RuleEngine {
    /// Whether `move_text` is legal in the current position.
    fn is_move_legal(&mut self, move_text: &str) -> Result<bool, EngineError>;

    /// Play `move_text` on the current position.
    fn apply_move(&mut self, move_text: &str) -> Result<(), EngineError>;

    /// Snapshot of the current position.
    fn current_position(&mut self) -> Result<Snapshot, EngineError>;

    /// Restore a previously captured snapshot.
    fn set_position(&mut self, snapshot: &Snapshot) -> Result<(), EngineError>;

    /// Return to the starting position.
    fn reset(&mut self) -> Result<(), EngineError>;

    /// Best `count` moves for the current position, strongest first.
    fn best_moves(&mut self, count: usize) -> Result<Vec<ScoredMove>, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_roundtrip() {
        let snap = Snapshot::new("8/8/8/8/8/8/8/8 w - - 0 1");
        assert_eq!(snap.as_str(), "8/8/8/8/8/8/8/8 w - - 0 1");
        assert_eq!(snap.to_string(), snap.as_str());
    }

    #[test]
    fn test_score_display() {
        assert_eq!(Score::Centipawns(34).to_string(), "34");
        assert_eq!(Score::Centipawns(-120).to_string(), "-120");
        assert_eq!(Score::Mate(3).to_string(), "#3");
        assert_eq!(Score::Mate(-2).to_string(), "#-2");
    }
}
