//! Session controller - the only writer of board state
//!
//! Commit order is fixed: validate, transmit, apply, record. A failure at
//! any step leaves everything before it untouched, so a rejected or
//! undeliverable move never shows up on the local board or in history.
//! Undo is deliberately local: no message is sent, the actuator side has no
//! notion of taking a move back.

use crate::engine::{RuleEngine, ScoredMove, Snapshot};
use crate::error::SessionError;
use crate::link::{LinkState, SignalLink};
use crate::session::history::{History, MoveRecord};

/// Owns the rule engine, the link and the history stack.
pub struct SessionController<E, L> {
    engine: E,
    link: L,
    history: History,
}

impl<E: RuleEngine, L: SignalLink> SessionController<E, L> {
    pub fn new(engine: E, link: L) -> Self {
        SessionController {
            engine,
            link,
            history: History::new(),
        }
    }

    /// Validate, signal and play a move.
    ///
    /// The move reaches the wire before it reaches the local board: if
    /// transmission fails the position and history are exactly as before.
    pub fn commit_move(&mut self, move_text: &str) -> Result<(), SessionError> {
        let move_text = move_text.trim();
        if !self.engine.is_move_legal(move_text)? {
            return Err(SessionError::InvalidMove(move_text.to_string()));
        }

        let before = self.engine.current_position()?;
        self.link
            .transmit(move_text)
            .map_err(|_| SessionError::LinkUnavailable)?;

        // The wire already carried the move. If the engine refuses it now,
        // restore the pre-move position instead of leaving the board split
        // between two states.
        if let Err(err) = self.engine.apply_move(move_text) {
            let _ = self.engine.set_position(&before);
            return Err(err.into());
        }

        self.history.push(MoveRecord {
            move_text: move_text.to_string(),
            before,
        });
        Ok(())
    }

    /// Signal a move without playing it locally.
    ///
    /// Still validated against the current position; history and board are
    /// untouched.
    pub fn send_raw(&mut self, text: &str) -> Result<(), SessionError> {
        let text = text.trim();
        if !self.engine.is_move_legal(text)? {
            return Err(SessionError::InvalidMove(text.to_string()));
        }
        self.link
            .transmit(text)
            .map_err(|_| SessionError::LinkUnavailable)?;
        Ok(())
    }

    /// Take back the most recent committed move. Local only.
    pub fn undo(&mut self) -> Result<(), SessionError> {
        let record = match self.history.pop() {
            Some(record) => record,
            None => return Err(SessionError::EmptyHistory),
        };
        if let Err(err) = self.engine.set_position(&record.before) {
            // Keep the record so the stack still matches the board.
            self.history.push(record);
            return Err(err.into());
        }
        Ok(())
    }

    /// Return to the starting position and forget all history.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.engine.reset()?;
        self.history.clear();
        Ok(())
    }

    /// Best `count` candidate moves for the current position.
    pub fn best_moves(&mut self, count: usize) -> Result<Vec<ScoredMove>, SessionError> {
        Ok(self.engine.best_moves(count)?)
    }

    /// Snapshot of the current position.
    pub fn position(&mut self) -> Result<Snapshot, SessionError> {
        Ok(self.engine.current_position()?)
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn link_state(&self) -> LinkState {
        self.link.state()
    }

    pub fn link(&self) -> &L {
        &self.link
    }
}
