//! Error types shared across the application
//!
//! Each layer has its own error enum. Link failures are collapsed into
//! `SessionError::LinkUnavailable` at the session boundary so callers see a
//! single "no link" condition regardless of what went wrong underneath.

use std::io;

use thiserror::Error;

/// Errors from the external rule engine process.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start rule engine {path:?}: {source}")]
    Spawn { path: String, source: io::Error },

    #[error("rule engine io error: {0}")]
    Io(#[from] io::Error),

    #[error("unexpected rule engine output: {0}")]
    Protocol(String),
}

/// Errors from the signaling link.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The link is reconnecting or was never established.
    #[error("link is not connected")]
    Unavailable,

    /// The link was shut down and will not reconnect.
    #[error("link is closed")]
    Closed,

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("transport failure: {0}")]
    Transport(#[from] io::Error),
}

/// Errors surfaced by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("move is not valid: {0}")]
    InvalidMove(String),

    /// The link could not carry the move. Local state is unchanged.
    #[error("no connection to the actuator")]
    LinkUnavailable,

    #[error("no moves to undo")]
    EmptyHistory,

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Errors while turning inbound text into pulses.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("no pulse pattern for character {0:?}")]
    UnknownSymbol(char),
}
