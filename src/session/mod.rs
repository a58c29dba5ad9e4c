//! Session module - move commitment and board history
//!
//! The session controller owns the rule engine and the signaling link and
//! keeps them consistent: a move only lands in local state after the link
//! has carried it, and undo rewinds local state only.

pub mod controller;
pub mod history;

// Re-export commonly used types
pub use controller::SessionController;
pub use history::{History, MoveRecord};
