//! Link module - signaling connection to the actuator
//!
//! Implements the newline-delimited JSON protocol and the resilient TCP
//! client behind it. The session controller only sees the `SignalLink`
//! trait; tests substitute an in-memory link.

pub mod client;
pub mod protocol;

// Re-export commonly used types
pub use client::{LinkConfig, LinkHandle, LinkState};

use crate::error::LinkError;

/// Outgoing half of the link as the session sees it.
pub trait SignalLink {
    /// Current connection state.
    fn state(&self) -> LinkState;

    /// Deliver one move text to the actuator.
    ///
    /// Fails without queueing when the link is anything but connected.
    fn transmit(&self, move_text: &str) -> Result<(), LinkError>;
}
