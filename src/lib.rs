//! Chess move signaling over TCP with a GPIO pulse actuator.
//!
//! Two halves share this crate: the operator console (rule engine adapter,
//! session controller, resilient link client) and the actuator daemon
//! (single-session TCP server, pulse transcoder, pin backends). The wire
//! protocol lives in `link::protocol` and is the only thing both halves
//! touch.

pub mod console;
pub mod engine;
pub mod error;
pub mod link;
pub mod session;
pub mod transcoder;
pub mod types;
