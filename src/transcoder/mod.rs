//! Transcoder module - inbound signal text to GPIO pulses
//!
//! The actuator half of the system: a single-session TCP server that
//! decodes move text character by character and drives an output pin with
//! timed pulses. Decoding and timing are pure; only the pin backends touch
//! the outside world.

pub mod code;
pub mod pin;
pub mod pulse;
pub mod server;

// Re-export commonly used types
pub use pin::{ConsolePin, OutputPin, RecordingPin, SysfsPin};
pub use pulse::{pulse_plan, Hold, PulsePlan, Pulser};
pub use server::{run_actuator, ActuatorConfig};
