//! Console module - interactive operator frontend
//!
//! A line-oriented REPL around the session controller plus a plain-text
//! board renderer. Command parsing and rendering are pure functions so
//! everything here is testable without a terminal.

pub mod command;
pub mod view;

// Re-export commonly used types
pub use command::{parse_command, parse_console_args, ConsoleArgs, ConsoleCommand};
pub use view::{board_lines, score_lines, status_lines};
