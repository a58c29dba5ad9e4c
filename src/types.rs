//! Core types shared across the application
//! This module contains pure data types with no external dependencies

/// Pulse timing constants (in milliseconds)
pub const SHORT_HIGH_MS: u64 = 200;
pub const LONG_HIGH_MS: u64 = 500;
pub const PULSE_GAP_MS: u64 = 200;
pub const SEPARATOR_MS: u64 = 500;
pub const CHAR_GAP_MS: u64 = 500;

/// One element of a character's pulse pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PulseSymbol {
    /// 0.2s HIGH, then 0.2s LOW
    Short,
    /// 0.5s HIGH, then 0.2s LOW
    Long,
    /// 0.5s LOW, pin untouched
    Separator,
}

impl PulseSymbol {
    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            PulseSymbol::Short => "short",
            PulseSymbol::Long => "long",
            PulseSymbol::Separator => "separator",
        }
    }
}

/// Logical state of a digital output pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    High,
    Low,
}

impl Level {
    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::High => "HIGH",
            Level::Low => "LOW",
        }
    }
}
