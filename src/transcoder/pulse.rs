//! Pulse planning and emission
//!
//! Decoding is split from timing. `pulse_plan` turns signal text into a
//! flat list of (level, duration) holds and collects the characters it had
//! to skip; `Pulser` then walks the holds against a pin in real time.
//! Writes that would not change the level are suppressed, so a separator
//! inside a LOW stretch never touches the pin.

use std::time::Duration;

use crate::transcoder::code;
use crate::transcoder::pin::OutputPin;
use crate::types::{
    Level, PulseSymbol, CHAR_GAP_MS, LONG_HIGH_MS, PULSE_GAP_MS, SEPARATOR_MS, SHORT_HIGH_MS,
};

/// One timed pin state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hold {
    pub level: Level,
    pub duration: Duration,
}

impl Hold {
    fn new(level: Level, ms: u64) -> Self {
        Hold {
            level,
            duration: Duration::from_millis(ms),
        }
    }
}

/// Timed plan for one signal text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PulsePlan {
    pub holds: Vec<Hold>,
    /// Characters with no pattern, in input order.
    pub skipped: Vec<char>,
}

impl PulsePlan {
    /// Wall-clock time the plan takes to emit.
    pub fn duration(&self) -> Duration {
        self.holds.iter().map(|hold| hold.duration).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.holds.is_empty()
    }
}

/// Decode `text` into a timed plan, one character after another.
pub fn pulse_plan(text: &str) -> PulsePlan {
    let mut plan = PulsePlan::default();
    for c in text.chars() {
        match code::lookup(c) {
            Some(pattern) => {
                for &symbol in pattern {
                    push_symbol(&mut plan.holds, symbol);
                }
                plan.holds.push(Hold::new(Level::Low, CHAR_GAP_MS));
            }
            None => plan.skipped.push(c),
        }
    }
    plan
}

/// Append the holds for one pattern symbol.
fn push_symbol(holds: &mut Vec<Hold>, symbol: PulseSymbol) {
    match symbol {
        PulseSymbol::Short => {
            holds.push(Hold::new(Level::High, SHORT_HIGH_MS));
            holds.push(Hold::new(Level::Low, PULSE_GAP_MS));
        }
        PulseSymbol::Long => {
            holds.push(Hold::new(Level::High, LONG_HIGH_MS));
            holds.push(Hold::new(Level::Low, PULSE_GAP_MS));
        }
        PulseSymbol::Separator => {
            holds.push(Hold::new(Level::Low, SEPARATOR_MS));
        }
    }
}

/// Walks plans against a pin, holding each level for its duration.
pub struct Pulser<P> {
    pin: P,
    level: Level,
}

impl<P: OutputPin> Pulser<P> {
    /// Take the pin and force it to a known LOW state.
    pub fn new(mut pin: P) -> Self {
        pin.set_low();
        Pulser {
            pin,
            level: Level::Low,
        }
    }

    /// Emit the whole plan. Returns only when the last hold has elapsed.
    pub async fn emit(&mut self, plan: &PulsePlan) {
        for hold in &plan.holds {
            self.drive(hold.level);
            tokio::time::sleep(hold.duration).await;
        }
    }

    /// Change the pin level, skipping writes that would not change it.
    fn drive(&mut self, level: Level) {
        if level != self.level {
            match level {
                Level::High => self.pin.set_high(),
                Level::Low => self.pin.set_low(),
            }
            self.level = level;
        }
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }
}
