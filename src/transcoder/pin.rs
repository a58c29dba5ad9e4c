//! Digital output pin backends
//!
//! The pulse driver only ever sets the pin high or low. The sysfs backend
//! drives real GPIO hardware, the console backend prints transitions for
//! dry runs on machines without GPIO, and the recording backend captures
//! the transition sequence for tests.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::types::Level;

/// Digital output pin.
pub trait OutputPin {
    fn set_high(&mut self);
    fn set_low(&mut self);
    fn is_set_high(&self) -> bool;
}

const SYSFS_GPIO_BASE: &str = "/sys/class/gpio";

/// Kernel directory for one exported pin.
fn gpio_dir(number: u8) -> PathBuf {
    PathBuf::from(SYSFS_GPIO_BASE).join(format!("gpio{}", number))
}

/// Pin driven through `/sys/class/gpio`.
pub struct SysfsPin {
    number: u8,
    value_path: PathBuf,
    state: bool,
}

impl SysfsPin {
    /// Export the pin if needed and configure it as an output, driven low.
    pub fn open(number: u8) -> io::Result<Self> {
        let dir = gpio_dir(number);
        if !dir.exists() {
            fs::write(PathBuf::from(SYSFS_GPIO_BASE).join("export"), number.to_string())?;
        }

        // The gpio directory can take a moment to appear after export.
        let mut failed = None;
        for _ in 0..10 {
            match fs::write(dir.join("direction"), "out") {
                Ok(()) => {
                    failed = None;
                    break;
                }
                Err(err) => {
                    failed = Some(err);
                    thread::sleep(Duration::from_millis(20));
                }
            }
        }
        if let Some(err) = failed {
            return Err(err);
        }

        let mut pin = SysfsPin {
            number,
            value_path: dir.join("value"),
            state: false,
        };
        pin.write_value("0");
        Ok(pin)
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    fn write_value(&mut self, value: &str) {
        if let Err(err) = fs::write(&self.value_path, value) {
            eprintln!("[Actuator] gpio{} write failed: {}", self.number, err);
        }
    }
}

impl OutputPin for SysfsPin {
    fn set_high(&mut self) {
        self.write_value("1");
        self.state = true;
    }

    fn set_low(&mut self) {
        self.write_value("0");
        self.state = false;
    }

    fn is_set_high(&self) -> bool {
        self.state
    }
}

/// Pin that prints transitions instead of driving hardware.
#[derive(Debug, Default)]
pub struct ConsolePin {
    state: bool,
}

impl ConsolePin {
    pub fn new() -> Self {
        ConsolePin::default()
    }
}

impl OutputPin for ConsolePin {
    fn set_high(&mut self) {
        self.state = true;
        println!("[Actuator] pin {}", Level::High.as_str());
    }

    fn set_low(&mut self) {
        self.state = false;
        println!("[Actuator] pin {}", Level::Low.as_str());
    }

    fn is_set_high(&self) -> bool {
        self.state
    }
}

/// Pin that records every transition.
///
/// Clones share the same log, so a clone kept by the test keeps seeing
/// transitions after the original moves into the driver.
#[derive(Debug, Clone, Default)]
pub struct RecordingPin {
    transitions: Arc<Mutex<Vec<Level>>>,
}

impl RecordingPin {
    pub fn new() -> Self {
        RecordingPin::default()
    }

    /// Every transition recorded so far.
    pub fn transitions(&self) -> Vec<Level> {
        self.transitions.lock().unwrap().clone()
    }
}

impl OutputPin for RecordingPin {
    fn set_high(&mut self) {
        self.transitions.lock().unwrap().push(Level::High);
    }

    fn set_low(&mut self) {
        self.transitions.lock().unwrap().push(Level::Low);
    }

    fn is_set_high(&self) -> bool {
        matches!(self.transitions.lock().unwrap().last(), Some(Level::High))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sysfs_layout_matches_the_kernel_interface() {
        assert_eq!(gpio_dir(17), PathBuf::from("/sys/class/gpio/gpio17"));
        assert_eq!(
            gpio_dir(4).join("value"),
            PathBuf::from("/sys/class/gpio/gpio4/value")
        );
    }

    #[test]
    fn test_console_pin_tracks_state() {
        let mut pin = ConsolePin::new();
        assert!(!pin.is_set_high());
        pin.set_high();
        assert!(pin.is_set_high());
        pin.set_low();
        assert!(!pin.is_set_high());
    }

    #[test]
    fn test_recording_pin_logs_transitions() {
        let mut pin = RecordingPin::new();
        let log = pin.clone();
        pin.set_high();
        pin.set_low();
        pin.set_high();
        assert_eq!(
            log.transitions(),
            vec![Level::High, Level::Low, Level::High]
        );
        assert!(log.is_set_high());
    }
}
