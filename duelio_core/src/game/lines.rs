use crate::hardware::{GpioLine, HardwareError, LineId, Polarity};
use log::{debug, info, warn};

/// Input line read with a polarity.
pub struct Sensor {
    line: Box<dyn GpioLine>,
    polarity: Polarity,
    failing: bool,
}

impl Sensor {
    pub fn new(line: Box<dyn GpioLine>, polarity: Polarity) -> Self {
        Sensor {
            line,
            polarity,
            failing: false,
        }
    }

    pub fn id(&self) -> &LineId {
        self.line.id()
    }

    /// Whether the latest read failed.
    pub fn is_failing(&self) -> bool {
        self.failing
    }

    /// A failed read counts as not asserted.
    pub fn is_asserted(&mut self) -> bool {
        let result = self.line.read();
        self.failing = track_failure(self.line.id(), self.failing, result.as_ref().err(), "read");
        match result {
            Ok(level) => self.polarity.is_asserted(level),
            Err(_) => false,
        }
    }
}

/// Log a line going from working to failing and back, repeats only at debug.
///
/// Returns the new failing state.
fn track_failure(
    id: &LineId,
    failing: bool,
    error: Option<&HardwareError>,
    operation: &str,
) -> bool {
    match (failing, error) {
        (false, Some(err)) => warn!("Failed to {} '{}': {}", operation, id, err),
        (true, Some(err)) => debug!("Still failing to {} '{}': {}", operation, id, err),
        (true, None) => info!("'{}' recovered", id),
        (false, None) => {}
    }
    error.is_some()
}

/// LED output line.
pub struct Indicator {
    line: Box<dyn GpioLine>,
    polarity: Polarity,
    failing: bool,
}

impl Indicator {
    pub fn new(line: Box<dyn GpioLine>, polarity: Polarity) -> Self {
        Indicator {
            line,
            polarity,
            failing: false,
        }
    }

    /// Whether the latest write failed.
    pub fn is_failing(&self) -> bool {
        self.failing
    }

    pub fn id(&self) -> &LineId {
        self.line.id()
    }

    pub fn light(&mut self) {
        self.set(true);
    }

    pub fn dim(&mut self) {
        self.set(false);
    }

    /// `None` until a write has succeeded.
    pub fn is_lit(&self) -> Option<bool> {
        self.line
            .last_level()
            .map(|level| self.polarity.is_asserted(level))
    }

    /// Failed writes are not retried.
    fn set(&mut self, lit: bool) {
        let level = self.polarity.level_for(lit);
        let result = self.line.write(level);
        self.failing = track_failure(self.line.id(), self.failing, result.err().as_ref(), "write");
    }
}

/// The five lines of a game, configured before they get here.
pub struct GameLines {
    pub sensor1: Sensor,
    pub sensor2: Sensor,
    pub reset: Sensor,
    pub led1: Indicator,
    pub led2: Indicator,
}
