//! GPIO line abstraction
//!
//! A [`GpioLine`] is one boolean signal exposed by the OS, either read by the game (sensors) or
//! written by it (LEDs). Lines are opened by number from a [`GpioChip`]. Two backends exist:
//! [`sysfs`] for the `/sys/class/gpio` interface and [`dummy`] for tests and hardware-less runs.
use derive_more::{Display, From};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorKind, StatefulOutputPin};
use serde::{Deserialize, Serialize};
use std::io;
use std::str::FromStr;
use std::thread;
use std::time::Duration;
use thiserror::Error;

pub mod dummy;
pub mod sysfs;

/// Raw OS error number for "Device or resource busy".
const EBUSY: i32 = 16;

#[derive(Error, Debug)]
pub enum HardwareError {
    #[error("Line '{line}' is unavailable: {source}")]
    ResourceUnavailable { line: LineId, source: io::Error },
    #[error("IO error on line '{line}': {source}")]
    Io { line: LineId, source: io::Error },
    #[error("Line '{0}' is not configured as an output")]
    WrongDirection(LineId),
}

impl HardwareError {
    pub(crate) fn io(line: &LineId, source: io::Error) -> Self {
        HardwareError::Io {
            line: line.clone(),
            source,
        }
    }

    /// Errors raised while claiming a line.
    ///
    /// A missing, forbidden or busy resource cannot be claimed, anything else is a plain IO error.
    pub(crate) fn claim(line: &LineId, source: io::Error) -> Self {
        let unavailable = matches!(
            source.kind(),
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
        ) || source.raw_os_error() == Some(EBUSY);
        if unavailable {
            HardwareError::ResourceUnavailable {
                line: line.clone(),
                source,
            }
        } else {
            HardwareError::io(line, source)
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, HardwareError::ResourceUnavailable { .. })
    }
}

impl embedded_hal::digital::Error for HardwareError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(From, Serialize, Deserialize, Display, Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineId(pub String);

impl AsRef<str> for LineId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LineId {
    fn from(x: &str) -> Self {
        String::from(x).into()
    }
}

/// Electrical level of a line, as found in a sysfs `value` file.
#[derive(Serialize, Deserialize, Display, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Low,
    High,
}

impl Level {
    pub fn as_sysfs(&self) -> &'static str {
        match self {
            Level::Low => "0",
            Level::High => "1",
        }
    }
}

impl From<u8> for Level {
    fn from(value: u8) -> Self {
        Level::from(value != 0)
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        match level {
            Level::Low => 0,
            Level::High => 1,
        }
    }
}

impl std::ops::Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> Self {
        match level {
            Level::High => true,
            Level::Low => false,
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" | "low" => Ok(Level::Low),
            "1" | "high" => Ok(Level::High),
            _ => Err(format!("Invalid level '{}', expected 0 or 1", s)),
        }
    }
}

#[derive(Serialize, Deserialize, Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    #[serde(rename = "in")]
    #[display(fmt = "in")]
    Input,
    #[serde(rename = "out")]
    #[display(fmt = "out")]
    Output,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(Direction::Input),
            "out" => Ok(Direction::Output),
            _ => Err(format!("Invalid direction '{}', expected in or out", s)),
        }
    }
}

/// Which level means "asserted" on a line.
///
/// The game sensors pull their line low when triggered, so a read `'0'` counts as asserted.
/// LEDs are lit by driving their line high.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    ActiveLow,
    ActiveHigh,
}

impl Polarity {
    pub fn from_active_low(active_low: bool) -> Self {
        if active_low {
            Polarity::ActiveLow
        } else {
            Polarity::ActiveHigh
        }
    }

    pub fn is_asserted(&self, level: Level) -> bool {
        match self {
            Polarity::ActiveLow => level == Level::Low,
            Polarity::ActiveHigh => level == Level::High,
        }
    }

    pub fn level_for(&self, asserted: bool) -> Level {
        match self {
            Polarity::ActiveLow => Level::from(!asserted),
            Polarity::ActiveHigh => Level::from(asserted),
        }
    }
}

/// Common GPIO line interface
pub trait GpioLine: Send {
    fn id(&self) -> &LineId;
    fn direction(&self) -> Direction;
    /// Level seen by the latest successful read or write.
    fn last_level(&self) -> Option<Level>;
    /// Claim the underlying resource with the given direction.
    fn configure(&mut self, direction: Direction) -> Result<(), HardwareError>;
    fn read(&mut self) -> Result<Level, HardwareError>;
    fn write(&mut self, level: Level) -> Result<(), HardwareError>;
}

/// Numbered lines that must be exported before they can be opened.
pub trait GpioChip {
    type Line: GpioLine + StatefulOutputPin<Error = HardwareError> + 'static;

    fn is_exported(&self, number: u32) -> bool;
    /// Register a line with the kernel, a no-op if it is already exported.
    fn export(&self, number: u32) -> Result<(), HardwareError>;
    fn unexport(&self, number: u32) -> Result<(), HardwareError>;
    /// Open an exported line without touching its direction.
    ///
    /// Fails with [`HardwareError::ResourceUnavailable`] when the line is not exported.
    fn line(&self, number: u32, id: LineId, direction: Direction)
        -> Result<Self::Line, HardwareError>;

    /// Export a line and set its direction.
    fn setup_line(
        &self,
        number: u32,
        id: LineId,
        direction: Direction,
    ) -> Result<Self::Line, HardwareError> {
        self.export(number)?;
        let mut line = self.line(number, id, direction)?;
        line.configure(direction)?;
        Ok(line)
    }
}

/// Error for a line that has not been exported.
pub(crate) fn not_exported(line: LineId, number: u32) -> HardwareError {
    HardwareError::ResourceUnavailable {
        line,
        source: io::Error::new(
            io::ErrorKind::NotFound,
            format!("gpio{} is not exported", number),
        ),
    }
}

/// Blocking delay backed by [`thread::sleep`].
pub struct Delay {}

impl DelayNs for Delay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(ns.into()));
    }
}

/// Toggle an output `times` full periods, leaving it at the level it started from.
pub fn blink<P: StatefulOutputPin, D: DelayNs>(
    pin: &mut P,
    delay: &mut D,
    times: u32,
    half_period_ms: u32,
) -> Result<(), P::Error> {
    for _ in 0..times {
        pin.toggle()?;
        delay.delay_ms(half_period_ms);
        pin.toggle()?;
        delay.delay_ms(half_period_ms);
    }
    Ok(())
}
