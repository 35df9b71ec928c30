//! Lines exposed through the legacy `/sys/class/gpio` interface, by way of [`sysfs_gpio`].
//!
//! A line must be exported before its `direction` and `value` attributes exist.
use super::{not_exported, Direction, GpioChip, GpioLine, HardwareError, Level, LineId};
use embedded_hal::digital::{ErrorType, InputPin, OutputPin, StatefulOutputPin};
use log::debug;
use std::io;
use sysfs_gpio::Pin;

fn gpio_label(number: u32) -> LineId {
    LineId(format!("gpio{}", number))
}

fn into_io(err: sysfs_gpio::Error) -> io::Error {
    match err {
        sysfs_gpio::Error::Io(source) => source,
        other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
    }
}

/// Failure while exporting or configuring a line.
fn claim_error(line: &LineId, err: sysfs_gpio::Error) -> HardwareError {
    HardwareError::claim(line, into_io(err))
}

fn io_error(line: &LineId, err: sysfs_gpio::Error) -> HardwareError {
    HardwareError::io(line, into_io(err))
}

impl From<Direction> for sysfs_gpio::Direction {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Input => sysfs_gpio::Direction::In,
            Direction::Output => sysfs_gpio::Direction::Out,
        }
    }
}

/// The kernel's sysfs GPIO class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SysfsGpio;

impl SysfsGpio {
    fn pin(number: u32) -> Pin {
        Pin::new(u64::from(number))
    }
}

impl GpioChip for SysfsGpio {
    type Line = SysfsLine;

    fn is_exported(&self, number: u32) -> bool {
        SysfsGpio::pin(number).is_exported()
    }

    fn export(&self, number: u32) -> Result<(), HardwareError> {
        let pin = SysfsGpio::pin(number);
        if pin.is_exported() {
            debug!("gpio{} already exported", number);
            return Ok(());
        }
        pin.export()
            .map_err(|err| claim_error(&gpio_label(number), err))?;
        debug!("Exported gpio{}", number);
        Ok(())
    }

    fn unexport(&self, number: u32) -> Result<(), HardwareError> {
        let pin = SysfsGpio::pin(number);
        if !pin.is_exported() {
            debug!("gpio{} not exported", number);
            return Ok(());
        }
        pin.unexport()
            .map_err(|err| io_error(&gpio_label(number), err))?;
        debug!("Unexported gpio{}", number);
        Ok(())
    }

    fn line(
        &self,
        number: u32,
        id: LineId,
        direction: Direction,
    ) -> Result<SysfsLine, HardwareError> {
        let pin = SysfsGpio::pin(number);
        if !pin.is_exported() {
            return Err(not_exported(id, number));
        }
        Ok(SysfsLine {
            id,
            number,
            pin,
            direction,
            last_level: None,
        })
    }
}

pub struct SysfsLine {
    id: LineId,
    number: u32,
    pin: Pin,
    direction: Direction,
    last_level: Option<Level>,
}

impl SysfsLine {
    pub fn number(&self) -> u32 {
        self.number
    }
}

impl GpioLine for SysfsLine {
    fn id(&self) -> &LineId {
        &self.id
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn last_level(&self) -> Option<Level> {
        self.last_level
    }

    fn configure(&mut self, direction: Direction) -> Result<(), HardwareError> {
        self.pin
            .set_direction(direction.into())
            .map_err(|err| claim_error(&self.id, err))?;
        self.direction = direction;
        Ok(())
    }

    /// Anything but `0` or `1` in the value file is an IO error.
    fn read(&mut self) -> Result<Level, HardwareError> {
        let level = self
            .pin
            .get_value()
            .map(Level::from)
            .map_err(|err| io_error(&self.id, err))?;
        self.last_level = Some(level);
        Ok(level)
    }

    fn write(&mut self, level: Level) -> Result<(), HardwareError> {
        if self.direction != Direction::Output {
            return Err(HardwareError::WrongDirection(self.id.clone()));
        }
        self.pin
            .set_value(level.into())
            .map_err(|err| io_error(&self.id, err))?;
        self.last_level = Some(level);
        Ok(())
    }
}

impl ErrorType for SysfsLine {
    type Error = HardwareError;
}

impl InputPin for SysfsLine {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.read()?.into())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.is_high()?)
    }
}

impl OutputPin for SysfsLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(Level::Low)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(Level::High)
    }
}

impl StatefulOutputPin for SysfsLine {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        self.is_high()
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        self.is_low()
    }
}
