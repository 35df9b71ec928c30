//! Dummy lines for testing and running without hardware.
use super::{not_exported, Direction, GpioChip, GpioLine, HardwareError, Level, LineId};
use embedded_hal::digital::{ErrorType, InputPin, OutputPin, StatefulOutputPin};
use rand::prelude::*;
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct DummyState {
    level: Level,
    direction: Option<Direction>,
    failing_reads: usize,
    failing_writes: usize,
    unavailable: bool,
    reads: usize,
    writes: Vec<Level>,
}

/// Shared view of a [`DummyLine`], used to drive inputs and inspect outputs.
#[derive(Debug, Clone, Default)]
pub struct DummyHandle(Arc<Mutex<DummyState>>);

impl DummyHandle {
    fn lock(&self) -> MutexGuard<'_, DummyState> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_level(&self, level: Level) {
        self.lock().level = level;
    }

    pub fn level(&self) -> Level {
        self.lock().level
    }

    /// Direction set by the latest `configure`, if any.
    pub fn direction(&self) -> Option<Direction> {
        self.lock().direction
    }

    /// Make the next `count` reads fail.
    pub fn fail_reads(&self, count: usize) {
        self.lock().failing_reads = count;
    }

    /// Make the next `count` writes fail.
    pub fn fail_writes(&self, count: usize) {
        self.lock().failing_writes = count;
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    pub fn read_count(&self) -> usize {
        self.lock().reads
    }

    /// Every level successfully written, oldest first.
    pub fn writes(&self) -> Vec<Level> {
        self.lock().writes.clone()
    }
}

/// In-memory line
///
/// Reads return the level held by the shared [`DummyHandle`], or a random level when built with
/// [`DummyLine::random`].
pub struct DummyLine {
    id: LineId,
    direction: Direction,
    last_level: Option<Level>,
    state: DummyHandle,
    trigger: Option<(f64, Level)>,
}

impl DummyLine {
    pub fn new<I: Into<LineId>>(id: I, direction: Direction, initial: Level) -> Self {
        let state = DummyHandle::default();
        {
            let mut locked = state.lock();
            locked.level = initial;
            locked.direction = Some(direction);
        }
        DummyLine::attach(id.into(), direction, state)
    }

    fn attach(id: LineId, direction: Direction, state: DummyHandle) -> Self {
        DummyLine {
            id,
            direction,
            last_level: None,
            state,
            trigger: None,
        }
    }

    /// Line reading `active` with the given probability on every read, `!active` otherwise.
    pub fn random<I: Into<LineId>>(
        id: I,
        direction: Direction,
        probability: f64,
        active: Level,
    ) -> Self {
        let probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        let mut line = DummyLine::new(id, direction, !active);
        line.trigger = Some((probability, active));
        line
    }

    pub fn handle(&self) -> DummyHandle {
        self.state.clone()
    }
}

impl GpioLine for DummyLine {
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
        let mut state = self.state.lock();
        if state.unavailable {
            return Err(HardwareError::ResourceUnavailable {
                line: self.id.clone(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "dummy line claimed"),
            });
        }
        state.direction = Some(direction);
        drop(state);
        self.direction = direction;
        Ok(())
    }

    fn read(&mut self) -> Result<Level, HardwareError> {
        let level = {
            let mut state = self.state.lock();
            state.reads += 1;
            if state.failing_reads > 0 {
                state.failing_reads -= 1;
                return Err(HardwareError::io(
                    &self.id,
                    io::Error::new(io::ErrorKind::Other, "dummy read failure"),
                ));
            }
            if let Some((probability, active)) = self.trigger {
                state.level = if thread_rng().gen_bool(probability) {
                    active
                } else {
                    !active
                };
            }
            state.level
        };
        self.last_level = Some(level);
        Ok(level)
    }

    fn write(&mut self, level: Level) -> Result<(), HardwareError> {
        if self.direction != Direction::Output {
            return Err(HardwareError::WrongDirection(self.id.clone()));
        }
        let mut state = self.state.lock();
        if state.failing_writes > 0 {
            state.failing_writes -= 1;
            return Err(HardwareError::io(
                &self.id,
                io::Error::new(io::ErrorKind::Other, "dummy write failure"),
            ));
        }
        state.level = level;
        state.writes.push(level);
        drop(state);
        self.last_level = Some(level);
        Ok(())
    }
}

impl ErrorType for DummyLine {
    type Error = HardwareError;
}

impl InputPin for DummyLine {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.read()?.into())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.is_high()?)
    }
}

impl OutputPin for DummyLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(Level::Low)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(Level::High)
    }
}

impl StatefulOutputPin for DummyLine {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.state.level().into())
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.is_set_high()?)
    }
}

/// In-memory stand-in for the sysfs GPIO class.
///
/// Exported lines start out as inputs reading high, like an idle active-low sensor. Each exported
/// number owns one [`DummyHandle`] shared by every line opened on it.
#[derive(Debug, Clone, Default)]
pub struct DummyChip(Arc<Mutex<HashMap<u32, DummyHandle>>>);

impl DummyChip {
    pub fn new(exported: &[u32]) -> Self {
        let chip = DummyChip::default();
        for number in exported {
            chip.insert(*number);
        }
        chip
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u32, DummyHandle>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn insert(&self, number: u32) {
        self.lock().entry(number).or_insert_with(|| {
            let handle = DummyHandle::default();
            {
                let mut state = handle.lock();
                state.level = Level::High;
                state.direction = Some(Direction::Input);
            }
            handle
        });
    }

    /// Handle of an exported line.
    pub fn handle(&self, number: u32) -> Option<DummyHandle> {
        self.lock().get(&number).cloned()
    }

    pub fn exported(&self) -> Vec<u32> {
        let mut numbers: Vec<u32> = self.lock().keys().copied().collect();
        numbers.sort_unstable();
        numbers
    }
}

impl GpioChip for DummyChip {
    type Line = DummyLine;

    fn is_exported(&self, number: u32) -> bool {
        self.lock().contains_key(&number)
    }

    fn export(&self, number: u32) -> Result<(), HardwareError> {
        self.insert(number);
        Ok(())
    }

    fn unexport(&self, number: u32) -> Result<(), HardwareError> {
        self.lock().remove(&number);
        Ok(())
    }

    fn line(
        &self,
        number: u32,
        id: LineId,
        direction: Direction,
    ) -> Result<DummyLine, HardwareError> {
        match self.handle(number) {
            Some(handle) => Ok(DummyLine::attach(id, direction, handle)),
            None => Err(not_exported(id, number)),
        }
    }
}
