use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
#[derive(Copy, Clone, Debug, Ord, PartialOrd, PartialEq, Eq)]
pub struct TimeStamp(pub(crate) u128);

impl TimeStamp {
    pub fn now() -> Self {
        let since_the_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        TimeStamp(since_the_epoch.as_millis())
    }

    /// Milliseconds elapsed from `earlier` to `self`, zero if the clock stepped backwards.
    pub fn millis_since(&self, earlier: TimeStamp) -> u128 {
        self.0.saturating_sub(earlier.0)
    }
}

/// Pause between two iterations of the game poll loop.
pub const LOOP_PAUSE_TIME: Duration = Duration::from_millis(1);
