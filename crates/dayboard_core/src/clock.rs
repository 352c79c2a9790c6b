//! Time source used by collections, engines and timers.
//!
//! # Responsibility
//! - Provide one injectable notion of "now" in local time.
//! - Allow tests and replay tools to drive time manually.
//!
//! # Invariants
//! - Every timestamp in core is a `DateTime<Local>`; calendar comparisons use
//!   the local date of that value.
//! - `ManualClock` clones share the same instant.

use chrono::{DateTime, Local, TimeDelta, TimeZone};
use std::cell::Cell;
use std::rc::Rc;

/// Wall-clock instant used by every entity in core.
pub type Timestamp = DateTime<Local>;

/// Shared handle used by collections that read the current time.
pub type SharedClock = Rc<dyn Clock>;

/// Source of the current local time.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Clock backed by the operating system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Local::now()
    }
}

/// Manually advanced clock.
///
/// Cloning yields a handle onto the same instant, so a test can keep one
/// clone while collections hold another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Timestamp>>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    /// Moves the clock to `instant`. Moving backwards is allowed.
    pub fn set(&self, instant: Timestamp) {
        self.now.set(instant);
    }

    /// Advances the clock by `delta` and returns the new instant.
    pub fn advance(&self, delta: TimeDelta) -> Timestamp {
        let next = self.now.get() + delta;
        self.now.set(next);
        next
    }

    /// Advances the clock by whole milliseconds.
    pub fn advance_ms(&self, millis: i64) -> Timestamp {
        self.advance(TimeDelta::milliseconds(millis))
    }

    /// Returns this clock as a shared trait object.
    pub fn shared(&self) -> SharedClock {
        Rc::new(self.clone())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}

/// Builds a local timestamp from calendar parts.
///
/// Returns `None` for instants that do not exist or are ambiguous in the
/// local zone (DST transitions).
pub fn local_timestamp(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> Option<Timestamp> {
    Local
        .with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
}

#[cfg(test)]
mod tests {
    use super::{local_timestamp, Clock, ManualClock};
    use chrono::TimeDelta;

    #[test]
    fn manual_clock_clones_share_the_same_instant() {
        let start = local_timestamp(2024, 1, 14, 9, 0, 0).expect("valid local time");
        let clock = ManualClock::new(start);
        let handle = clock.shared();

        clock.advance(TimeDelta::minutes(5));
        assert_eq!(handle.now(), start + TimeDelta::minutes(5));

        clock.advance_ms(1_500);
        assert_eq!(
            handle.now(),
            start + TimeDelta::minutes(5) + TimeDelta::milliseconds(1_500)
        );
    }
}
