// ── Wall clock ──
//
// Derived state depends on local time ("today's" alarm, vitals age), so
// the coordinator reads time through this seam instead of calling
// `Local::now()` directly.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, FixedOffset, Local, TimeDelta};

/// Source of the current local time.
pub trait Clock: Send + Sync {
    /// Current time in the pod's local offset.
    fn now(&self) -> DateTime<FixedOffset>;
}

/// The host's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock that only moves when told to. Cloning shares the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<FixedOffset>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<FixedOffset>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_shared_time() {
        let start = DateTime::parse_from_rfc3339("2024-06-10T23:59:00-04:00").expect("ts");
        let clock = ManualClock::new(start);
        let other = clock.clone();
        clock.advance(TimeDelta::minutes(2));
        assert_eq!(
            other.now().to_rfc3339(),
            "2024-06-11T00:01:00-04:00"
        );
    }
}
