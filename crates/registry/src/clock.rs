//! Time source for due dates

use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// Supplies the current time to the registry
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and scripted scenarios
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        match self.now.lock() {
            Ok(mut guard) => *guard = now,
            Err(poisoned) => *poisoned.into_inner() = now,
        }
    }

    /// Move the clock; returns the new time, or None if it would overflow
    pub fn advance(&self, by: chrono::Duration) -> Option<DateTime<Utc>> {
        let next = self.now().checked_add_signed(by)?;
        self.set(next);
        Some(next)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_clock_advances() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let clock = FixedClock::new(start);
        assert_eq!(clock.now(), start);

        let next = clock.advance(chrono::Duration::days(2));
        assert_eq!(next, Some(Utc.with_ymd_and_hms(2024, 3, 3, 12, 0, 0).unwrap()));
        assert_eq!(clock.now(), Utc.with_ymd_and_hms(2024, 3, 3, 12, 0, 0).unwrap());
        assert!(clock.advance(chrono::Duration::MAX).is_none());
    }
}
