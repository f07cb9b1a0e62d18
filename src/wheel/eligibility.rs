//! Once-per-calendar-day eligibility
//!
//! Eligibility compares calendar dates in the player's local offset, not
//! elapsed hours: a spin at 23:59 allows another at 00:01. It is recomputed
//! on every check so a session left open across midnight unlocks on its own.

use std::sync::Mutex;

use chrono::{DateTime, Duration, FixedOffset, Local, Utc};

/// Source of the current local time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock in the system's local timezone
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Manually driven clock
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// True when `last_spin` falls on a different local calendar day than `now`
pub fn can_spin(last_spin: DateTime<Utc>, now: DateTime<FixedOffset>) -> bool {
    last_spin.with_timezone(now.offset()).date_naive() != now.date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::never_spun;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn test_same_day_is_locked() {
        let now = at("2026-10-19T18:00:00+00:00");
        let earlier = at("2026-10-19T00:05:00+00:00").with_timezone(&Utc);
        assert!(!can_spin(earlier, now));
        assert!(!can_spin(now.with_timezone(&Utc), now));
    }

    #[test]
    fn test_yesterday_is_ready_regardless_of_hours() {
        // Only two minutes apart, but across midnight
        let now = at("2026-10-19T00:01:00+00:00");
        let last = at("2026-10-18T23:59:00+00:00").with_timezone(&Utc);
        assert!(can_spin(last, now));

        assert!(can_spin(never_spun(), now));
    }

    #[test]
    fn test_uses_local_offset() {
        // 22:00 UTC on the 18th is already the 19th at +05:00
        let last = at("2026-10-18T22:00:00+00:00").with_timezone(&Utc);
        assert!(!can_spin(last, at("2026-10-19T09:00:00+05:00")));
        assert!(can_spin(last, at("2026-10-19T09:00:00+00:00")));
    }

    #[test]
    fn test_fixed_clock_advance() {
        let clock = FixedClock::new(at("2026-10-19T23:00:00+00:00"));
        let last = clock.now().with_timezone(&Utc);
        assert!(!can_spin(last, clock.now()));

        clock.advance(Duration::hours(2));
        assert!(can_spin(last, clock.now()));
    }
}
