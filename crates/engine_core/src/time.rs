//! Wall-clock access for the simulation.
//!
//! Everything that compares against building end times or save timestamps
//! reads time through [`Clock`], so tests can drive it by hand.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of Unix-millisecond timestamps.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// The real system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or_else(|e| {
                log::warn!("System clock is before the Unix epoch: {}", e);
                0
            })
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(start_millis),
        }
    }

    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Fixed-interval tick bookkeeping: interval, count, and last tick time.
#[derive(Debug, Clone)]
pub struct TickTimer {
    interval: Duration,
    tick_count: u64,
    last_tick: Option<i64>,
}

impl TickTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            tick_count: 0,
            last_tick: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Interval in seconds; the production delta per tick is scaled by this.
    pub fn interval_seconds(&self) -> f64 {
        self.interval.as_secs_f64()
    }

    /// Record a completed tick.
    pub fn record(&mut self, now_millis: i64) {
        self.tick_count += 1;
        self.last_tick = Some(now_millis);
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn last_tick(&self) -> Option<i64> {
        self.last_tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(1_000);
        clock.advance(Duration::from_millis(2_500));
        assert_eq!(clock.now_millis(), 3_500);
        clock.set(10);
        assert_eq!(clock.now_millis(), 10);
    }

    #[test]
    fn tick_timer_counts() {
        let mut t = TickTimer::new(Duration::from_millis(1000));
        assert_eq!(t.interval_seconds(), 1.0);
        assert_eq!(t.last_tick(), None);
        t.record(5);
        t.record(9);
        assert_eq!(t.tick_count(), 2);
        assert_eq!(t.last_tick(), Some(9));
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now_millis() > 1_577_836_800_000);
    }
}
