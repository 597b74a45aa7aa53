//! Clocks and UUID generators.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::traits::{Clock, UuidGenerator};

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomUuids;

impl UuidGenerator for RandomUuids {
    fn new_uuid(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// A clock for tests. Returns `start` on the first call and advances by
/// `tick` on every call after that. The default tick is zero.
#[derive(Debug)]
pub struct FixedClock {
    start: DateTime<Utc>,
    tick: Duration,
    calls: AtomicU64,
}

impl FixedClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            start,
            tick: Duration::zero(),
            calls: AtomicU64::new(0),
        }
    }

    pub fn advancing(start: DateTime<Utc>, tick: Duration) -> Self {
        Self {
            tick,
            ..Self::new(start)
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let n = self.calls.fetch_add(1, Ordering::Relaxed);
        self.start + self.tick * n as i32
    }
}

/// Deterministic v4-shaped UUIDs for tests: the seed fills the high bits
/// and a counter the low bits.
#[derive(Debug)]
pub struct SequentialUuids {
    seed: u64,
    next: AtomicU64,
}

impl SequentialUuids {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            next: AtomicU64::new(1),
        }
    }
}

impl UuidGenerator for SequentialUuids {
    fn new_uuid(&self) -> Uuid {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        let value = (u128::from(self.seed) << 64) | u128::from(n);
        uuid::Builder::from_random_bytes(value.to_be_bytes()).into_uuid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances_by_tick() {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let clock = FixedClock::advancing(start, Duration::seconds(2));
        assert_eq!(clock.now(), start);
        assert_eq!(clock.now(), start + Duration::seconds(2));
        assert_eq!(clock.now(), start + Duration::seconds(4));

        let fixed = FixedClock::new(start);
        assert_eq!(fixed.now(), fixed.now());
    }

    #[test]
    fn sequential_uuids_are_distinct_v4_and_repeatable() {
        let a = SequentialUuids::new(1);
        let first = a.new_uuid();
        let second = a.new_uuid();
        assert_ne!(first, second);
        assert_eq!(first.get_version_num(), 4);
        assert_eq!(SequentialUuids::new(1).new_uuid(), first);
        assert_ne!(SequentialUuids::new(2).new_uuid(), first);
    }
}
