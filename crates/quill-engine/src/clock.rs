//! Time source for countdown anchors.

use std::sync::atomic::{AtomicI32, Ordering};

/// Source of "now" in unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> i32;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i32 {
        saturating_secs(chrono::Utc::now().timestamp())
    }
}

/// Narrows unix seconds to the stored width, pinning past-2038 values at `i32::MAX`.
fn saturating_secs(secs: i64) -> i32 {
    i32::try_from(secs).unwrap_or(i32::MAX)
}

/// Manually driven clock for tests and replays.
pub struct FixedClock {
    now: AtomicI32,
}

impl FixedClock {
    pub fn new(now: i32) -> Self {
        Self {
            now: AtomicI32::new(now),
        }
    }

    pub fn advance(&self, seconds: i32) {
        self.now.fetch_add(seconds, Ordering::Relaxed);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> i32 {
        self.now.load(Ordering::Relaxed)
    }
}
