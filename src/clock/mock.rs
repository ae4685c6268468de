use crate::clock::Clock;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// A manually driven clock for tests.
///
/// Time only moves when [`MockClock::advance`] is called.
pub struct MockClock {
    offset_ms: AtomicI64,
}

impl MockClock {
    /// Creates a clock pinned at 2020-01-01T00:00:00Z.
    pub fn new() -> Self {
        Self::starting_at(1_577_836_800_000)
    }

    pub fn starting_at(epoch_ms: i64) -> Self {
        Self {
            offset_ms: AtomicI64::new(epoch_ms),
        }
    }

    pub fn advance(&self, amount: Duration) {
        self.offset_ms.fetch_add(amount.num_milliseconds(), Ordering::Release);
    }
}

impl Default for MockClock {
    fn default() -> Self { Self::new() }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        let ms = self.offset_ms.load(Ordering::Acquire);
        Utc.timestamp_millis_opt(ms).single().unwrap_or_else(Utc::now)
    }
}
