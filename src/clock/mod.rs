use chrono::{DateTime, Utc};
use std::sync::Arc;

mod mock;
pub use self::mock::MockClock;

/// A source of wall-clock time.
///
/// Timestamps handed to the sink and flush deadlines are both derived from the clock, so swapping
/// in a [`MockClock`] makes the whole flush lifecycle deterministic.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// The system wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> SystemClock { SystemClock }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> { Utc::now() }
}
