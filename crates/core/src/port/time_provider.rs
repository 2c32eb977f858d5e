// Time Provider Port (for testability)

use chrono::{DateTime, Local, NaiveDate, Utc};

/// Time provider interface (allows mocking in tests)
pub trait TimeProvider: Send + Sync {
    /// Get current time in milliseconds since epoch
    fn now_millis(&self) -> i64;

    /// Current calendar date, time-of-day truncated
    fn today(&self) -> NaiveDate {
        DateTime::<Utc>::from_timestamp_millis(self.now_millis())
            .unwrap_or_default()
            .date_naive()
    }
}

/// System time provider (production)
///
/// `today()` follows the server's local calendar, which is what the spa
/// admins see on their due dates.
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Fixed clock for tests and replays
pub struct FixedTimeProvider {
    now_millis: i64,
    today: NaiveDate,
}

impl FixedTimeProvider {
    pub fn new(now_millis: i64, today: NaiveDate) -> Self {
        Self { now_millis, today }
    }
}

impl TimeProvider for FixedTimeProvider {
    fn now_millis(&self) -> i64 {
        self.now_millis
    }

    fn today(&self) -> NaiveDate {
        self.today
    }
}
