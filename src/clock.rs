//! The source of "now" for everything that depends on the calendar.
//!
//! All calendar reasoning (today/yesterday labels, the current month partition, day divisors)
//! happens in Asia/Jakarta time, which has a fixed offset of UTC+7 and no daylight saving.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};
use std::fmt::Debug;

const JAKARTA_OFFSET_SECONDS: i32 = 7 * 60 * 60;

/// The Asia/Jakarta offset.
pub fn jakarta() -> FixedOffset {
    FixedOffset::east_opt(JAKARTA_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix())
}

/// Provides the current time in Asia/Jakarta.
pub trait Clock: Debug + Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    /// The Jakarta calendar date of `now`.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Reads the system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&jakarta())
    }
}

/// Always returns the same instant. Used by tests and by the in-memory sheet in testing mode so
/// that "today" lines up with the seed data.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<FixedOffset>);

impl FixedClock {
    /// Create a clock pinned to `local`, interpreted as Jakarta wall-clock time.
    pub fn new(local: NaiveDateTime) -> Self {
        let offset = jakarta();
        let utc = local - Duration::seconds(i64::from(offset.local_minus_utc()));
        Self(DateTime::from_naive_utc_and_offset(utc, offset))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
