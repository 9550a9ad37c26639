//! Source of the calendar day that formulas see as `today`/`currentYear`.

use chrono::{Datelike, Local, NaiveDate};

/// Supplies the current calendar day.
///
/// Formulas only observe the day, so two evaluations on the same day with
/// the same inputs always agree.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;

    fn current_year(&self) -> i32 {
        self.today().year()
    }

    /// Midnight UTC of `today()`, in epoch milliseconds.
    fn today_millis(&self) -> f64 {
        self.today()
            .and_hms_opt(0, 0, 0)
            .map_or(f64::NAN, |dt| dt.and_utc().timestamp_millis() as f64)
    }
}

/// The local system date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl FixedClock {
    pub fn ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_reports_its_day() {
        let clock = FixedClock::ymd(2024, 3, 15).unwrap();
        assert_eq!(clock.current_year(), 2024);
        assert_eq!(clock.today_millis(), 1_710_460_800_000.0);
    }
}
