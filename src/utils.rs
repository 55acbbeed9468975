use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// National holidays observed every year, as (month, day)
const HOLIDAYS: [(u32, u32); 8] = [
    (1, 1),   // new year
    (1, 26),  // republic day
    (1, 30),  // gandhi memorial day
    (4, 14),  // regional new year
    (5, 1),   // may day
    (8, 15),  // independence day
    (10, 2),  // gandhi jayanti
    (12, 25), // christmas
];

/// Market calendar utilities for handling weekends and holidays
pub struct MarketCalendar;

impl MarketCalendar {
    /// Whether no trading happens on the given date
    pub fn is_holiday(date: NaiveDate) -> bool {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return true;
        }

        HOLIDAYS
            .iter()
            .any(|&(month, day)| date.month() == month && date.day() == day)
    }

    pub fn is_trading_day(date: NaiveDate) -> bool {
        !Self::is_holiday(date)
    }

    /// Every calendar day in `[start, end]`, in increasing order
    pub fn days(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
        start.iter_days().take_while(move |d| *d <= end)
    }
}

/// The day after `date`, saturating at the end of the calendar
pub fn next_day(date: NaiveDate) -> NaiveDate {
    date.checked_add_signed(Duration::days(1)).unwrap_or(date)
}
