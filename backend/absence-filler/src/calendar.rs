// src/calendar.rs
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::HashSet;

// --- Date Ranges ---

/// Returns true for Monday through Friday.
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// All business days between `start` and `end`, both inclusive.
/// Returns an empty list when `start` is after `end`.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| is_business_day(*d))
        .collect()
}

/// Monday to Friday of the week before the one containing `date`.
pub fn previous_week(date: NaiveDate) -> Vec<NaiveDate> {
    let days_since_monday = i64::from(date.weekday().num_days_from_monday());
    let start = date - Duration::days(days_since_monday) - Duration::weeks(1);
    // Saturday; never a business day, kept so the span reads as a full work week
    let end = start + Duration::days(5);
    business_days(start, end)
}

/// Business days from `start` until the end of its year, never past `today`.
pub fn year_span(start: NaiveDate, today: NaiveDate) -> Vec<NaiveDate> {
    // Dec 31 always exists, the fallback is unreachable
    let year_end = NaiveDate::from_ymd_opt(start.year(), 12, 31).unwrap_or(start);
    let start = start.min(today);
    let end = year_end.min(today);
    business_days(start, end)
}

/// Which span of dates a run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRange {
    /// The work week before the week containing the date.
    PreviousWeekOf(NaiveDate),
    /// From the date to the end of its year, capped at today.
    YearFrom(NaiveDate),
}

impl DateRange {
    pub fn dates(&self, today: NaiveDate) -> Vec<NaiveDate> {
        match *self {
            DateRange::PreviousWeekOf(date) => previous_week(date),
            DateRange::YearFrom(start) => year_span(start, today),
        }
    }
}

// --- Filtering ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayClass {
    Fill,
    BankHoliday,
    ExcludedWeekday,
}

#[derive(Debug, Clone, Default)]
pub struct DayFilter {
    pub excluded_weekdays: HashSet<Weekday>,
    pub bank_holidays: HashSet<NaiveDate>,
}

impl DayFilter {
    pub fn new(
        excluded_weekdays: impl IntoIterator<Item = Weekday>,
        bank_holidays: impl IntoIterator<Item = NaiveDate>,
    ) -> Self {
        Self {
            excluded_weekdays: excluded_weekdays.into_iter().collect(),
            bank_holidays: bank_holidays.into_iter().collect(),
        }
    }

    /// Bank holidays win over excluded weekdays.
    pub fn classify(&self, date: NaiveDate) -> DayClass {
        if self.bank_holidays.contains(&date) {
            DayClass::BankHoliday
        } else if self.excluded_weekdays.contains(&date.weekday()) {
            DayClass::ExcludedWeekday
        } else {
            DayClass::Fill
        }
    }
}
