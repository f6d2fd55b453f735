// src/calendar_tests.rs

#[cfg(test)]
mod tests {
    use crate::calendar::*;
    use chrono::{Datelike, NaiveDate, Weekday};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn dates(list: &[&str]) -> Vec<NaiveDate> {
        list.iter().map(|s| date(s)).collect()
    }

    #[test]
    fn test_previous_week_from_midweek() {
        // Wednesday 2024-05-15
        assert_eq!(
            previous_week(date("2024-05-15")),
            dates(&["2024-05-06", "2024-05-07", "2024-05-08", "2024-05-09", "2024-05-10"])
        );
    }

    #[test]
    fn test_previous_week_from_monday_and_sunday() {
        let expected = dates(&["2024-05-06", "2024-05-07", "2024-05-08", "2024-05-09", "2024-05-10"]);
        assert_eq!(previous_week(date("2024-05-13")), expected);
        assert_eq!(previous_week(date("2024-05-19")), expected);
    }

    #[test]
    fn test_previous_week_across_year_boundary() {
        // Thursday 2025-01-02 -> week of Monday 2024-12-23
        assert_eq!(
            previous_week(date("2025-01-02")),
            dates(&["2024-12-23", "2024-12-24", "2024-12-25", "2024-12-26", "2024-12-27"])
        );
    }

    #[test]
    fn test_business_days_skip_weekends() {
        let days = business_days(date("2024-05-03"), date("2024-05-07"));
        assert_eq!(days, dates(&["2024-05-03", "2024-05-06", "2024-05-07"]));
        assert!(days.iter().all(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun)));
    }

    #[test]
    fn test_business_days_empty_when_reversed() {
        assert!(business_days(date("2024-05-07"), date("2024-05-03")).is_empty());
        assert!(business_days(date("2024-05-04"), date("2024-05-05")).is_empty());
    }

    #[test]
    fn test_year_span_capped_at_today() {
        let days = year_span(date("2024-05-01"), date("2024-05-08"));
        assert_eq!(
            days,
            dates(&[
                "2024-05-01",
                "2024-05-02",
                "2024-05-03",
                "2024-05-06",
                "2024-05-07",
                "2024-05-08"
            ])
        );
    }

    #[test]
    fn test_year_span_of_past_year_runs_to_december() {
        let days = year_span(date("2023-12-20"), date("2024-05-08"));
        assert_eq!(days.first(), Some(&date("2023-12-20")));
        assert_eq!(days.last(), Some(&date("2023-12-29")));
        assert_eq!(days.len(), 8);
    }

    #[test]
    fn test_year_span_future_start_clamps_to_today() {
        assert_eq!(
            year_span(date("2024-09-01"), date("2024-05-08")),
            dates(&["2024-05-08"])
        );
        // Saturday today and a future start: nothing to fill
        assert!(year_span(date("2024-09-01"), date("2024-05-11")).is_empty());
    }

    #[test]
    fn test_date_range_dispatch() {
        let today = date("2024-05-15");
        assert_eq!(
            DateRange::PreviousWeekOf(today).dates(today),
            previous_week(today)
        );
        assert_eq!(
            DateRange::YearFrom(date("2024-05-13")).dates(today),
            dates(&["2024-05-13", "2024-05-14", "2024-05-15"])
        );
    }

    #[test]
    fn test_day_filter_classification() {
        let filter = DayFilter::new([Weekday::Fri], [date("2024-05-09"), date("2024-05-10")]);

        assert_eq!(filter.classify(date("2024-05-08")), DayClass::Fill);
        assert_eq!(filter.classify(date("2024-05-09")), DayClass::BankHoliday);
        // Friday that is also a bank holiday
        assert_eq!(filter.classify(date("2024-05-10")), DayClass::BankHoliday);
        assert_eq!(filter.classify(date("2024-05-17")), DayClass::ExcludedWeekday);
    }

    #[test]
    fn test_default_filter_fills_everything() {
        let filter = DayFilter::default();
        assert!(previous_week(date("2024-05-15"))
            .into_iter()
            .all(|d| filter.classify(d) == DayClass::Fill));
    }
}
