// src/cli.rs
use chrono::{NaiveDate, Weekday};
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

use crate::calendar::DateRange;
use crate::config::{parse_weekdays, ConfigError, DEFAULT_DATA_FILE};

/// Value of `--exclusion` meaning "use `skipdays` from the data file".
pub const EXCLUSION_FROM_FILE: &str = "file";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "absence-filler",
    version,
    about = "Fill in daily work in Absence.io",
    long_about = "Fill in daily work in Absence.io. Without a range flag the whole week \
before today is filled.\n\n\
Days of the week can be excluded with --exclusion, which takes precedence over \
`skipdays` in the data file.\n\n\
Data file keys:\n  \
id: id from absence.io\n  \
key: key from absence.io\n  \
starthour: start hour, 'HH:MM'\n  \
endhour: end hour, 'HH:MM'\n  \
typeofwork: work\n  \
skipdays: days to exclude, e.g. [Monday, Wednesday]\n  \
bankholidays: dates to skip, e.g. ['01.01.2024']"
)]
#[command(group(ArgGroup::new("range").args(["day", "week", "year"])))]
pub struct Cli {
    /// Fill the week before this day (YYYY-MM-DD)
    #[arg(short, long, value_name = "YYYY-MM-DD")]
    pub day: Option<NaiveDate>,

    /// Fill the whole previous week. Meant to run from cron
    #[arg(short, long)]
    pub week: bool,

    /// Fill from this day to the end of its year, never past today. Use with caution
    #[arg(short, long, value_name = "YYYY-MM-DD")]
    pub year: Option<NaiveDate>,

    /// Weekdays not to fill, e.g. "Monday Friday"
    #[arg(short, long, default_value = EXCLUSION_FROM_FILE)]
    pub exclusion: String,

    /// Data file with credentials and defaults
    #[arg(short, long, default_value = DEFAULT_DATA_FILE)]
    pub config: PathBuf,

    /// Write a CSV report of every processed date
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn date_range(&self, today: NaiveDate) -> DateRange {
        match (self.day, self.year) {
            (_, Some(start)) => DateRange::YearFrom(start),
            (Some(day), None) => DateRange::PreviousWeekOf(day),
            // --week and no flag at all behave the same
            (None, None) => DateRange::PreviousWeekOf(today),
        }
    }

    /// `None` when the data file's `skipdays` should be used.
    pub fn excluded_weekdays(&self) -> Result<Option<Vec<Weekday>>, ConfigError> {
        let tokens: Vec<&str> = self.exclusion.split_whitespace().collect();
        if tokens
            .iter()
            .any(|t| t.eq_ignore_ascii_case(EXCLUSION_FROM_FILE))
        {
            return Ok(None);
        }
        parse_weekdays(tokens).map(Some)
    }
}
