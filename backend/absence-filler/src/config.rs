// src/config.rs
use chrono::{NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::hawk::HawkCredentials;

pub const ABSENCE_URL: &str = "https://app.absence.io";
pub const DEFAULT_DATA_FILE: &str = "data.yml";
pub const DEFAULT_START_HOUR: &str = "08:00";
pub const DEFAULT_END_HOUR: &str = "16:00";
pub const DEFAULT_TIMEZONE_NAME: &str = "CET";
pub const DEFAULT_TIMEZONE: &str = "+0000";
pub const ENV_PREFIX: &str = "ABSENCE_";
const BANK_HOLIDAY_FORMAT: &str = "%d.%m.%Y";

static HOUR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").expect("static hour regex"));

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid ABSENCE_* environment variable")]
    Env(#[from] envy::Error),

    #[error("Missing required setting: {0}")]
    MissingField(&'static str),

    #[error("Invalid {field} '{value}', expected HH:MM")]
    InvalidHour { field: &'static str, value: String },

    #[error("Start hour {start} must be before end hour {end}")]
    HourOrder { start: String, end: String },

    #[error("Unknown weekday '{0}'")]
    InvalidWeekday(String),

    #[error("Invalid bank holiday '{value}', expected dd.mm.yyyy")]
    InvalidBankHoliday {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Invalid base URL")]
    InvalidBaseUrl(#[from] url::ParseError),
}

/// Kind of timespan written to Absence.io.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimespanType {
    #[default]
    Work,
    Break,
}

/// `data.yml` exactly as it is written on disk.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataFile {
    pub id: Option<String>,
    pub key: Option<String>,
    pub starthour: Option<String>,
    pub endhour: Option<String>,
    pub typeofwork: Option<TimespanType>,
    pub skipdays: Option<Vec<String>>,
    pub bankholidays: Option<Vec<String>>,
    pub timezonename: Option<String>,
    pub timezone: Option<String>,
}

impl DataFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw, path)
    }

    pub fn parse(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_yaml::from_str(raw).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// `ABSENCE_ID`, `ABSENCE_KEY` and `ABSENCE_BASE_URL`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvOverrides {
    pub id: Option<String>,
    pub key: Option<String>,
    pub base_url: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(envy::prefixed(ENV_PREFIX).from_env::<EnvOverrides>()?)
    }
}

/// Values sent with every created timespan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkEntryTemplate {
    pub start_hour: String,
    pub end_hour: String,
    pub timespan_type: TimespanType,
    pub timezone_name: String,
    pub timezone: String,
}

#[derive(Debug, Clone)]
pub struct FillerConfig {
    pub credentials: HawkCredentials,
    pub base_url: Url,
    pub entry: WorkEntryTemplate,
    pub skip_days: Vec<Weekday>,
    pub bank_holidays: Vec<NaiveDate>,
}

impl FillerConfig {
    /// Reads `path` and applies the `ABSENCE_*` environment on top of it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading configuration from {:?}", path);
        let file = DataFile::load(path)?;
        let env = EnvOverrides::from_env()?;
        Self::resolve(file, env)
    }

    pub fn resolve(file: DataFile, env: EnvOverrides) -> Result<Self, ConfigError> {
        let id = non_empty(env.id.or(file.id)).ok_or(ConfigError::MissingField("id"))?;
        let key = non_empty(env.key.or(file.key)).ok_or(ConfigError::MissingField("key"))?;
        let base_url = Url::parse(env.base_url.as_deref().unwrap_or(ABSENCE_URL))?;

        let start_hour = validate_hour(
            "starthour",
            file.starthour.as_deref().unwrap_or(DEFAULT_START_HOUR),
        )?;
        let end_hour = validate_hour("endhour", file.endhour.as_deref().unwrap_or(DEFAULT_END_HOUR))?;
        // Zero padded HH:MM compares correctly as text
        if start_hour >= end_hour {
            return Err(ConfigError::HourOrder {
                start: start_hour,
                end: end_hour,
            });
        }

        let skip_days = parse_weekdays(file.skipdays.unwrap_or_default().iter().map(String::as_str))?;
        let bank_holidays = file
            .bankholidays
            .unwrap_or_default()
            .iter()
            .map(|s| parse_bank_holiday(s))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "Resolved config: id={}, base_url={}, {} skip days, {} bank holidays",
            id,
            base_url,
            skip_days.len(),
            bank_holidays.len()
        );

        Ok(Self {
            credentials: HawkCredentials { id, key },
            base_url,
            entry: WorkEntryTemplate {
                start_hour,
                end_hour,
                timespan_type: file.typeofwork.unwrap_or_default(),
                timezone_name: file
                    .timezonename
                    .unwrap_or_else(|| DEFAULT_TIMEZONE_NAME.to_string()),
                timezone: file.timezone.unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
            },
            skip_days,
            bank_holidays,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_hour(field: &'static str, value: &str) -> Result<String, ConfigError> {
    let value = value.trim();
    if HOUR_RE.is_match(value) {
        Ok(value.to_string())
    } else {
        Err(ConfigError::InvalidHour {
            field,
            value: value.to_string(),
        })
    }
}

/// Accepts full or short English weekday names in any case.
pub fn parse_weekdays<'a>(
    names: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<Weekday>, ConfigError> {
    names
        .into_iter()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| {
            n.parse::<Weekday>()
                .map_err(|_| ConfigError::InvalidWeekday(n.to_string()))
        })
        .collect()
}

pub fn parse_bank_holiday(value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), BANK_HOLIDAY_FORMAT).map_err(|source| {
        ConfigError::InvalidBankHoliday {
            value: value.to_string(),
            source,
        }
    })
}
