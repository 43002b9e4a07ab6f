//! Calendar-field timestamp parsing for uploaded rows and balance cutoffs.
//!
//! Upload rows carry `UTC_Time` as `DD-MM-YYYY HH:MM`. Despite the column
//! name, the fields are interpreted in the local time zone of the running
//! process unless [`TimeZoneMode::Utc`] is selected. Existing stores were
//! filled with local-time semantics, so `Local` stays the default.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::QueryError;

/// How calendar fields without an offset are mapped onto an instant.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimeZoneMode {
    /// Local time zone of the process.
    #[default]
    Local,
    /// Treat the fields as UTC.
    Utc,
}

impl TimeZoneMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeZoneMode::Local => "local",
            TimeZoneMode::Utc => "utc",
        }
    }

    /// Maps a naive date-time onto an instant.
    ///
    /// In local mode a time that falls into a DST overlap resolves to the
    /// earlier instant; a time inside a DST gap does not exist and is an error.
    pub fn resolve(&self, naive: NaiveDateTime) -> Result<DateTime<Utc>, String> {
        match self {
            TimeZoneMode::Utc => Ok(Utc.from_utc_datetime(&naive)),
            TimeZoneMode::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or_else(|| format!("{} does not exist in the local time zone", naive)),
        }
    }
}

impl FromStr for TimeZoneMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(TimeZoneMode::Local),
            "utc" => Ok(TimeZoneMode::Utc),
            other => Err(format!("unknown time zone mode {:?} (expected local or utc)", other)),
        }
    }
}

impl std::fmt::Display for TimeZoneMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parses `DD-MM-YYYY HH:MM` into its calendar fields.
pub fn parse_trade_fields(input: &str) -> Result<NaiveDateTime, String> {
    let (date_part, time_part) = input
        .trim()
        .split_once(' ')
        .ok_or_else(|| format!("expected \"DD-MM-YYYY HH:MM\", got {:?}", input))?;

    let date: Vec<&str> = date_part.split('-').collect();
    let time: Vec<&str> = time_part.split(':').collect();
    if date.len() != 3 || time.len() != 2 {
        return Err(format!("expected \"DD-MM-YYYY HH:MM\", got {:?}", input));
    }

    let day: u32 = component(date[0], "day")?;
    let month: u32 = component(date[1], "month")?;
    let year: i32 = component(date[2], "year")?;
    let hours: u32 = component(time[0], "hour")?;
    let minutes: u32 = component(time[1], "minute")?;

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hours, minutes, 0))
        .ok_or_else(|| format!("{:?} is not a valid calendar date-time", input))
}

fn component<T: FromStr>(raw: &str, name: &str) -> Result<T, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("{} {:?} is not an integer", name, raw))
}

/// Parses an upload row's `UTC_Time` value into an instant.
pub fn parse_trade_time(input: &str, mode: TimeZoneMode) -> Result<DateTime<Utc>, String> {
    let naive = parse_trade_fields(input)?;
    let timestamp = mode.resolve(naive)?;
    tracing::debug!("parsed {:?} as {} ({} mode)", input, timestamp, mode);
    Ok(timestamp)
}

const ISO_NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses the exclusive upper bound of a balance query.
///
/// Accepted, in order: the upload format `DD-MM-YYYY HH:MM`, RFC 3339 with
/// an offset, an ISO date-time without offset (resolved with `mode`), and a
/// bare ISO date (midnight UTC).
pub fn parse_cutoff(input: Option<&str>, mode: TimeZoneMode) -> Result<DateTime<Utc>, QueryError> {
    let raw = match input.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => return Err(QueryError::invalid("cutoff timestamp is missing")),
    };

    if let Ok(naive) = parse_trade_fields(raw) {
        return mode.resolve(naive).map_err(QueryError::InvalidQuery);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ISO_NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return mode.resolve(naive).map_err(QueryError::InvalidQuery);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN)));
    }

    Err(QueryError::invalid(format!("cannot parse cutoff timestamp {:?}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_fields_are_day_month_year() {
        assert_eq!(parse_trade_fields("26-09-2022 10:05").unwrap(), naive(2022, 9, 26, 10, 5));
        assert_eq!(parse_trade_fields("01-02-2023 00:00").unwrap(), naive(2023, 2, 1, 0, 0));
        assert_eq!(parse_trade_fields(" 1-2-2023 7:3 ").unwrap(), naive(2023, 2, 1, 7, 3));
    }

    #[test]
    fn test_invalid_fields_rejected() {
        for input in [
            "",
            "26-09-2022",
            "26/09/2022 10:00",
            "26-09-2022 10:00:30",
            "26-13-2022 10:00",
            "31-02-2022 10:00",
            "26-09-2022 24:00",
            "26-09-2022 10:60",
            "aa-09-2022 10:00",
            "2022-09-26 10:00",
        ] {
            assert!(parse_trade_fields(input).is_err(), "accepted {:?}", input);
        }
    }

    #[test]
    fn test_local_mode_matches_local_construction() {
        let expected = Local
            .with_ymd_and_hms(2022, 9, 26, 11, 21, 0)
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(parse_trade_time("26-09-2022 11:21", TimeZoneMode::Local).unwrap(), expected);
    }

    #[test]
    fn test_utc_mode_is_opt_in() {
        assert_eq!(TimeZoneMode::default(), TimeZoneMode::Local);
        let expected = Utc.with_ymd_and_hms(2022, 9, 26, 11, 21, 0).unwrap();
        assert_eq!(parse_trade_time("26-09-2022 11:21", TimeZoneMode::Utc).unwrap(), expected);
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("UTC".parse::<TimeZoneMode>(), Ok(TimeZoneMode::Utc));
        assert_eq!("local".parse::<TimeZoneMode>(), Ok(TimeZoneMode::Local));
        assert!("gmt".parse::<TimeZoneMode>().is_err());
    }

    #[test]
    fn test_cutoff_formats() {
        let mode = TimeZoneMode::Utc;
        let noon = Utc.with_ymd_and_hms(2022, 9, 26, 12, 0, 0).unwrap();
        assert_eq!(parse_cutoff(Some("26-09-2022 12:00"), mode).unwrap(), noon);
        assert_eq!(parse_cutoff(Some("2022-09-26T12:00:00Z"), mode).unwrap(), noon);
        assert_eq!(parse_cutoff(Some("2022-09-26T14:00:00+02:00"), mode).unwrap(), noon);
        assert_eq!(parse_cutoff(Some("2022-09-26T12:00"), mode).unwrap(), noon);
        assert_eq!(parse_cutoff(Some("2022-09-26 12:00:00"), mode).unwrap(), noon);
        assert_eq!(
            parse_cutoff(Some("2022-09-26"), TimeZoneMode::Local).unwrap(),
            Utc.with_ymd_and_hms(2022, 9, 26, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_cutoff_missing_or_garbage() {
        for input in [None, Some(""), Some("   "), Some("yesterday"), Some("26-09-2022 25:00")] {
            let err = parse_cutoff(input, TimeZoneMode::Utc).unwrap_err();
            assert!(matches!(err, QueryError::InvalidQuery(_)), "{:?}", input);
        }
    }
}
