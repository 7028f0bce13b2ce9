use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Format used for times inside day records and reports.
pub const TIME_OF_DAY_FORMAT: &str = "%H:%M";

/// Anchors `time` to `date` and drops everything below a minute. Only the time of day of `time`
/// survives.
pub fn normalize_time(date: NaiveDate, time: NaiveDateTime) -> NaiveDateTime {
    NaiveDateTime::new(date, truncate_to_minute(time.time()))
}

pub fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0)
        .expect("Hour and minute of a valid time are always valid")
}

/// Last representable minute of the day.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    NaiveDateTime::new(
        date,
        NaiveTime::from_hms_opt(23, 59, 0).expect("23:59 is a valid time"),
    )
}

pub fn parse_time_of_day(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), TIME_OF_DAY_FORMAT)
        .with_context(|| format!("Can't parse {value:?} as HH:MM"))
}

pub fn format_time_of_day(time: NaiveDateTime) -> String {
    time.format(TIME_OF_DAY_FORMAT).to_string()
}

/// Renders a duration as `H:MM`. Hours are not wrapped into days.
pub fn format_hours_minutes(duration: Duration) -> String {
    let minutes = duration.num_minutes();
    format!("{}:{:02}", minutes / 60, minutes % 60)
}

/// Path components of a day record, relative to the records directory: `YYYY/M/D`.
pub fn date_to_record_parts(date: NaiveDate) -> [String; 3] {
    [
        date.year().to_string(),
        date.month().to_string(),
        date.day().to_string(),
    ]
}
