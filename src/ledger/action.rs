use std::{fmt::Display, str::FromStr, sync::Arc};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::utils::time::{normalize_time, TIME_OF_DAY_FORMAT};

use super::error::LedgerError;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Direction {
    In,
    Out,
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::In => write!(f, "IN"),
            Direction::Out => write!(f, "OUT"),
        }
    }
}

impl FromStr for Direction {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("in") {
            Ok(Direction::In)
        } else if s.eq_ignore_ascii_case("out") {
            Ok(Direction::Out)
        } else {
            Err(LedgerError::InvalidDirection(s.to_string()))
        }
    }
}

/// One clock event. Actions are only ever created for a specific day, so `time` always carries
/// the date of the ledger that owns it and has no seconds.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Action {
    time: NaiveDateTime,
    task: Arc<str>,
    direction: Direction,
}

impl Action {
    pub fn new(date: NaiveDate, time: NaiveDateTime, task: Arc<str>, direction: Direction) -> Self {
        Self {
            time: normalize_time(date, time),
            task,
            direction,
        }
    }

    pub fn time(&self) -> NaiveDateTime {
        self.time
    }

    pub fn task(&self) -> &Arc<str> {
        &self.task
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_open(&self) -> bool {
        self.direction == Direction::In
    }

    /// Parses one `HH:MM,task,DIRECTION` line of a day record.
    pub fn parse_record(date: NaiveDate, line: &str) -> Result<Self, LedgerError> {
        let malformed = || LedgerError::MalformedRecord {
            line: line.to_string(),
        };
        let record = line.trim_end_matches(['\r', '\n']);

        let mut fields = record.split(',');
        let (Some(time), Some(task), Some(direction), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(malformed());
        };

        let time = NaiveTime::parse_from_str(time.trim(), TIME_OF_DAY_FORMAT)
            .map_err(|_| malformed())?;
        let direction = direction
            .trim()
            .parse::<Direction>()
            .map_err(|_| malformed())?;
        if task.is_empty() {
            return Err(malformed());
        }

        Ok(Self::new(
            date,
            NaiveDateTime::new(date, time),
            task.into(),
            direction,
        ))
    }

    /// Serializes into a record line, without the trailing newline.
    pub fn to_record(&self) -> String {
        format!(
            "{},{},{}",
            self.time.format(TIME_OF_DAY_FORMAT),
            self.task,
            self.direction
        )
    }
}

/// Task names end up inside comma separated lines, so some characters can never be stored.
pub fn check_task_name(task: &str) -> Result<(), LedgerError> {
    if task.is_empty() || task.contains([',', '\n', '\r']) {
        Err(LedgerError::InvalidTaskName(task.to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, 7, 4).unwrap()
    }

    #[test]
    fn test_direction_parsing_ignores_case() {
        assert_eq!("IN".parse::<Direction>().unwrap(), Direction::In);
        assert_eq!("in".parse::<Direction>().unwrap(), Direction::In);
        assert_eq!("Out".parse::<Direction>().unwrap(), Direction::Out);
        assert!(matches!(
            "sideways".parse::<Direction>(),
            Err(LedgerError::InvalidDirection(v)) if v == "sideways"
        ));
    }

    #[test]
    fn test_new_normalizes_onto_day() {
        let elsewhere = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(9, 15, 42)
            .unwrap();
        let action = Action::new(day(), elsewhere, "work".into(), Direction::In);
        assert_eq!(action.time(), day().and_hms_opt(9, 15, 0).unwrap());
    }

    #[test]
    fn test_parse_record() {
        let action = Action::parse_record(day(), "13:45,email,OUT\n").unwrap();
        assert_eq!(action.time(), day().and_hms_opt(13, 45, 0).unwrap());
        assert_eq!(&**action.task(), "email");
        assert_eq!(action.direction(), Direction::Out);
        assert_eq!(action.to_record(), "13:45,email,OUT");
    }

    #[test]
    fn test_parse_record_keeps_task_spaces() {
        let action = Action::parse_record(day(), "08:00,code review,in").unwrap();
        assert_eq!(&**action.task(), "code review");
        assert_eq!(action.to_record(), "08:00,code review,IN");
    }

    #[test]
    fn test_parse_record_missing_field() {
        let err = Action::parse_record(day(), "9:00,work").unwrap_err();
        assert!(matches!(err, LedgerError::MalformedRecord { line } if line == "9:00,work"));
    }

    #[test]
    fn test_parse_record_rejects_garbage() {
        for line in [
            "",
            "nine,work,IN",
            "09:00,work,IN,extra",
            "09:00,work,MAYBE",
            "09:00,,IN",
            "24:10,work,IN",
        ] {
            assert!(
                matches!(
                    Action::parse_record(day(), line),
                    Err(LedgerError::MalformedRecord { .. })
                ),
                "{line:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_check_task_name() {
        assert!(check_task_name("work").is_ok());
        assert!(check_task_name("deep work").is_ok());
        assert!(check_task_name("").is_err());
        assert!(check_task_name("a,b").is_err());
        assert!(check_task_name("a\nb").is_err());
    }
}
