use std::{collections::HashMap, sync::Arc};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::utils::time::{end_of_day, normalize_time};

use super::{
    action::{Action, Direction},
    error::LedgerError,
    validator::validate,
};

/// One stretch of work between a clock-in and the matching clock-out.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize)]
pub struct Interval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Interval {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Serialize)]
pub struct TaskUsage {
    pub task: Arc<str>,
    #[serde(rename = "minutes", with = "minutes_ser")]
    pub duration: Duration,
    pub intervals: Vec<Interval>,
}

/// Where the time of a day went. Derived from a ledger on demand and never stored.
#[derive(PartialEq, Eq, Debug, Clone, Serialize)]
pub struct DayAggregation {
    pub date: NaiveDate,
    #[serde(rename = "total_minutes", with = "minutes_ser")]
    pub total: Duration,
    /// Tasks in the order they were first clocked into.
    pub tasks: Vec<TaskUsage>,
    /// Task that is still running. Its last interval ends at a virtual clock-out.
    pub open_task: Option<Arc<str>>,
}

impl DayAggregation {
    pub fn task(&self, task: &str) -> Option<&TaskUsage> {
        self.tasks.iter().find(|v| &*v.task == task)
    }
}

/// Reduces a day's actions into totals. Invalid histories are rejected rather than guessed at.
///
/// A task that is still open gets a virtual clock-out at `now` (or at the end of the day when
/// looking at a past day). The virtual action only lives inside the returned aggregation.
pub fn aggregate(
    date: NaiveDate,
    actions: &[Action],
    now: NaiveDateTime,
) -> Result<DayAggregation, LedgerError> {
    validate(actions)?;

    let virtual_close = actions.last().filter(|v| v.is_open()).map(|open| {
        let close = if now.date() > date {
            end_of_day(date)
        } else {
            normalize_time(date, now)
        };
        Action::new(
            date,
            close.max(open.time()),
            open.task().clone(),
            Direction::Out,
        )
    });

    let sequence = actions
        .iter()
        .chain(virtual_close.iter())
        .collect::<Vec<_>>();

    let mut total = Duration::zero();
    let mut tasks = Vec::<TaskUsage>::new();
    let mut positions = HashMap::<Arc<str>, usize>::new();

    for pair in sequence.chunks_exact(2) {
        let (start, end) = (pair[0], pair[1]);
        let interval = Interval {
            start: start.time(),
            end: end.time(),
        };
        total += interval.duration();

        let position = *positions.entry(start.task().clone()).or_insert_with(|| {
            tasks.push(TaskUsage {
                task: start.task().clone(),
                duration: Duration::zero(),
                intervals: vec![],
            });
            tasks.len() - 1
        });
        let usage = &mut tasks[position];
        usage.duration += interval.duration();
        usage.intervals.push(interval);
    }

    Ok(DayAggregation {
        date,
        total,
        tasks,
        open_task: virtual_close.map(|v| v.task().clone()),
    })
}

mod minutes_ser {
    use chrono::Duration;
    use serde::Serializer;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(duration.num_minutes())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    use crate::ledger::{
        action::{Action, Direction},
        error::LedgerError,
    };

    use super::{aggregate, Interval};

    const TEST_DATE: NaiveDate = NaiveDate::from_ymd_opt(2018, 7, 4).unwrap();

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        TEST_DATE.and_hms_opt(hour, minute, 0).unwrap()
    }

    fn action(hour: u32, minute: u32, task: &str, direction: Direction) -> Action {
        Action::new(TEST_DATE, at(hour, minute), task.into(), direction)
    }

    fn closed_day() -> Vec<Action> {
        vec![
            action(9, 0, "work", Direction::In),
            action(12, 0, "work", Direction::Out),
            action(13, 0, "email", Direction::In),
            action(13, 30, "email", Direction::Out),
        ]
    }

    #[test]
    fn test_aggregate_closed_day() {
        let result = aggregate(TEST_DATE, &closed_day(), at(18, 0)).unwrap();

        assert_eq!(result.total, Duration::minutes(210));
        assert_eq!(result.open_task, None);
        assert_eq!(
            result.tasks.iter().map(|v| &*v.task).collect::<Vec<_>>(),
            vec!["work", "email"]
        );

        let work = result.task("work").unwrap();
        assert_eq!(work.duration, Duration::hours(3));
        assert_eq!(
            work.intervals,
            vec![Interval {
                start: at(9, 0),
                end: at(12, 0)
            }]
        );

        let email = result.task("email").unwrap();
        assert_eq!(email.duration, Duration::minutes(30));
        assert_eq!(
            email.intervals,
            vec![Interval {
                start: at(13, 0),
                end: at(13, 30)
            }]
        );
    }

    #[test]
    fn test_aggregate_open_task_closes_at_now() {
        let mut actions = closed_day();
        actions.push(action(14, 0, "work", Direction::In));
        let before = actions.clone();

        let result = aggregate(TEST_DATE, &actions, at(15, 0)).unwrap();

        assert_eq!(result.total, Duration::minutes(270));
        assert_eq!(result.open_task.as_deref(), Some("work"));
        let work = result.task("work").unwrap();
        assert_eq!(work.duration, Duration::hours(4));
        assert_eq!(work.intervals.last().unwrap().end, at(15, 0));
        assert_eq!(actions, before);
    }

    #[test]
    fn test_aggregate_repeated_task_keeps_first_seen_order() {
        let actions = vec![
            action(8, 0, "email", Direction::In),
            action(8, 15, "email", Direction::Out),
            action(8, 15, "work", Direction::In),
            action(10, 0, "work", Direction::Out),
            action(10, 0, "email", Direction::In),
            action(10, 5, "email", Direction::Out),
        ];
        let result = aggregate(TEST_DATE, &actions, at(18, 0)).unwrap();
        assert_eq!(result.tasks[0].task.as_ref(), "email");
        assert_eq!(result.tasks[0].duration, Duration::minutes(20));
        assert_eq!(result.tasks[0].intervals.len(), 2);
        assert_eq!(result.tasks[1].task.as_ref(), "work");
    }

    #[test]
    fn test_aggregate_past_day_closes_at_end_of_day() {
        let actions = vec![action(22, 0, "work", Direction::In)];
        let next_morning = TEST_DATE.succ_opt().unwrap().and_hms_opt(8, 0, 0).unwrap();

        let result = aggregate(TEST_DATE, &actions, next_morning).unwrap();

        assert_eq!(result.total, Duration::minutes(119));
    }

    #[test]
    fn test_aggregate_virtual_close_never_precedes_open() {
        let actions = vec![action(16, 0, "work", Direction::In)];
        let result = aggregate(TEST_DATE, &actions, at(15, 0)).unwrap();
        assert_eq!(result.total, Duration::zero());
    }

    #[test]
    fn test_aggregate_empty() {
        let result = aggregate(TEST_DATE, &[], at(15, 0)).unwrap();
        assert_eq!(result.total, Duration::zero());
        assert!(result.tasks.is_empty());
    }

    #[test]
    fn test_aggregate_refuses_invalid_history() {
        let actions = vec![
            action(9, 0, "work", Direction::In),
            action(10, 0, "email", Direction::Out),
        ];
        assert!(matches!(
            aggregate(TEST_DATE, &actions, at(15, 0)),
            Err(LedgerError::UnclosedTaskMismatch { .. })
        ));
    }

    #[test]
    fn test_aggregate_json_shape() {
        let result = aggregate(TEST_DATE, &closed_day(), at(18, 0)).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["total_minutes"], 210);
        assert_eq!(json["tasks"][0]["task"], "work");
        assert_eq!(json["tasks"][0]["minutes"], 180);
        assert_eq!(json["tasks"][1]["intervals"][0]["start"], "2018-07-04T13:00:00");
        assert!(json["open_task"].is_null());
    }
}
