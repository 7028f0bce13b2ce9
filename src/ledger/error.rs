use chrono::NaiveTime;
use thiserror::Error;

use super::action::Direction;

/// Everything that can go wrong while reading or mutating a day.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Error reading line: {line:?}")]
    MalformedRecord { line: String },

    #[error("First action of the day must be IN, found {direction} for {task:?}")]
    InvalidFirstAction { task: String, direction: Direction },

    #[error("Time went backwards from {previous} to {next}")]
    TimeRegression { previous: NaiveTime, next: NaiveTime },

    #[error("{open_task:?} is still open, can't record {direction} for {task:?}")]
    UnclosedTaskMismatch {
        open_task: String,
        task: String,
        direction: Direction,
    },

    #[error("{task:?} closed at {time} without being opened again")]
    DoubleClose { task: String, time: NaiveTime },

    #[error("Cannot clock out when not clocked in")]
    NotClockedIn,

    #[error("Cannot clock out, last action already closed {task:?}")]
    StateMismatch { task: String },

    #[error("Direction must be either IN or OUT, got {0:?}")]
    InvalidDirection(String),

    #[error("Task name {0:?} can't be stored, it must be non-empty without commas or line breaks")]
    InvalidTaskName(String),

    #[error("Storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}
