use chrono::{Local, NaiveDateTime};

/// Represents an entity responsible for providing the current wall-clock time across the
/// application. This allows "now" to be fixed during testing.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Sync + Send + 'static {
    /// Local wall-clock time. Timezones are not tracked, a day is whatever the local clock says.
    fn now(&self) -> NaiveDateTime;
}

pub struct DefaultClock;

impl Clock for DefaultClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock that always returns the same moment.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
