use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, info, instrument, warn};

use crate::{
    storage::record_storage::LedgerStorage,
    utils::{clock::Clock, time::normalize_time},
};

use super::{
    action::{check_task_name, Action, Direction},
    aggregator::{aggregate, DayAggregation},
    error::LedgerError,
    validator::validate,
};

/// Task used when clocking in without naming one.
pub const DEFAULT_TASK: &str = "work";

/// Decides whether a freshly loaded record is trusted as is.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default)]
pub enum LoadPolicy {
    /// Records were validated before they were saved.
    #[default]
    Trusted,
    /// Validate on load as well. Rejects records written under older, looser rules.
    Validated,
}

/// Every action of one calendar day, in the order they happened. All mutations go through
/// [DayLedger::clock_in] and [DayLedger::clock_out], which validate and persist the new history
/// before it becomes visible.
pub struct DayLedger<S: LedgerStorage> {
    date: NaiveDate,
    actions: Vec<Action>,
    storage: S,
    clock: Box<dyn Clock>,
}

impl<S: LedgerStorage> DayLedger<S> {
    pub async fn load(
        storage: S,
        date: NaiveDate,
        clock: Box<dyn Clock>,
    ) -> Result<Self, LedgerError> {
        Self::load_with_policy(storage, date, clock, LoadPolicy::Trusted).await
    }

    #[instrument(skip(storage, clock))]
    pub async fn load_with_policy(
        storage: S,
        date: NaiveDate,
        clock: Box<dyn Clock>,
        policy: LoadPolicy,
    ) -> Result<Self, LedgerError> {
        let lines = storage.read_lines(date).await?;
        let actions = lines
            .iter()
            .map(|v| Action::parse_record(date, v))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Loaded {} actions", actions.len());

        let ledger = Self {
            date,
            actions,
            storage,
            clock,
        };
        if policy == LoadPolicy::Validated {
            ledger.validate()?;
        }
        Ok(ledger)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Task that is currently being worked on.
    pub fn open_task(&self) -> Option<&str> {
        self.actions
            .last()
            .filter(|v| v.is_open())
            .map(|v| &**v.task())
    }

    /// Explicit times are taken as a time of this day, otherwise it's now.
    fn resolve_time(&self, time: Option<NaiveTime>) -> NaiveDateTime {
        let time = match time {
            Some(time) => NaiveDateTime::new(self.date, time),
            None => self.clock.now(),
        };
        normalize_time(self.date, time)
    }

    /// Starts working on `task`. A task that is still open is closed at the same moment.
    pub async fn clock_in(
        &mut self,
        task: &str,
        time: Option<NaiveTime>,
    ) -> Result<(), LedgerError> {
        check_task_name(task)?;
        let time = self.resolve_time(time);

        let mut candidate = self.actions.clone();
        let implicit_close = candidate
            .last()
            .filter(|v| v.is_open())
            .map(|open| Action::new(self.date, time, open.task().clone(), Direction::Out));
        if let Some(close) = implicit_close {
            debug!("Closing {} before switching to {task}", close.task());
            candidate.push(close);
        }
        candidate.push(Action::new(self.date, time, task.into(), Direction::In));

        self.commit(candidate).await?;
        info!("Clocked into {task} at {}", time.time());
        Ok(())
    }

    /// Stops the open task. `task` is only informational, whatever is open gets closed.
    pub async fn clock_out(
        &mut self,
        task: Option<&str>,
        time: Option<NaiveTime>,
    ) -> Result<(), LedgerError> {
        let Some(last) = self.actions.last() else {
            return Err(LedgerError::NotClockedIn);
        };
        if last.direction() != Direction::In {
            return Err(LedgerError::StateMismatch {
                task: last.task().to_string(),
            });
        }
        let open_task = last.task().clone();
        if let Some(task) = task.filter(|v| *v != &*open_task) {
            warn!("Asked to clock out of {task} but {open_task} is open, closing {open_task}");
        }

        let time = self.resolve_time(time);
        let mut candidate = self.actions.clone();
        candidate.push(Action::new(self.date, time, open_task.clone(), Direction::Out));

        self.commit(candidate).await?;
        info!("Clocked out of {open_task} at {}", time.time());
        Ok(())
    }

    /// Clocks in or out depending on `direction`, `IN` or `OUT` in any case.
    pub async fn clock(
        &mut self,
        direction: &str,
        task: Option<&str>,
        time: Option<NaiveTime>,
    ) -> Result<(), LedgerError> {
        match direction.parse::<Direction>()? {
            Direction::In => self.clock_in(task.unwrap_or(DEFAULT_TASK), time).await,
            Direction::Out => self.clock_out(task, time).await,
        }
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        validate(&self.actions)
    }

    /// Persists the whole day, replacing whatever was stored before.
    pub async fn save(&self) -> Result<(), LedgerError> {
        Self::write(&self.storage, self.date, &self.actions).await
    }

    pub fn aggregate(&self) -> Result<DayAggregation, LedgerError> {
        aggregate(self.date, &self.actions, self.clock.now())
    }

    /// The candidate history only replaces the current one once it's valid and on disk.
    async fn commit(&mut self, candidate: Vec<Action>) -> Result<(), LedgerError> {
        validate(&candidate)?;
        Self::write(&self.storage, self.date, &candidate).await?;
        self.actions = candidate;
        Ok(())
    }

    async fn write(storage: &S, date: NaiveDate, actions: &[Action]) -> Result<(), LedgerError> {
        let lines = actions.iter().map(Action::to_record).collect::<Vec<_>>();
        storage.write_lines(date, lines).await?;
        Ok(())
    }
}
