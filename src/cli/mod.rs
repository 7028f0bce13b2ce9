pub mod stat;

use std::{fmt::Display, path::PathBuf};

use anyhow::Result;
use chrono::{Local, NaiveDate, NaiveTime};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use stat::{process_stat_command, StatCommand};
use tracing::{debug, level_filters::LevelFilter};

use crate::{
    ledger::day::{DayLedger, LoadPolicy, DEFAULT_TASK},
    storage::record_storage::FileLedgerStorage,
    utils::{
        clock::DefaultClock,
        dir::{create_application_default_path, ensure_dir},
        logging::{enable_logging, CLI_PREFIX},
        time::{format_time_of_day, parse_time_of_day},
    },
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "Timekeeper", version, long_about = None)]
#[command(about = "Keeps track of time spent on tasks throughout the day", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        global = true,
        env = "TIMEKEEPER_DIR",
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        help = "Day to work with. Examples are \"yesterday\", \"15/03/2025\". Defaults to today"
    )]
    date: Option<String>,
    #[arg(long, global = true, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(
        long,
        global = true,
        help = "Validate the stored record when loading it, not only when changing it"
    )]
    strict: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Clock into a task. A task that is still running is clocked out first")]
    In {
        #[arg(default_value = DEFAULT_TASK, help = "Task to work on")]
        task: String,
        #[arg(long, short, value_parser = parse_time_of_day, help = "Time as HH:MM. Defaults to now")]
        time: Option<NaiveTime>,
    },
    #[command(about = "Clock out of the running task")]
    Out {
        #[arg(help = "Informational only, the running task is the one that gets closed")]
        task: Option<String>,
        #[arg(long, short, value_parser = parse_time_of_day, help = "Time as HH:MM. Defaults to now")]
        time: Option<NaiveTime>,
    },
    #[command(about = "Print total time and per task breakdown for the day")]
    Stat {
        #[command(flatten)]
        command: StatCommand,
    },
    #[command(about = "Check that the stored record of the day is consistent")]
    Check {},
}

pub fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = match args.dir.clone() {
        Some(dir) => ensure_dir(dir)?,
        None => create_application_default_path()?,
    };
    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &app_dir.join("logs"), logging_level, args.log)?;

    let date = resolve_date(args.date.as_deref(), args.date_style)?;
    let policy = if args.strict {
        LoadPolicy::Validated
    } else {
        LoadPolicy::Trusted
    };
    debug!("Working with {date} in {app_dir:?}");

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(process_command(args.commands, app_dir, date, policy))
}

async fn process_command(
    commands: Commands,
    app_dir: PathBuf,
    date: NaiveDate,
    policy: LoadPolicy,
) -> Result<()> {
    let storage = FileLedgerStorage::new(app_dir.join("records"))?;
    let mut ledger =
        DayLedger::load_with_policy(storage, date, Box::new(DefaultClock), policy).await?;

    match commands {
        Commands::In { task, time } => {
            ledger.clock_in(&task, time).await?;
            report_last_action(&ledger);
            Ok(())
        }
        Commands::Out { task, time } => {
            ledger.clock_out(task.as_deref(), time).await?;
            report_last_action(&ledger);
            Ok(())
        }
        Commands::Stat { command } => process_stat_command(&ledger, command),
        Commands::Check {} => {
            ledger.validate()?;
            println!("{date}: {} actions, OK", ledger.len());
            Ok(())
        }
    }
}

fn report_last_action(ledger: &DayLedger<FileLedgerStorage>) {
    if let Some(action) = ledger.actions().last() {
        println!(
            "{} {} at {}",
            action.task(),
            action.direction(),
            format_time_of_day(action.time())
        );
    }
}

/// Without an explicit date the current local day is used.
fn resolve_date(date: Option<&str>, date_style: DateStyle) -> Result<NaiveDate> {
    let now = Local::now();
    match date.map(|s| parse_date_string(s, now, date_style.into())) {
        Some(Ok(v)) => Ok(v.date_naive()),
        Some(Err(e)) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate date {e}"),
            )
            .into()),
        None => Ok(now.date_naive()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Local, NaiveDate, NaiveTime};
    use clap::Parser;

    use super::{resolve_date, Args, Commands, DateStyle};
    use crate::ledger::day::DEFAULT_TASK;

    #[test]
    fn test_in_defaults() {
        let args = Args::try_parse_from(["timekeeper", "in"]).unwrap();
        let Commands::In { task, time } = args.commands else {
            panic!("Expected in command");
        };
        assert_eq!(task, DEFAULT_TASK);
        assert_eq!(time, None);
    }

    #[test]
    fn test_in_with_time() {
        let args =
            Args::try_parse_from(["timekeeper", "--date", "yesterday", "in", "email", "-t", "13:05"])
                .unwrap();
        let Commands::In { task, time } = args.commands else {
            panic!("Expected in command");
        };
        assert_eq!(task, "email");
        assert_eq!(time, NaiveTime::from_hms_opt(13, 5, 0));
        assert_eq!(args.date.as_deref(), Some("yesterday"));
    }

    #[test]
    fn test_out_rejects_bad_time() {
        assert!(Args::try_parse_from(["timekeeper", "out", "--time", "soon"]).is_err());
    }

    #[test]
    fn test_resolve_date() {
        assert_eq!(
            resolve_date(None, DateStyle::Uk).unwrap(),
            Local::now().date_naive()
        );
        assert_eq!(
            resolve_date(Some("15/03/2025"), DateStyle::Uk).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
        );
        assert_eq!(
            resolve_date(Some("03/15/2025"), DateStyle::Us).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
        );
        assert!(resolve_date(Some("not a date at all"), DateStyle::Uk).is_err());
    }
}
