use std::io::IsTerminal;

use ansi_term::Style;
use anyhow::Result;
use clap::Parser;

use crate::{
    ledger::{aggregator::DayAggregation, day::DayLedger},
    storage::record_storage::LedgerStorage,
    utils::time::{format_hours_minutes, format_time_of_day},
};

const SEPARATOR: &str = "----------------------";

#[derive(Debug, Parser)]
pub struct StatCommand {
    #[arg(long, help = "Print the breakdown as json. Durations are in minutes")]
    json: bool,
}

/// Command to process `stat` command. Nothing is written back, the running task is only closed
/// for the duration of the report.
pub fn process_stat_command<S: LedgerStorage>(
    ledger: &DayLedger<S>,
    StatCommand { json }: StatCommand,
) -> Result<()> {
    let aggregation = ledger.aggregate()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&aggregation)?);
    } else {
        print!(
            "{}",
            render_stat(&aggregation, std::io::stdout().is_terminal())
        );
    }
    Ok(())
}

pub fn render_stat(aggregation: &DayAggregation, styled: bool) -> String {
    let emphasis = if styled {
        Style::new().bold()
    } else {
        Style::new()
    };

    let mut output = format!(
        "{SEPARATOR}\nTime for: {}\nTotal: {}\n{SEPARATOR}\n",
        aggregation.date.format("%Y-%m-%d"),
        emphasis.paint(format_hours_minutes(aggregation.total))
    );

    for usage in &aggregation.tasks {
        let times = usage
            .intervals
            .iter()
            .map(|v| {
                format!(
                    "{}->{}",
                    format_time_of_day(v.start),
                    format_time_of_day(v.end)
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        let running = if aggregation.open_task.as_ref() == Some(&usage.task) {
            " (running)"
        } else {
            ""
        };
        output.push_str(&format!(
            "{} ==> {}{running}\n\tTimes: {times}\n",
            emphasis.paint(usage.task.as_ref()),
            format_hours_minutes(usage.duration)
        ));
    }
    output
}
