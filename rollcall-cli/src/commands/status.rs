//! `rollcall status`: evaluate the change gate as a dry run.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use rollcall_sync::{run, ChangeSignal, RunMode, RunReport};

use super::sync::describe_signal;
use crate::backend::GlobalArgs;

/// Arguments for `rollcall status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct GroupTableRow {
    #[tabled(rename = "group")]
    group: String,
    #[tabled(rename = "rows")]
    rows: usize,
    #[tabled(rename = "start row")]
    start_row: usize,
    #[tabled(rename = "note")]
    note: String,
}

impl StatusArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let mut session = global.open()?;
        let options = session.options(RunMode::Conditional, true);
        let report = run(&mut session.collaborators(), &options).context("status check failed")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize status JSON")?
            );
            return Ok(());
        }

        print_table(&report);
        Ok(())
    }
}

fn print_table(report: &RunReport) {
    println!(
        "Rollcall v{} | {} | last modified {} | {} rows",
        env!("CARGO_PKG_VERSION"),
        report.destination,
        report.sheet_last_modified.to_rfc3339(),
        report.total_rows(),
    );
    println!(
        "{} {}",
        signal_indicator(&report.signal),
        describe_signal(&report.signal)
    );

    let rows: Vec<GroupTableRow> = report
        .groups
        .iter()
        .map(|group| GroupTableRow {
            group: group.label.label().to_string(),
            rows: group.rows,
            start_row: group.start_row,
            note: group
                .absent
                .as_deref()
                .map_or_else(String::new, |reason| format!("unavailable: {reason}")),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if report.signal.update_needed() {
        println!("Run 'rollcall sync' to rewrite the roster.");
    }
}

fn signal_indicator(signal: &ChangeSignal) -> String {
    match signal {
        ChangeSignal::Current => "■ CURRENT".green().bold().to_string(),
        ChangeSignal::Forced => "■ FORCED".magenta().bold().to_string(),
        ChangeSignal::MembershipChanged { .. } => "■ MEMBERSHIP CHANGED".yellow().bold().to_string(),
        ChangeSignal::RecordsEdited { .. } => "■ RECORDS EDITED".yellow().bold().to_string(),
    }
}
