//! `rollcall sync`: rebuild the roster sheet when the directory changed.

use anyhow::{Context, Result};
use clap::Args;

use rollcall_sync::{detector::FORCE_FLAG, run, ChangeSignal, RunMode, RunOutcome, RunReport};

use crate::backend::GlobalArgs;

/// Arguments for `rollcall sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Pass `forceUpdate` to skip both change checks.
    pub flag: Option<String>,

    /// Same as passing `forceUpdate`.
    #[arg(long)]
    pub force: bool,

    /// Evaluate everything but leave the sheet and sync token untouched.
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncArgs {
    pub fn mode(&self) -> RunMode {
        if let Some(flag) = self.flag.as_deref().filter(|f| *f != FORCE_FLAG) {
            tracing::warn!("ignoring unknown flag '{flag}'; expected '{FORCE_FLAG}'");
        }
        if self.force {
            RunMode::Forced
        } else {
            RunMode::from_flag(self.flag.as_deref())
        }
    }

    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let mut session = global.open()?;
        let options = session.options(self.mode(), self.dry_run);
        let report = run(&mut session.collaborators(), &options).context("sync failed")?;
        print_report(&report);
        Ok(())
    }
}

fn print_report(report: &RunReport) {
    let destination = &report.destination;
    for group in report.groups.iter().filter(|g| g.absent.is_some()) {
        println!(
            "  !  {} group unavailable, treated as empty: {}",
            group.label.label(),
            group.absent.as_deref().unwrap_or_default()
        );
    }

    match report.outcome {
        RunOutcome::Updated => {
            println!(
                "✓ '{destination}' updated ({} rows, {})",
                report.total_rows(),
                describe_signal(&report.signal)
            );
            for group in &report.groups {
                println!(
                    "  ✎  {:<9} {:>4} rows from row {}",
                    group.label.label(),
                    group.rows,
                    group.start_row
                );
            }
            if let Some(title) = &report.title {
                println!("  renamed to '{title}'");
            }
        }
        RunOutcome::NoChange => println!("✓ '{destination}' is current, nothing to do"),
        RunOutcome::NothingToWrite => {
            println!("✓ '{destination}': every group is empty, sheet left untouched")
        }
        RunOutcome::DryRun => {
            println!(
                "[dry-run] ✓ '{destination}' would be updated ({} rows, {})",
                report.total_rows(),
                describe_signal(&report.signal)
            );
            if let Some(title) = &report.title {
                println!("  ~  would rename to '{title}'");
            }
        }
    }
}

pub(crate) fn describe_signal(signal: &ChangeSignal) -> String {
    match signal {
        ChangeSignal::Forced => "forced".to_string(),
        ChangeSignal::MembershipChanged { changed } => format!("{changed} connections changed"),
        ChangeSignal::RecordsEdited { person, newest } => match person {
            Some(person) => format!("{person} edited at {}", newest.to_rfc3339()),
            None => format!("records edited at {}", newest.to_rfc3339()),
        },
        ChangeSignal::Current => "up to date".to_string(),
    }
}
