//! `rollcall daemon`: scheduled syncs in the foreground or via launchd.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use rollcall_daemon::paths::{logs_dir, DEFAULT_INTERVAL};
use rollcall_daemon::{generate_plist, install_launchd, start_blocking, uninstall_launchd, Schedule};
use rollcall_sync::{run as run_sync, RunMode};

use crate::backend::{home_dir, GlobalArgs};

#[derive(Subcommand, Debug)]
pub enum DaemonCommand {
    /// Run conditional syncs in the foreground until Ctrl-C.
    Start(StartArgs),
    /// Install and bootstrap the launchd agent.
    Install(IntervalArgs),
    /// Boot out and remove the launchd agent.
    Uninstall,
    /// Print the launchd agent plist.
    Plist(IntervalArgs),
}

#[derive(Args, Debug)]
pub struct IntervalArgs {
    /// Seconds between runs.
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_INTERVAL.as_secs())]
    pub every: u64,
}

#[derive(Args, Debug)]
pub struct StartArgs {
    #[command(flatten)]
    pub interval: IntervalArgs,

    /// Exit after this many runs.
    #[arg(long)]
    pub max_runs: Option<u32>,
}

pub fn run(command: DaemonCommand, global: &GlobalArgs) -> Result<()> {
    match command {
        DaemonCommand::Start(args) => start(args, global),
        DaemonCommand::Install(args) => {
            let home = home_dir()?;
            let binary = std::env::current_exe().context("cannot locate the rollcall binary")?;
            let path = install_launchd(&home, &binary, Duration::from_secs(args.every))
                .context("failed to install launchd agent")?;
            println!("installed launchd agent: {}", path.display());
            Ok(())
        }
        DaemonCommand::Uninstall => {
            uninstall_launchd(&home_dir()?).context("failed to uninstall launchd agent")?;
            println!("uninstalled launchd agent");
            Ok(())
        }
        DaemonCommand::Plist(args) => {
            let home = home_dir()?;
            let binary = std::env::current_exe().context("cannot locate the rollcall binary")?;
            print!(
                "{}",
                generate_plist(&binary, Duration::from_secs(args.every), &logs_dir(&home))
            );
            Ok(())
        }
    }
}

fn start(args: StartArgs, global: &GlobalArgs) -> Result<()> {
    let mut schedule = Schedule::every(Duration::from_secs(args.interval.every));
    if let Some(max_runs) = args.max_runs {
        schedule = schedule.with_max_runs(max_runs);
    }

    let global = global.clone();
    let job = move || -> Result<()> {
        let mut session = global.open()?;
        let options = session.options(RunMode::Conditional, false);
        let report = run_sync(&mut session.collaborators(), &options)?;
        tracing::info!(
            destination = %report.destination,
            outcome = ?report.outcome,
            rows = report.total_rows(),
            "sync run finished"
        );
        Ok(())
    };

    let report = start_blocking(schedule, job).context("daemon exited with error")?;
    println!(
        "daemon stopped after {} runs ({} failed)",
        report.runs, report.failures
    );
    Ok(())
}
