//! Periodic sync runtime.
//!
//! A run that fails is logged and superseded by the next tick; nothing is
//! retried in between. Runs never overlap: each tick waits for the previous
//! job to return before the interval is polled again.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::{io_err, DaemonError};

/// How often to run, and optionally when to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub every: Duration,
    /// Stop after this many runs; `None` runs until shutdown.
    pub max_runs: Option<u32>,
}

impl Schedule {
    pub fn every(every: Duration) -> Self {
        Self {
            every,
            max_runs: None,
        }
    }

    pub fn with_max_runs(mut self, max_runs: u32) -> Self {
        self.max_runs = Some(max_runs);
        self
    }

    fn exhausted(&self, runs: u32) -> bool {
        self.max_runs.is_some_and(|max| runs >= max)
    }
}

/// Totals for a finished schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    pub runs: u32,
    pub failures: u32,
}

/// Run `job` on every tick of `schedule` until it is exhausted or `shutdown`
/// fires (a dropped sender counts as shutdown).
///
/// The first run starts immediately. Ticks missed while a job was running
/// are skipped rather than replayed.
pub async fn run_schedule<F, E>(
    schedule: Schedule,
    job: F,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<ScheduleReport, DaemonError>
where
    F: Fn() -> Result<(), E> + Send + Sync + 'static,
    E: fmt::Display + Send + 'static,
{
    if schedule.every.is_zero() {
        return Err(DaemonError::InvalidInterval);
    }

    let job = Arc::new(job);
    let mut interval = tokio::time::interval(schedule.every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut report = ScheduleReport::default();

    tracing::info!(every_secs = schedule.every.as_secs(), "sync schedule started");

    while !schedule.exhausted(report.runs) {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("shutdown requested, stopping schedule");
                break;
            }
            _ = interval.tick() => {
                let started = Instant::now();
                let job = Arc::clone(&job);
                let outcome = tokio::task::spawn_blocking(move || job())
                    .await
                    .map_err(|err| DaemonError::Join {
                        task: "sync",
                        message: err.to_string(),
                    })?;

                report.runs += 1;
                let elapsed_ms = started.elapsed().as_millis();
                match outcome {
                    Ok(()) => tracing::info!(run = report.runs, elapsed_ms, "scheduled sync finished"),
                    Err(err) => {
                        report.failures += 1;
                        tracing::warn!(run = report.runs, elapsed_ms, error = %err, "scheduled sync failed");
                    }
                }
            }
        }
    }

    tracing::info!(runs = report.runs, failures = report.failures, "sync schedule stopped");
    Ok(report)
}

/// Run the schedule until exhausted or Ctrl-C.
pub async fn run<F, E>(schedule: Schedule, job: F) -> Result<ScheduleReport, DaemonError>
where
    F: Fn() -> Result<(), E> + Send + Sync + 'static,
    E: fmt::Display + Send + 'static,
{
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(4);

    let signal_handle = tokio::spawn(async move {
        let signal = tokio::signal::ctrl_c().await;
        let _ = shutdown_tx.send(());
        match signal {
            Ok(()) => {
                tracing::info!("received ctrl-c");
                Ok(())
            }
            Err(err) => Err(DaemonError::Signal(err.to_string())),
        }
    });

    let report = run_schedule(schedule, job, shutdown_rx).await;

    if signal_handle.is_finished() {
        match signal_handle.await {
            Ok(Err(err)) => return Err(err),
            Err(err) => {
                return Err(DaemonError::Join {
                    task: "signal",
                    message: err.to_string(),
                })
            }
            Ok(Ok(())) => {}
        }
    } else {
        signal_handle.abort();
    }
    report
}

/// Start the runtime and block the current thread until the schedule ends.
pub fn start_blocking<F, E>(schedule: Schedule, job: F) -> Result<ScheduleReport, DaemonError>
where
    F: Fn() -> Result<(), E> + Send + Sync + 'static,
    E: fmt::Display + Send + 'static,
{
    init_tracing("info");
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(schedule, job))
}

/// Install the fmt subscriber on stderr. `RUST_LOG` wins over
/// `default_directive`; records emitted through the `log` facade are
/// forwarded too.
pub fn init_tracing(default_directive: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
