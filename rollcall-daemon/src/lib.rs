//! Scheduled re-invocation of the roster sync and launchd agent management.

mod error;
pub mod launchd;
pub mod paths;
mod schedule;

pub use error::DaemonError;
pub use launchd::{generate_plist, install as install_launchd, uninstall as uninstall_launchd};
pub use schedule::{init_tracing, run, run_schedule, start_blocking, Schedule, ScheduleReport};
