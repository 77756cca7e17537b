use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DAEMON_LABEL: &str = "org.rollcall.sync";
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(15 * 60);

pub const DAEMON_STDOUT_LOG: &str = "sync.log";
pub const DAEMON_STDERR_LOG: &str = "sync-err.log";

pub fn rollcall_root(home: &Path) -> PathBuf {
    home.join(".rollcall")
}

pub fn logs_dir(home: &Path) -> PathBuf {
    rollcall_root(home).join("logs")
}

pub fn launch_agents_dir(home: &Path) -> PathBuf {
    home.join("Library").join("LaunchAgents")
}

pub fn launchd_plist_path(home: &Path) -> PathBuf {
    launch_agents_dir(home).join(format!("{DAEMON_LABEL}.plist"))
}
