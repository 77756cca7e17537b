use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use crate::error::{io_err, DaemonError};
use crate::paths::{
    launch_agents_dir, launchd_plist_path, logs_dir, DAEMON_LABEL, DAEMON_STDERR_LOG,
    DAEMON_STDOUT_LOG,
};

/// Generate a launchd agent that runs `rollcall sync` every `interval`.
///
/// launchd owns the schedule here; each firing is a one-shot process, so
/// the agent carries `StartInterval` instead of `KeepAlive`.
pub fn generate_plist(binary_path: &Path, interval: Duration, log_dir: &Path) -> String {
    let stdout = escape(&log_dir.join(DAEMON_STDOUT_LOG).display().to_string());
    let stderr = escape(&log_dir.join(DAEMON_STDERR_LOG).display().to_string());
    let binary = escape(&binary_path.display().to_string());
    let seconds = interval.as_secs().max(1);

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
  <key>Label</key>
  <string>{label}</string>
  <key>ProgramArguments</key>
  <array>
    <string>{binary}</string>
    <string>sync</string>
  </array>
  <key>StartInterval</key>
  <integer>{seconds}</integer>
  <key>RunAtLoad</key>
  <true/>
  <key>StandardOutPath</key>
  <string>{stdout}</string>
  <key>StandardErrorPath</key>
  <string>{stderr}</string>
</dict>
</plist>
"#,
        label = DAEMON_LABEL,
    )
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Write the agent plist and bootstrap it for the current user.
pub fn install(home: &Path, binary_path: &Path, interval: Duration) -> Result<PathBuf, DaemonError> {
    ensure_macos()?;

    let launch_agents = launch_agents_dir(home);
    fs::create_dir_all(&launch_agents).map_err(|e| io_err(&launch_agents, e))?;
    let logs = logs_dir(home);
    fs::create_dir_all(&logs).map_err(|e| io_err(&logs, e))?;

    let plist = launchd_plist_path(home);
    fs::write(&plist, generate_plist(binary_path, interval, &logs))
        .map_err(|e| io_err(&plist, e))?;

    let domain = launchctl_domain()?;
    let service = format!("{domain}/{DAEMON_LABEL}");

    let _ = run_launchctl(&["bootout", &service], true);
    run_launchctl(&["bootstrap", &domain, &plist.display().to_string()], false)?;

    tracing::info!(plist = %plist.display(), "installed launchd agent");
    Ok(plist)
}

/// Boot out the agent and remove its plist. A missing plist is not an error.
pub fn uninstall(home: &Path) -> Result<(), DaemonError> {
    ensure_macos()?;

    let plist = launchd_plist_path(home);
    if plist.exists() {
        let domain = launchctl_domain()?;
        let service = format!("{domain}/{DAEMON_LABEL}");
        let _ = run_launchctl(&["bootout", &service], true);
        fs::remove_file(&plist).map_err(|e| io_err(&plist, e))?;
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn ensure_macos() -> Result<(), DaemonError> {
    Ok(())
}

#[cfg(not(target_os = "macos"))]
fn ensure_macos() -> Result<(), DaemonError> {
    Err(DaemonError::Launchd(
        "launchd management is only supported on macOS; use `rollcall daemon start` or cron"
            .to_string(),
    ))
}

fn run_launchctl(args: &[&str], ignore_failure: bool) -> Result<(), DaemonError> {
    let output = Command::new("launchctl")
        .args(args)
        .output()
        .map_err(|e| io_err("launchctl", e))?;

    if output.status.success() || ignore_failure {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    Err(DaemonError::Launchd(format!(
        "launchctl {} failed ({}): {stderr}",
        args.first().copied().unwrap_or_default(),
        output.status
    )))
}

fn launchctl_domain() -> Result<String, DaemonError> {
    let output = Command::new("id")
        .arg("-u")
        .output()
        .map_err(|e| io_err("id -u", e))?;
    let uid = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !output.status.success() || uid.is_empty() {
        return Err(DaemonError::Launchd(format!(
            "failed to resolve current uid (status {})",
            output.status
        )));
    }
    Ok(format!("gui/{uid}"))
}
