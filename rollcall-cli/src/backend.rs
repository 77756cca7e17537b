//! Global flags and collaborator wiring shared by every command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, ValueEnum};

use rollcall_core::{DirectoryService, FileConfigStore, SpreadsheetSink};
use rollcall_google::GoogleClient;
use rollcall_sync::{Collaborators, LocalDirectory, LocalWorkbook, RunMode, RunOptions};

pub const ACCESS_TOKEN_ENV: &str = "ROLLCALL_ACCESS_TOKEN";
pub const QUOTA_USER_ENV: &str = "ROLLCALL_QUOTA_USER";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// People, Sheets and Drive APIs.
    Google,
    /// JSON directory snapshot and JSON workbook on disk.
    Local,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Where directory data comes from and rows go to.
    #[arg(long, value_enum, global = true, default_value_t = Backend::Google)]
    pub backend: Backend,

    /// Directory snapshot file (local backend).
    #[arg(long, global = true, value_name = "SNAPSHOT")]
    pub directory: Option<PathBuf>,

    /// Workbook used when no destination is configured (local backend).
    #[arg(long, global = true, value_name = "WORKBOOK")]
    pub workbook: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

impl GlobalArgs {
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Build the collaborators for one run.
    pub fn open(&self) -> Result<Session> {
        let home = home_dir()?;
        let config = FileConfigStore::open_at(&home).context("failed to open property store")?;

        let (directory, sink): (Box<dyn DirectoryService>, Box<dyn SpreadsheetSink>) =
            match self.backend {
                Backend::Google => {
                    let token = std::env::var(ACCESS_TOKEN_ENV)
                        .ok()
                        .filter(|t| !t.trim().is_empty())
                        .with_context(|| {
                            format!("{ACCESS_TOKEN_ENV} must hold an OAuth access token for the google backend")
                        })?;
                    (
                        Box::new(GoogleClient::new(token.clone())),
                        Box::new(GoogleClient::new(token)),
                    )
                }
                Backend::Local => {
                    let snapshot = self
                        .directory
                        .as_ref()
                        .context("--directory <SNAPSHOT> is required for the local backend")?;
                    let directory = LocalDirectory::open(snapshot).with_context(|| {
                        format!("failed to load directory snapshot {}", snapshot.display())
                    })?;
                    (
                        Box::new(directory),
                        Box::new(LocalWorkbook::new(self.workbook.clone())),
                    )
                }
            };

        let identity = std::env::var(QUOTA_USER_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty());

        Ok(Session {
            home,
            directory,
            sink,
            config,
            identity,
        })
    }
}

/// Collaborators and run context for one command invocation.
pub struct Session {
    pub home: PathBuf,
    pub directory: Box<dyn DirectoryService>,
    pub sink: Box<dyn SpreadsheetSink>,
    pub config: FileConfigStore,
    pub identity: Option<String>,
}

impl Session {
    pub fn collaborators(&mut self) -> Collaborators<'_> {
        Collaborators {
            directory: &*self.directory,
            sink: &mut *self.sink,
            config: &mut self.config,
        }
    }

    pub fn options(&self, mode: RunMode, dry_run: bool) -> RunOptions {
        RunOptions {
            dry_run,
            identity: self.identity.clone(),
            lock_home: Some(self.home.clone()),
            ..RunOptions::new(mode)
        }
    }
}

pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("could not determine home directory")
}
