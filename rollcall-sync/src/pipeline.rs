//! Shared sync entrypoint used by the CLI and the daemon.
//!
//! ## Run sequence
//!
//! 1. Load settings from the property store.
//! 2. Resolve the destination and take its run lock.
//! 3. Read the sheet's last-modified time and last occupied row.
//! 4. Read every group from the directory.
//! 5. Evaluate the change gate (always advances the sync token).
//! 6. Format rows per group and plan the layout.
//! 7. Clear the data region once, write blocks in fixed order, rename.
//!
//! Step 7 is skipped when the gate is negative, when every group formats to
//! zero rows, or on a dry run.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use rollcall_core::{
    ConfigStore, Destination, DestinationId, DirectoryService, GroupLabel, GroupMembers,
    SpreadsheetSink, SyncSettings,
};
use rollcall_format::{format_group, Row, TitleTemplate};

use crate::detector::{detect, ChangeSignal, RunMode};
use crate::error::SyncError;
use crate::lock::RunLock;
use crate::reader::{read_groups, GroupSnapshot};
use crate::writer::{plan_layout, PlannedBlock, SheetWriter};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// The three external collaborators a run talks to.
pub struct Collaborators<'a> {
    pub directory: &'a dyn DirectoryService,
    pub sink: &'a mut dyn SpreadsheetSink,
    pub config: &'a mut dyn ConfigStore,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub mode: RunMode,
    /// Read and evaluate everything, write nothing.
    pub dry_run: bool,
    /// Clock reading used for the destination title.
    pub now: DateTime<Utc>,
    /// Quota identity; overrides the `QUOTA_USER` property.
    pub identity: Option<String>,
    /// Home directory holding run locks; `None` disables locking.
    pub lock_home: Option<PathBuf>,
}

impl RunOptions {
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            dry_run: false,
            now: Utc::now(),
            identity: None,
            lock_home: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Data region rewritten and destination renamed.
    Updated,
    /// The change gate was negative.
    NoChange,
    /// Every group formatted to zero rows; sheet left untouched.
    NothingToWrite,
    /// An update was due but the run was a dry run.
    DryRun,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub label: GroupLabel,
    /// Read failure, when the group was treated as empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absent: Option<String>,
    pub rows: usize,
    pub start_row: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub destination: DestinationId,
    pub mode: RunMode,
    pub signal: ChangeSignal,
    pub sheet_last_modified: DateTime<Utc>,
    pub groups: Vec<GroupSummary>,
    pub cleared: bool,
    /// Title the destination was (or would be) renamed to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub token_persisted: bool,
    pub outcome: RunOutcome,
}

impl RunReport {
    pub fn total_rows(&self) -> usize {
        self.groups.iter().map(|g| g.rows).sum()
    }
}

// ---------------------------------------------------------------------------
// Shared read phase
// ---------------------------------------------------------------------------

/// Everything read before the gate; shared with the diff preview.
pub(crate) struct Prepared {
    pub settings: SyncSettings,
    pub destination: Destination,
    pub quota_user: String,
    pub snapshot: GroupSnapshot,
}

pub(crate) fn resolve(
    sink: &dyn SpreadsheetSink,
    config: &dyn ConfigStore,
    identity: Option<&str>,
) -> Result<(SyncSettings, DestinationId, String), SyncError> {
    let settings = SyncSettings::load(config);
    let destination = sink.resolve(settings.destination.as_ref())?;
    let quota_user = identity
        .map(str::to_string)
        .or_else(|| settings.quota_user.clone())
        .unwrap_or_default();
    Ok((settings, destination, quota_user))
}

pub(crate) fn prepare(
    directory: &dyn DirectoryService,
    sink: &dyn SpreadsheetSink,
    settings: SyncSettings,
    destination: DestinationId,
    quota_user: String,
) -> Result<Prepared, SyncError> {
    let destination = Destination {
        last_modified: sink.last_modified(&destination)?,
        last_row: sink.last_row(&destination, &settings.sheet_name)?,
        id: destination,
    };
    tracing::debug!(
        "destination {}: last modified {}, last row {}",
        destination.id,
        destination.last_modified,
        destination.last_row
    );

    let snapshot = read_groups(directory, &settings.groups, settings.max_members, &quota_user);

    Ok(Prepared {
        settings,
        destination,
        quota_user,
        snapshot,
    })
}

/// Format each group's people, keeping the snapshot's group order.
pub(crate) fn format_snapshot(snapshot: &GroupSnapshot) -> Vec<(GroupLabel, Vec<Row>)> {
    snapshot
        .iter()
        .map(|(label, members)| (*label, format_group(members.people(), *label)))
        .collect()
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

/// Run one sync against `collab`.
pub fn run(collab: &mut Collaborators<'_>, options: &RunOptions) -> Result<RunReport, SyncError> {
    let (settings, destination, quota_user) =
        resolve(&*collab.sink, &*collab.config, options.identity.as_deref())?;

    let _lock = match (&options.lock_home, options.dry_run) {
        (Some(home), false) => Some(RunLock::acquire_at(home, &destination)?),
        _ => None,
    };

    let prepared = prepare(collab.directory, &*collab.sink, settings, destination, quota_user)?;
    let Prepared {
        settings,
        destination:
            Destination {
                id: destination,
                last_modified,
                last_row,
            },
        quota_user,
        snapshot,
    } = prepared;

    let change = detect(
        collab.directory,
        &mut *collab.config,
        &snapshot,
        last_modified,
        options.mode,
        !options.dry_run,
        &quota_user,
    )?;

    let formatted = format_snapshot(&snapshot);
    let plan = plan_layout(&formatted);

    let mut report = RunReport {
        destination: destination.clone(),
        mode: options.mode,
        signal: change.signal.clone(),
        sheet_last_modified: last_modified,
        groups: summarize(&snapshot, &plan),
        cleared: false,
        title: None,
        token_persisted: change.token_persisted,
        outcome: RunOutcome::NoChange,
    };

    if !change.update_needed() {
        tracing::info!("{destination} is current; nothing to do");
        return Ok(report);
    }

    if report.total_rows() == 0 {
        tracing::info!("no rows to write for {destination}; leaving sheet untouched");
        report.outcome = RunOutcome::NothingToWrite;
        return Ok(report);
    }

    let title = TitleTemplate::new(&settings.title_template)?
        .render(options.now, destination.as_str())?;
    report.title = Some(title.clone());

    if options.dry_run {
        tracing::info!(
            "[dry-run] would rewrite {} rows in {destination} and rename it to '{title}'",
            report.total_rows()
        );
        report.outcome = RunOutcome::DryRun;
        return Ok(report);
    }

    let mut writer = SheetWriter::new(&mut *collab.sink, destination.clone(), &settings.sheet_name);
    report.cleared = writer.clear_data_region(last_row)?;
    for ((_, rows), block) in formatted.iter().zip(&plan) {
        writer.write(rows, block.start_row)?;
    }
    drop(writer);

    collab.sink.rename(&destination, &title)?;
    tracing::info!(
        "rewrote {} rows in {destination} ({:?}); renamed to '{title}'",
        report.total_rows(),
        report.signal
    );
    report.outcome = RunOutcome::Updated;
    Ok(report)
}

fn summarize(snapshot: &GroupSnapshot, plan: &[PlannedBlock]) -> Vec<GroupSummary> {
    snapshot
        .iter()
        .zip(plan)
        .map(|((label, members), block)| GroupSummary {
            label: *label,
            absent: match members {
                GroupMembers::Absent { reason } => Some(reason.clone()),
                GroupMembers::Fetched { .. } => None,
            },
            rows: block.rows,
            start_row: block.start_row,
        })
        .collect()
}
