//! # rollcall-sync
//!
//! Change-gated roster refresh: read directory groups, decide whether the
//! destination sheet is stale, and rewrite its data region.
//!
//! Call [`pipeline::run`] for a full sync, or [`diff_destination`] to preview
//! what a sync would write without touching the sheet.

pub mod detector;
pub mod diff;
pub mod error;
pub mod local;
pub mod lock;
pub mod pipeline;
pub mod reader;
pub mod writer;

pub use detector::{detect, ChangeReport, ChangeSignal, RunMode};
pub use diff::{diff_destination, DestinationDiff};
pub use error::SyncError;
pub use local::{DirectorySnapshot, LocalDirectory, LocalWorkbook, WorkbookFile};
pub use lock::RunLock;
pub use pipeline::{run, Collaborators, GroupSummary, RunOptions, RunOutcome, RunReport};
pub use reader::{read_groups, GroupSnapshot};
pub use writer::{plan_layout, PlannedBlock, SheetWriter};
