//! Capability traits for the external collaborators.
//!
//! The sync pipeline only ever talks to these traits (and the property
//! store trait re-exported from [`crate::config`]); production code injects
//! the HTTP clients, tests inject in-memory or file-backed fakes.

use chrono::{DateTime, Utc};

pub use crate::config::ConfigStore;
use crate::error::ServiceError;
use crate::types::{
    ConnectionChanges, ContactGroup, DestinationId, GroupId, Person, ResourceName, SyncToken,
};

/// People-directory service.
pub trait DirectoryService {
    /// Resolve group metadata and up to `max_members` member handles.
    fn contact_group(
        &self,
        id: &GroupId,
        max_members: u32,
        quota_user: &str,
    ) -> Result<ContactGroup, ServiceError>;

    /// Fetch full records for exactly `resource_names`, limited to `fields`.
    ///
    /// Records the directory could not resolve are omitted from the result.
    fn batch_get_people(
        &self,
        resource_names: &[ResourceName],
        fields: &[&str],
        quota_user: &str,
    ) -> Result<Vec<Person>, ServiceError>;

    /// List connections changed since `token` (a full listing when `None`).
    fn list_connection_changes(
        &self,
        token: Option<&SyncToken>,
        quota_user: &str,
    ) -> Result<ConnectionChanges, ServiceError>;
}

/// Spreadsheet the roster is rendered into.
///
/// Rows and columns are 1-based, matching spreadsheet addressing.
pub trait SpreadsheetSink {
    /// Open the configured destination, or fall back to the active one.
    fn resolve(&self, configured: Option<&DestinationId>) -> Result<DestinationId, ServiceError>;

    fn last_modified(&self, id: &DestinationId) -> Result<DateTime<Utc>, ServiceError>;

    /// Last occupied row of `sheet`; `0` when the sheet is empty.
    fn last_row(&self, id: &DestinationId, sheet: &str) -> Result<usize, ServiceError>;

    /// Current cell values of `sheet`, row 1 first.
    fn read_values(&self, id: &DestinationId, sheet: &str) -> Result<Vec<Vec<String>>, ServiceError>;

    /// Write a rectangular block whose top-left cell is `(row, column)`.
    fn write_block(
        &mut self,
        id: &DestinationId,
        sheet: &str,
        row: usize,
        column: usize,
        values: &[Vec<String>],
    ) -> Result<(), ServiceError>;

    /// Clear cell contents (not formatting) of a rectangular region.
    fn clear_content(
        &mut self,
        id: &DestinationId,
        sheet: &str,
        row: usize,
        column: usize,
        rows: usize,
        columns: usize,
    ) -> Result<(), ServiceError>;

    fn rename(&mut self, id: &DestinationId, title: &str) -> Result<(), ServiceError>;
}
