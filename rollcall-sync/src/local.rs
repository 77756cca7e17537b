//! File-backed collaborators for offline runs and tests.
//!
//! - [`LocalDirectory`] serves groups and people from a JSON snapshot shaped
//!   like the people-directory payloads.
//! - [`LocalWorkbook`] keeps sheets in a JSON workbook file, saved with the
//!   same `.tmp` + rename pattern as the property store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use rollcall_core::{
    error::service_io_err, ConnectionChanges, ContactGroup, DestinationId, DirectoryService,
    GroupId, Person, ResourceName, ServiceError, SpreadsheetSink, SyncToken,
};
use rollcall_format::header_row;

const DIRECTORY: &str = "local directory";
const WORKBOOK: &str = "local workbook";
const TOKEN_PREFIX: &str = "local-";

// ---------------------------------------------------------------------------
// 1. Directory snapshot
// ---------------------------------------------------------------------------

/// On-disk directory snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    #[serde(default)]
    pub groups: Vec<ContactGroup>,
    #[serde(default)]
    pub people: Vec<Person>,
}

/// Directory service answering from a [`DirectorySnapshot`].
#[derive(Debug, Clone)]
pub struct LocalDirectory {
    snapshot: DirectorySnapshot,
}

impl LocalDirectory {
    pub fn open(path: &Path) -> Result<Self, ServiceError> {
        let contents = std::fs::read_to_string(path).map_err(|e| service_io_err(path, e))?;
        let snapshot = serde_json::from_str(&contents).map_err(|e| ServiceError::Decode {
            service: DIRECTORY,
            message: format!("{}: {e}", path.display()),
        })?;
        Ok(Self { snapshot })
    }

    pub fn from_snapshot(snapshot: DirectorySnapshot) -> Self {
        Self { snapshot }
    }

    /// Token describing the current state of every person.
    pub fn current_token(&self) -> SyncToken {
        let mut entries: Vec<String> = self
            .snapshot
            .people
            .iter()
            .map(|p| {
                format!(
                    "{}|{}",
                    p.resource_name.as_ref().map(ResourceName::as_str).unwrap_or(""),
                    p.last_updated().to_rfc3339()
                )
            })
            .collect();
        entries.sort();

        let mut hasher = Sha256::new();
        for entry in &entries {
            hasher.update(entry.as_bytes());
            hasher.update(b"\n");
        }
        SyncToken::from(format!("{TOKEN_PREFIX}{}", hex::encode(hasher.finalize())))
    }
}

impl DirectoryService for LocalDirectory {
    fn contact_group(
        &self,
        id: &GroupId,
        max_members: u32,
        _quota_user: &str,
    ) -> Result<ContactGroup, ServiceError> {
        let mut group = self
            .snapshot
            .groups
            .iter()
            .find(|g| &g.resource_name == id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound {
                service: DIRECTORY,
                resource: id.to_string(),
            })?;
        group.member_count = group.member_count.max(group.member_resource_names.len() as u32);
        group.member_resource_names.truncate(max_members as usize);
        Ok(group)
    }

    fn batch_get_people(
        &self,
        resource_names: &[ResourceName],
        fields: &[&str],
        _quota_user: &str,
    ) -> Result<Vec<Person>, ServiceError> {
        Ok(resource_names
            .iter()
            .filter_map(|name| {
                self.snapshot
                    .people
                    .iter()
                    .find(|p| p.resource_name.as_ref() == Some(name))
            })
            .map(|p| project(p, fields))
            .collect())
    }

    fn list_connection_changes(
        &self,
        token: Option<&SyncToken>,
        _quota_user: &str,
    ) -> Result<ConnectionChanges, ServiceError> {
        let current = self.current_token();
        let changed = match token {
            Some(t) if t == &current => 0,
            Some(t) if !t.as_str().starts_with(TOKEN_PREFIX) => {
                return Err(ServiceError::ExpiredSyncToken { service: DIRECTORY })
            }
            _ => self.snapshot.people.len() as u64,
        };
        Ok(ConnectionChanges {
            changed,
            next_token: Some(current),
        })
    }
}

/// Keep only the requested person fields.
fn project(person: &Person, fields: &[&str]) -> Person {
    let wants = |field: &str| fields.contains(&field);
    Person {
        resource_name: person.resource_name.clone(),
        names: if wants("names") { person.names.clone() } else { Vec::new() },
        organizations: if wants("organizations") {
            person.organizations.clone()
        } else {
            Vec::new()
        },
        phone_numbers: if wants("phoneNumbers") {
            person.phone_numbers.clone()
        } else {
            Vec::new()
        },
        addresses: if wants("addresses") {
            person.addresses.clone()
        } else {
            Vec::new()
        },
        email_addresses: if wants("emailAddresses") {
            person.email_addresses.clone()
        } else {
            Vec::new()
        },
        metadata: if wants("metadata") {
            person.metadata.clone()
        } else {
            None
        },
    }
}

// ---------------------------------------------------------------------------
// 2. Workbook file
// ---------------------------------------------------------------------------

/// On-disk workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkbookFile {
    pub title: String,
    pub modified_at: DateTime<Utc>,
    #[serde(default)]
    pub sheets: BTreeMap<String, Vec<Vec<String>>>,
}

impl WorkbookFile {
    pub fn load(path: &Path) -> Result<Self, ServiceError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ServiceError::NotFound {
                    service: WORKBOOK,
                    resource: path.display().to_string(),
                })
            }
            Err(e) => return Err(service_io_err(path, e)),
        };
        serde_json::from_str(&contents).map_err(|e| ServiceError::Decode {
            service: WORKBOOK,
            message: format!("{}: {e}", path.display()),
        })
    }

    /// Atomic save: serialize → `.json.tmp` sibling → `rename`.
    pub fn save(&self, path: &Path) -> Result<(), ServiceError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| service_io_err(dir, e))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| ServiceError::Decode {
            service: WORKBOOK,
            message: e.to_string(),
        })?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| service_io_err(&tmp, e))?;
        std::fs::rename(&tmp, path).map_err(|e| service_io_err(path, e))?;
        Ok(())
    }

    /// Rows of `sheet`; a missing sheet reads as empty.
    pub fn rows(&self, sheet: &str) -> &[Vec<String>] {
        self.sheets.get(sheet).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Last row holding a non-empty cell (1-based); `0` when empty.
    pub fn last_row(&self, sheet: &str) -> usize {
        self.rows(sheet)
            .iter()
            .rposition(|row| row.iter().any(|c| !c.is_empty()))
            .map_or(0, |i| i + 1)
    }
}

// ---------------------------------------------------------------------------
// 3. Workbook sink
// ---------------------------------------------------------------------------

/// Spreadsheet sink over workbook files; destination ids are file paths.
#[derive(Debug, Clone, Default)]
pub struct LocalWorkbook {
    active: Option<PathBuf>,
}

impl LocalWorkbook {
    /// Sink whose active destination is `path`.
    pub fn new(active: Option<PathBuf>) -> Self {
        Self { active }
    }

    /// Write a new workbook whose row 1 of `sheet` is the column header.
    pub fn create(path: &Path, sheet: &str, title: &str) -> Result<WorkbookFile, ServiceError> {
        let mut sheets = BTreeMap::new();
        sheets.insert(sheet.to_string(), vec![header_row()]);
        let workbook = WorkbookFile {
            title: title.to_string(),
            modified_at: Utc::now(),
            sheets,
        };
        workbook.save(path)?;
        Ok(workbook)
    }

    fn mutate(
        &self,
        id: &DestinationId,
        apply: impl FnOnce(&mut WorkbookFile),
    ) -> Result<(), ServiceError> {
        let path = Path::new(id.as_str());
        let mut workbook = WorkbookFile::load(path)?;
        apply(&mut workbook);
        workbook.modified_at = Utc::now();
        workbook.save(path)
    }
}

impl SpreadsheetSink for LocalWorkbook {
    fn resolve(&self, configured: Option<&DestinationId>) -> Result<DestinationId, ServiceError> {
        let id = match (configured, &self.active) {
            (Some(id), _) => id.clone(),
            (None, Some(path)) => DestinationId::from(path.display().to_string()),
            (None, None) => return Err(ServiceError::NoActiveDestination),
        };
        if !Path::new(id.as_str()).exists() {
            return Err(ServiceError::NotFound {
                service: WORKBOOK,
                resource: id.to_string(),
            });
        }
        Ok(id)
    }

    fn last_modified(&self, id: &DestinationId) -> Result<DateTime<Utc>, ServiceError> {
        Ok(WorkbookFile::load(Path::new(id.as_str()))?.modified_at)
    }

    fn last_row(&self, id: &DestinationId, sheet: &str) -> Result<usize, ServiceError> {
        Ok(WorkbookFile::load(Path::new(id.as_str()))?.last_row(sheet))
    }

    fn read_values(&self, id: &DestinationId, sheet: &str) -> Result<Vec<Vec<String>>, ServiceError> {
        Ok(WorkbookFile::load(Path::new(id.as_str()))?.rows(sheet).to_vec())
    }

    fn write_block(
        &mut self,
        id: &DestinationId,
        sheet: &str,
        row: usize,
        column: usize,
        values: &[Vec<String>],
    ) -> Result<(), ServiceError> {
        check_origin(row, column)?;
        self.mutate(id, |workbook| {
            let rows = workbook.sheets.entry(sheet.to_string()).or_default();
            for (offset, cells) in values.iter().enumerate() {
                let r = row - 1 + offset;
                if rows.len() <= r {
                    rows.resize(r + 1, Vec::new());
                }
                let target = &mut rows[r];
                let end = column - 1 + cells.len();
                if target.len() < end {
                    target.resize(end, String::new());
                }
                target[column - 1..end].clone_from_slice(cells);
            }
        })
    }

    fn clear_content(
        &mut self,
        id: &DestinationId,
        sheet: &str,
        row: usize,
        column: usize,
        rows: usize,
        columns: usize,
    ) -> Result<(), ServiceError> {
        check_origin(row, column)?;
        self.mutate(id, |workbook| {
            if let Some(sheet_rows) = workbook.sheets.get_mut(sheet) {
                for cells in sheet_rows.iter_mut().skip(row - 1).take(rows) {
                    for cell in cells.iter_mut().skip(column - 1).take(columns) {
                        cell.clear();
                    }
                }
            }
        })
    }

    fn rename(&mut self, id: &DestinationId, title: &str) -> Result<(), ServiceError> {
        self.mutate(id, |workbook| workbook.title = title.to_string())
    }
}

/// Sheet coordinates are 1-based.
fn check_origin(row: usize, column: usize) -> Result<(), ServiceError> {
    if row == 0 || column == 0 {
        return Err(ServiceError::Status {
            service: WORKBOOK,
            status: 400,
            message: format!("invalid cell origin row {row}, column {column}"),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
