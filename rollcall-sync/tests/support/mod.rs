//! In-memory collaborators shared by the sync integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use rollcall_core::{
    ConnectionChanges, ContactGroup, DestinationId, DirectoryService, GroupId, GroupLabel, Person,
    ResourceName, ServiceError, SpreadsheetSink, SyncToken,
};

/// Route `log` records to the test harness; `RUST_LOG=debug` shows them.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .expect("valid date")
}

pub fn person(json: &str) -> Person {
    serde_json::from_str(json).expect("person fixture")
}

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

/// Directory fake. The feed reports `full_count` changes for any token other
/// than `token`, and zero for `token` itself. It hands out `advance_to` as
/// the next token when set, `token` otherwise.
pub struct FakeDirectory {
    groups: BTreeMap<String, ContactGroup>,
    people: BTreeMap<String, Person>,
    pub token: String,
    pub advance_to: Option<String>,
    pub full_count: u64,
    pub failing_groups: Vec<GroupId>,
    pub feed_calls: Cell<usize>,
    pub batch_calls: Cell<usize>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self {
            groups: BTreeMap::new(),
            people: BTreeMap::new(),
            token: "tok-1".to_string(),
            advance_to: None,
            full_count: 1,
            failing_groups: Vec::new(),
            feed_calls: Cell::new(0),
            batch_calls: Cell::new(0),
        }
    }

    /// Add `people` as the members of `label`'s default group.
    pub fn with_group(mut self, label: GroupLabel, people: Vec<Person>) -> Self {
        let id = label.default_resource();
        let names: Vec<ResourceName> = people
            .iter()
            .enumerate()
            .map(|(i, p)| {
                p.resource_name
                    .clone()
                    .unwrap_or_else(|| ResourceName::from(format!("people/{label}-{i}")))
            })
            .collect();
        for (name, mut p) in names.iter().cloned().zip(people) {
            p.resource_name = Some(name.clone());
            self.people.insert(name.0, p);
        }
        self.groups.insert(
            id.0.clone(),
            ContactGroup {
                resource_name: id,
                name: Some(label.label().to_string()),
                member_count: names.len() as u32,
                member_resource_names: names,
                metadata: None,
            },
        );
        self
    }

    pub fn failing(mut self, label: GroupLabel) -> Self {
        self.failing_groups.push(label.default_resource());
        self
    }
}

impl DirectoryService for FakeDirectory {
    fn contact_group(
        &self,
        id: &GroupId,
        max_members: u32,
        _quota_user: &str,
    ) -> Result<ContactGroup, ServiceError> {
        if self.failing_groups.contains(id) {
            return Err(ServiceError::QuotaExceeded {
                service: "fake",
                message: "too many requests".to_string(),
            });
        }
        let mut group = self.groups.get(id.as_str()).cloned().ok_or(ServiceError::NotFound {
            service: "fake",
            resource: id.to_string(),
        })?;
        group.member_resource_names.truncate(max_members as usize);
        Ok(group)
    }

    fn batch_get_people(
        &self,
        resource_names: &[ResourceName],
        _fields: &[&str],
        _quota_user: &str,
    ) -> Result<Vec<Person>, ServiceError> {
        self.batch_calls.set(self.batch_calls.get() + 1);
        Ok(resource_names
            .iter()
            .filter_map(|n| self.people.get(n.as_str()).cloned())
            .collect())
    }

    fn list_connection_changes(
        &self,
        token: Option<&SyncToken>,
        _quota_user: &str,
    ) -> Result<ConnectionChanges, ServiceError> {
        self.feed_calls.set(self.feed_calls.get() + 1);
        let changed = match token {
            Some(t) if t.as_str() == self.token => 0,
            _ => self.full_count,
        };
        Ok(ConnectionChanges {
            changed,
            next_token: Some(SyncToken::from(
                self.advance_to.as_deref().unwrap_or(&self.token),
            )),
        })
    }
}

// ---------------------------------------------------------------------------
// Sheet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetCall {
    Write { row: usize, rows: Vec<Vec<String>> },
    Clear { row: usize, rows: usize, columns: usize },
    Rename(String),
}

/// Single-sheet spreadsheet fake recording every mutation.
pub struct MemorySheet {
    pub id: DestinationId,
    pub title: String,
    pub cells: Vec<Vec<String>>,
    pub modified_at: DateTime<Utc>,
    /// Time stamped onto `modified_at` by every mutation.
    pub clock: DateTime<Utc>,
    pub calls: RefCell<Vec<SheetCall>>,
}

impl MemorySheet {
    pub fn new(modified_at: DateTime<Utc>) -> Self {
        Self {
            id: DestinationId::from("sheet-1"),
            title: "Untitled".to_string(),
            cells: vec![rollcall_format::header_row()],
            modified_at,
            clock: at(2030, 1, 1),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_rows(mut self, rows: &[&[&str]]) -> Self {
        self.cells
            .extend(rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()));
        self
    }

    pub fn mutations(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn row(&self, n: usize) -> Vec<String> {
        self.cells.get(n - 1).cloned().unwrap_or_default()
    }

    fn touch(&mut self, call: SheetCall) {
        self.calls.borrow_mut().push(call);
        self.modified_at = self.clock;
    }
}

impl SpreadsheetSink for MemorySheet {
    fn resolve(&self, configured: Option<&DestinationId>) -> Result<DestinationId, ServiceError> {
        match configured {
            Some(id) if id != &self.id => Err(ServiceError::NotFound {
                service: "memory",
                resource: id.to_string(),
            }),
            _ => Ok(self.id.clone()),
        }
    }

    fn last_modified(&self, _id: &DestinationId) -> Result<DateTime<Utc>, ServiceError> {
        Ok(self.modified_at)
    }

    fn last_row(&self, _id: &DestinationId, _sheet: &str) -> Result<usize, ServiceError> {
        Ok(self
            .cells
            .iter()
            .rposition(|r| r.iter().any(|c| !c.is_empty()))
            .map_or(0, |i| i + 1))
    }

    fn read_values(&self, _id: &DestinationId, _sheet: &str) -> Result<Vec<Vec<String>>, ServiceError> {
        Ok(self.cells.clone())
    }

    fn write_block(
        &mut self,
        _id: &DestinationId,
        _sheet: &str,
        row: usize,
        column: usize,
        values: &[Vec<String>],
    ) -> Result<(), ServiceError> {
        assert_eq!(column, 1, "blocks always start in column 1");
        for (offset, cells) in values.iter().enumerate() {
            let r = row - 1 + offset;
            if self.cells.len() <= r {
                self.cells.resize(r + 1, Vec::new());
            }
            self.cells[r] = cells.clone();
        }
        self.touch(SheetCall::Write {
            row,
            rows: values.to_vec(),
        });
        Ok(())
    }

    fn clear_content(
        &mut self,
        _id: &DestinationId,
        _sheet: &str,
        row: usize,
        _column: usize,
        rows: usize,
        columns: usize,
    ) -> Result<(), ServiceError> {
        for cells in self.cells.iter_mut().skip(row - 1).take(rows) {
            for cell in cells.iter_mut().take(columns) {
                cell.clear();
            }
        }
        self.touch(SheetCall::Clear { row, rows, columns });
        Ok(())
    }

    fn rename(&mut self, _id: &DestinationId, title: &str) -> Result<(), ServiceError> {
        self.title = title.to_string();
        self.touch(SheetCall::Rename(title.to_string()));
        Ok(())
    }
}
