//! Domain types for directory groups, people, and the destination sheet.
//!
//! Directory records keep the camelCase field names of the people-directory
//! payloads, so API responses and local snapshot files deserialize straight
//! into these structs. Every optional directory field is modelled as
//! `Option` or an empty `Vec`; defaulting happens in the formatter, never here.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_newtype!(
    /// Opaque contact-group handle, e.g. `contactGroups/1cf9f5348e22c8b7`.
    GroupId
);
string_newtype!(
    /// Opaque person handle, e.g. `people/c12345`.
    ResourceName
);
string_newtype!(
    /// Spreadsheet identifier (remote file id or local workbook path).
    DestinationId
);
string_newtype!(
    /// Cursor into the directory's incremental-changes feed.
    SyncToken
);

// ---------------------------------------------------------------------------
// Group labels
// ---------------------------------------------------------------------------

/// The fixed set of roster partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupLabel {
    Active,
    Guest,
    Student,
    Inactive,
}

impl GroupLabel {
    /// Groups in sheet write order.
    pub fn ordered() -> &'static [GroupLabel] {
        &[
            GroupLabel::Active,
            GroupLabel::Guest,
            GroupLabel::Student,
            GroupLabel::Inactive,
        ]
    }

    /// Status text written into the sheet.
    pub fn label(self) -> &'static str {
        match self {
            GroupLabel::Active => "Active",
            GroupLabel::Guest => "Guest",
            GroupLabel::Student => "Student",
            GroupLabel::Inactive => "Inactive",
        }
    }

    /// Property key holding the group's resource identifier override.
    pub fn config_key(self) -> &'static str {
        match self {
            GroupLabel::Active => "RESOURCE_NAME_ACTIVE",
            GroupLabel::Guest => "RESOURCE_NAME_GUEST",
            GroupLabel::Student => "RESOURCE_NAME_STUDENT",
            GroupLabel::Inactive => "RESOURCE_NAME_INACTIVE",
        }
    }

    /// Built-in group identifier used when no override is configured.
    pub fn default_resource(self) -> GroupId {
        let id = match self {
            GroupLabel::Active => "contactGroups/1cf9f5348e22c8b7",
            GroupLabel::Guest => "contactGroups/3c82995f899da957",
            GroupLabel::Student => "contactGroups/5d7c7a9d8e0c906d",
            GroupLabel::Inactive => "contactGroups/3a3fa8fc0d6be183",
        };
        GroupId::from(id)
    }

    /// Case-insensitive lookup by label text.
    pub fn from_name(name: &str) -> Option<GroupLabel> {
        GroupLabel::ordered()
            .iter()
            .copied()
            .find(|label| label.label().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for GroupLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Directory records
// ---------------------------------------------------------------------------

/// Group metadata as returned by the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted: bool,
}

/// A contact group with its (possibly truncated) member list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactGroup {
    pub resource_name: GroupId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub member_count: u32,
    #[serde(default)]
    pub member_resource_names: Vec<ResourceName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<GroupMetadata>,
}

impl ContactGroup {
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.metadata.as_ref().and_then(|m| m.update_time)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name_last_first: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneNumber {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Provenance entry; the first source carries the record's latest edit time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonMetadata {
    #[serde(default)]
    pub sources: Vec<Source>,
}

/// One directory record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<ResourceName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<PersonName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub organizations: Vec<Organization>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phone_numbers: Vec<PhoneNumber>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<Address>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PersonMetadata>,
}

impl Person {
    /// Most recent modification time: the first provenance entry's update
    /// time, or the Unix epoch when absent.
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.metadata
            .as_ref()
            .and_then(|m| m.sources.first())
            .and_then(|s| s.update_time)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

/// Outcome of reading one group from the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupMembers {
    Fetched {
        group: ContactGroup,
        people: Vec<Person>,
    },
    /// The fetch failed; treated as a group with no people.
    Absent { reason: String },
}

impl GroupMembers {
    pub fn people(&self) -> &[Person] {
        match self {
            GroupMembers::Fetched { people, .. } => people,
            GroupMembers::Absent { .. } => &[],
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, GroupMembers::Absent { .. })
    }
}

/// Result of an incremental-changes query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionChanges {
    /// Connections added, removed or edited since the supplied token.
    pub changed: u64,
    pub next_token: Option<SyncToken>,
}

/// Destination sheet snapshot taken at run start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub id: DestinationId,
    pub last_modified: DateTime<Utc>,
    /// Last occupied row (1-based); `0` for an empty sheet, `1` for header only.
    pub last_row: usize,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
