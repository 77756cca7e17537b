//! Rollcall core library: domain types, collaborator ports, configuration.
//!
//! Public API surface:
//! - [`types`]: newtypes and directory/sheet domain structs
//! - [`ports`]: capability traits for the directory service and spreadsheet sink
//! - [`config`]: property store trait, file-backed store, resolved settings
//! - [`error`]: [`ConfigError`], [`ServiceError`]

pub mod config;
pub mod error;
pub mod ports;
pub mod types;

pub use config::{ConfigStore, FileConfigStore, GroupIds, MemoryConfigStore, SyncSettings};
pub use error::{ConfigError, ServiceError};
pub use ports::{DirectoryService, SpreadsheetSink};
pub use types::{
    ConnectionChanges, ContactGroup, Destination, DestinationId, GroupId, GroupLabel,
    GroupMembers, Person, ResourceName, SyncToken,
};
