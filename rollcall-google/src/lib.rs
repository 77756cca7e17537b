//! # rollcall-google
//!
//! Blocking HTTP implementations of the collaborator ports:
//!
//! - [`DirectoryService`](rollcall_core::DirectoryService) over People API v1
//! - [`SpreadsheetSink`](rollcall_core::SpreadsheetSink) over Sheets API v4,
//!   with Drive API v3 for the file's modification time
//!
//! Authentication is a caller-supplied OAuth bearer token. Calls are never
//! retried; failures map onto [`ServiceError`](rollcall_core::ServiceError).

mod a1;
pub mod client;
mod people;
mod sheets;

pub use a1::{a1_range, column_letters};
pub use client::{Endpoints, GoogleClient};
