//! # rollcall-format
//!
//! Turns directory records into fixed 7-column sheet rows and renders the
//! destination title.
//!
//! ## Usage
//!
//! ```rust
//! use rollcall_core::{GroupLabel, Person};
//! use rollcall_format::{format_group, Row};
//!
//! let rows: Vec<Row> = format_group(&[Person::default()], GroupLabel::Guest);
//! assert_eq!(rows[0].name, "unk");
//! assert_eq!(rows[0].status, "Guest");
//! ```

pub mod error;
pub mod row;
pub mod title;

pub use error::FormatError;
pub use row::{format_group, format_person, header_row, Column, Row, COLUMN_COUNT};
pub use title::TitleTemplate;
