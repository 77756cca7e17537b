pub mod config;
pub mod daemon;
pub mod diff;
pub mod status;
pub mod sync;
pub mod workbook;
