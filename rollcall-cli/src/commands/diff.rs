//! `rollcall diff`: show what a forced sync would change in the sheet.

use anyhow::{Context, Result};
use clap::Args;

use rollcall_sync::diff_destination;

use crate::backend::GlobalArgs;

/// Arguments for `rollcall diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {}

impl DiffArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let session = global.open()?;
        let diff = diff_destination(
            &*session.directory,
            &*session.sink,
            &session.config,
            session.identity.as_deref(),
        )
        .context("diff failed")?;

        if diff.is_empty() {
            println!("No differences for '{}' ({}).", diff.destination, diff.sheet);
            return Ok(());
        }

        print!("{}", diff.unified_diff);
        if !diff.unified_diff.ends_with('\n') {
            println!();
        }
        Ok(())
    }
}
