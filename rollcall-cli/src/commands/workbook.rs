//! `rollcall workbook`: create local workbook files.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use rollcall_core::config::{keys, DEFAULT_SHEET_NAME};
use rollcall_core::{ConfigStore, FileConfigStore};
use rollcall_sync::LocalWorkbook;

use crate::backend::home_dir;

#[derive(Subcommand, Debug)]
pub enum WorkbookCommand {
    /// Create a workbook whose sheet holds only the header row.
    Init(InitArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Workbook file to create.
    pub path: PathBuf,

    /// Sheet to create.
    #[arg(long, default_value = DEFAULT_SHEET_NAME)]
    pub sheet: String,

    /// Initial workbook title.
    #[arg(long, default_value = "Roster")]
    pub title: String,

    /// Store the workbook as the configured destination.
    #[arg(long)]
    pub activate: bool,

    /// Replace an existing file.
    #[arg(long)]
    pub force: bool,
}

pub fn run(command: WorkbookCommand) -> Result<()> {
    match command {
        WorkbookCommand::Init(args) => init(args),
    }
}

fn init(args: InitArgs) -> Result<()> {
    if args.path.exists() && !args.force {
        anyhow::bail!(
            "'{}' already exists; pass --force to replace it",
            args.path.display()
        );
    }

    LocalWorkbook::create(&args.path, &args.sheet, &args.title)
        .with_context(|| format!("failed to create workbook '{}'", args.path.display()))?;
    println!("✓ Created workbook '{}'", args.path.display());

    if args.activate {
        let path = args
            .path
            .canonicalize()
            .with_context(|| format!("cannot resolve path '{}'", args.path.display()))?;
        let mut store = FileConfigStore::open_at(&home_dir()?)
            .context("failed to open property store")?;
        store
            .set(keys::CONTACTS_SPREADSHEET_ID, &path.display().to_string())
            .context("failed to store destination")?;
        if args.sheet != DEFAULT_SHEET_NAME {
            store
                .set(keys::SHEET_NAME, &args.sheet)
                .context("failed to store sheet name")?;
        }
        println!("  {} = {}", keys::CONTACTS_SPREADSHEET_ID, path.display());
    }
    Ok(())
}
