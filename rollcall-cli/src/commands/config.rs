//! `rollcall config`: read and edit `~/.rollcall/properties.yaml`.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use rollcall_core::{ConfigStore, FileConfigStore};

use crate::backend::home_dir;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print one property.
    Get(KeyArgs),
    /// Set a property.
    Set(SetArgs),
    /// Remove a property.
    Unset(KeyArgs),
    /// Print every property.
    List,
}

#[derive(Args, Debug)]
pub struct KeyArgs {
    /// Property name, e.g. CONTACTS_SPREADSHEET_ID.
    pub key: String,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    pub key: String,
    pub value: String,
}

pub fn run(command: ConfigCommand) -> Result<()> {
    let home = home_dir()?;
    let mut store = FileConfigStore::open_at(&home).context("failed to open property store")?;

    match command {
        ConfigCommand::Get(args) => match store.get(&args.key) {
            Some(value) => println!("{value}"),
            None => anyhow::bail!("property '{}' is not set", args.key),
        },
        ConfigCommand::Set(args) => {
            store
                .set(&args.key, &args.value)
                .with_context(|| format!("failed to set '{}'", args.key))?;
            println!("✓ {} set", args.key);
        }
        ConfigCommand::Unset(args) => {
            let removed = store
                .remove(&args.key)
                .with_context(|| format!("failed to remove '{}'", args.key))?;
            if removed {
                println!("✓ {} removed", args.key);
            } else {
                println!("{} was not set", args.key);
            }
        }
        ConfigCommand::List => {
            let entries = store.entries();
            if entries.is_empty() {
                println!("No properties set in {}.", store.path().display());
            }
            for (key, value) in entries {
                println!("{key}={value}");
            }
        }
    }
    Ok(())
}
