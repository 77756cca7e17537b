//! Rollcall: keep a roster spreadsheet in step with directory contact groups.
//!
//! # Usage
//!
//! ```text
//! rollcall sync [forceUpdate] [--force] [--dry-run]
//! rollcall status [--json]
//! rollcall diff
//! rollcall config get|set|unset|list
//! rollcall workbook init <path> [--sheet <name>] [--title <title>] [--activate]
//! rollcall daemon start|install|uninstall|plist [--every <secs>]
//! ```
//!
//! Global flags select the backend: `--backend google` (default; needs
//! `ROLLCALL_ACCESS_TOKEN`) or `--backend local --directory <snapshot.json>
//! [--workbook <workbook.json>]`.

mod backend;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use backend::GlobalArgs;
use commands::{
    config::ConfigCommand, daemon::DaemonCommand, diff::DiffArgs, status::StatusArgs,
    sync::SyncArgs, workbook::WorkbookCommand,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "rollcall",
    version,
    about = "Sync directory contact groups into a roster spreadsheet",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rebuild the roster sheet when the directory changed.
    Sync(SyncArgs),

    /// Evaluate the change gate without writing anything.
    Status(StatusArgs),

    /// Show a unified diff of what a forced sync would write.
    Diff(DiffArgs),

    /// Read and edit the property store.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Manage local workbook files.
    Workbook {
        #[command(subcommand)]
        command: WorkbookCommand,
    },

    /// Run syncs on a schedule or manage the launchd agent.
    Daemon {
        #[command(subcommand)]
        command: DaemonCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    rollcall_daemon::init_tracing(cli.global.log_directive());

    match cli.command {
        Commands::Sync(args) => args.run(&cli.global),
        Commands::Status(args) => args.run(&cli.global),
        Commands::Diff(args) => args.run(&cli.global),
        Commands::Config { command } => commands::config::run(command),
        Commands::Workbook { command } => commands::workbook::run(command),
        Commands::Daemon { command } => commands::daemon::run(command, &cli.global),
    }
}
