//! CLI command implementations

pub mod error;
pub mod export;

pub use error::CliError;
pub use export::ExportArgs;

use clap::{Args, Parser, Subcommand};

/// Export ECB euro foreign-exchange reference rates to JSON files.
#[derive(Debug, Parser)]
#[command(name = "ecb-forex", version, about)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Export a feed to a JSON file
    Export(ExportCommand),
}

/// Export command with a feed selector.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Which feed to export
    #[command(subcommand)]
    pub feed: ExportFeed,
}

/// The feed to export
#[derive(Debug, Subcommand)]
pub enum ExportFeed {
    /// Export today's rates
    Latest(ExportArgs),
    /// Export the last-ninety-days series
    NinetyDays(ExportArgs),
    /// Export the full historic series
    Historic(ExportArgs),
}
