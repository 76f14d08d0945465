//! Macsweep CLI - macOS maintenance utility
//!
//! Usage: macsweep [COMMAND]
//!
//! Commands:
//!   scan   Report reclaimable space without changing anything
//!   clean  Interactively select and apply cleanup actions (default)

use anyhow::Result;
use clap::{Parser, Subcommand};

use macsweep::config::ColorMode;

mod commands;

use commands::clean::CleanOptions;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ColorWhen {
    Auto,
    Always,
    Never,
}

impl From<ColorWhen> for ColorMode {
    fn from(when: ColorWhen) -> Self {
        match when {
            ColorWhen::Auto => ColorMode::Auto,
            ColorWhen::Always => ColorMode::Always,
            ColorWhen::Never => ColorMode::Never,
        }
    }
}

/// Macsweep - reclaim disk space on macOS
#[derive(Parser, Debug)]
#[command(name = "macsweep")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output format for CI
    #[arg(long, default_value = "false")]
    json: bool,

    /// Color output mode
    #[arg(long, global = true, value_enum)]
    color: Option<ColorWhen>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report reclaimable space without changing anything
    Scan,

    /// Interactively select and apply cleanup actions
    Clean {
        /// Skip confirmation prompts for unsafe entries
        #[arg(short, long)]
        yes: bool,

        /// Preselect every entry
        #[arg(long)]
        all: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let color = cli.color.map(ColorMode::from);

    match cli.command {
        Some(Commands::Scan) => commands::scan::cmd_scan(cli.json, cli.verbose),
        Some(Commands::Clean { yes, all }) => {
            commands::clean::cmd_clean(CleanOptions { yes, all, color }, cli.verbose)
        }
        None => commands::clean::cmd_clean(
            CleanOptions {
                color,
                ..CleanOptions::default()
            },
            cli.verbose,
        ),
    }
}
