//! # ctxpool CLI Module
//!
//! ## Available Commands
//!
//! - `fingerprint` - Validate and fingerprint an interface catalog
//! - `topology` - Show the wiring of a computer configuration
//! - `audit` - Report which contexts each plugin can discover

mod commands;

use clap::{CommandFactory, Parser, Subcommand};
use ctxpool_core::PoolError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// ctxpool - context broker host tooling
///
/// Inspects the context interfaces and wiring of a hosted virtual computer.
#[derive(Parser, Debug)]
#[command(name = "ctxpool")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate and fingerprint every interface of a catalog
    Fingerprint {
        /// Path to the interface catalog (TOML)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show plugins and connections of a computer configuration
    Topology {
        /// Path to the computer configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Register every plugin's contexts and report what each plugin can see
    Audit {
        /// Path to the computer configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Path to the interface catalog (TOML)
        #[arg(short, long)]
        file: PathBuf,

        /// Only report for this plugin ID
        #[arg(short, long)]
        requester: Option<u64>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), PoolError> {
    let json_mode = cli.json_mode;
    let verbose = cli.verbose;

    match cli.command {
        Some(Commands::Fingerprint { file }) => cmd_fingerprint(&file, json_mode, verbose),
        Some(Commands::Topology { config }) => cmd_topology(&config, json_mode),
        Some(Commands::Audit {
            config,
            file,
            requester,
        }) => cmd_audit(&config, &file, requester, json_mode),
        None => Cli::command()
            .print_help()
            .map_err(|e| PoolError::Io(e.to_string())),
    }
}
