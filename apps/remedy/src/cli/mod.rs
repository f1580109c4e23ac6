//! # Remedy CLI Module
//!
//! This module implements the CLI interface for Remedy.
//!
//! ## Available Commands
//!
//! - `categories` - List equipment categories
//! - `faults` - List the faults of a category
//! - `show` - Show a fault's details and direct steps
//! - `plan` - Show the procedures selected for a fault
//! - `guide` - Walk through a fault's checklist interactively
//! - `check` - Validate a deployment file
//! - `server` - Start the HTTP server
//!
//! Every command accepts `--machine` or `--config` to pick the deployment.

mod commands;

use crate::config::ConfigSource;
use clap::{Parser, Subcommand};
use remedy_core::{Machine, RemedyError};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Remedy - Guided Equipment Troubleshooting
///
/// Selects remediation procedures for a fault and walks an operator through
/// them as one checklist.
#[derive(Parser, Debug)]
#[command(name = "remedy")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Deployment file, or a built-in machine name (defaults to REMEDY_CONFIG, then hemodialysis)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Built-in machine deployment: pms, hemodialysis, up7000
    #[arg(short, long, global = true, conflicts_with = "config")]
    pub machine: Option<Machine>,

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
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// List equipment categories
    Categories,

    /// List the faults of a category
    Faults {
        /// Category name
        category: String,
    },

    /// Show a fault's indication, causes, impact and direct steps
    Show {
        /// Category name
        category: String,

        /// Fault name
        fault: String,
    },

    /// Show the procedures selected for a fault
    Plan {
        /// Category name
        category: String,

        /// Fault name
        fault: String,
    },

    /// Walk through a fault's checklist interactively (reads commands from stdin)
    Guide {
        /// Category name
        category: String,

        /// Fault name
        fault: String,
    },

    /// Validate a deployment file without starting anything
    Check {
        /// Deployment file or built-in machine name (defaults to --config/--machine)
        file: Option<PathBuf>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), RemedyError> {
    let json_mode = cli.json_mode;
    let source = cli
        .machine
        .map(ConfigSource::Builtin)
        .or_else(|| cli.config.as_deref().map(ConfigSource::from_arg));
    let config = source.as_ref();

    match cli.command {
        Some(Commands::Server { host, port }) => cmd_server(config, &host, port).await,
        Some(Commands::Categories) | None => cmd_categories(config, json_mode),
        Some(Commands::Faults { category }) => cmd_faults(config, json_mode, &category),
        Some(Commands::Show { category, fault }) => cmd_show(config, json_mode, &category, &fault),
        Some(Commands::Plan { category, fault }) => cmd_plan(config, json_mode, &category, &fault),
        Some(Commands::Guide { category, fault }) => {
            cmd_guide(config, json_mode, &category, &fault)
        }
        Some(Commands::Check { file }) => {
            let file = file.as_deref().map(ConfigSource::from_arg);
            cmd_check(file.as_ref().or(config), json_mode)
        }
    }
}
