//! CLI argument definitions using clap
//!
//! Commands:
//! - registrar init --config <path>
//! - registrar migrate --config <path>
//! - registrar schema
//! - registrar exec --config <path>
//! - registrar list --config <path> --table <name>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// registrar - University records with enforced constraints
#[derive(Parser, Debug)]
#[command(name = "registrar")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a data directory and pin the university schema to it
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./registrar.json")]
        config: PathBuf,
    },

    /// Apply the schema to the data directory, or verify it is current
    Migrate {
        /// Path to configuration file
        #[arg(long, default_value = "./registrar.json")]
        config: PathBuf,
    },

    /// Print the DDL of the university schema
    Schema,

    /// Execute JSON requests read line by line from stdin
    Exec {
        /// Path to configuration file
        #[arg(long, default_value = "./registrar.json")]
        config: PathBuf,
    },

    /// Print every row of one table in its declared order
    List {
        /// Path to configuration file
        #[arg(long, default_value = "./registrar.json")]
        config: PathBuf,

        /// Table to list
        #[arg(long)]
        table: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
