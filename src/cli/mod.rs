//! CLI module for registrar
//!
//! Provides command-line interface for:
//! - init: Create a data directory for the university schema
//! - migrate: Apply or verify the schema manifest
//! - schema: Print the DDL
//! - exec: Serve JSON requests from stdin
//! - list: Print one table in its declared order

mod args;
mod commands;
mod config;
mod errors;
mod io;
mod request;

pub use args::{Cli, Command};
pub use commands::{exec, init, list, migrate, run, run_command, schema};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_requests, write_error, write_response, write_text};
pub use request::{dispatch, row_with_id, Request};
