//! CLI command implementations
//!
//! Every command that touches a data directory follows the same boot
//! sequence:
//! 1. Configuration load (and logger level)
//! 2. Schema migration or verification
//! 3. Record log replay and index rebuild
//!
//! Responses go to stdout; logs go to stderr.

use std::path::Path;

use serde_json::json;

use crate::observability::{log_event_with_fields, Event, Logger};
use crate::schema::{render_ddl, Catalog, MigrationOutcome, Migrator};
use crate::university::Registrar;

use super::args::{Cli, Command};
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{read_requests, write_error, write_response, write_text};
use super::request::{dispatch, row_with_id, Request};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run a parsed command
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Migrate { config } => migrate(&config),
        Command::Schema => schema(),
        Command::Exec { config } => exec(&config),
        Command::List { config, table } => list(&config, &table),
    }
}

/// Create the data directory, pin the schema, and create an empty record log.
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let data_dir = config.data_path();

    if is_initialized(data_dir) {
        return Err(CliError::already_initialized());
    }

    let registrar = open(&config)?;
    registrar.close().map_err(|e| CliError::open_failed(e.to_string()))?;

    let manifest = Migrator::new(data_dir)
        .load_manifest()
        .map_err(|e| CliError::open_failed(e.to_string()))?
        .ok_or_else(CliError::not_initialized)?;

    write_response(json!({
        "initialized": true,
        "data_dir": config.data_dir,
        "instance_id": manifest.instance_id,
    }))
}

/// Apply the schema if the directory has none, otherwise verify it.
pub fn migrate(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let outcome = Migrator::new(config.data_path())
        .apply(&Catalog::university())
        .map_err(|e| CliError::open_failed(e.to_string()))?;

    let status = match &outcome {
        MigrationOutcome::Created(_) => "created",
        MigrationOutcome::UpToDate(_) => "up_to_date",
    };
    let manifest = outcome.manifest();

    write_response(json!({
        "migration": status,
        "fingerprint": manifest.fingerprint,
        "instance_id": manifest.instance_id,
        "tables": manifest.tables,
    }))
}

/// Print the DDL of the university schema.
pub fn schema() -> CliResult<()> {
    write_text(&render_ddl(&Catalog::university()))
}

/// Serve requests from stdin until end of input.
///
/// Rejected requests answer with an error line and serving continues.
/// A fatal error (corruption, failed write) stops the loop.
pub fn exec(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    if !is_initialized(config.data_path()) {
        return Err(CliError::not_initialized());
    }
    let mut registrar = open(&config)?;

    for line in read_requests() {
        let value = match line {
            Ok(value) => value,
            Err(e) => {
                write_error(e.code_str(), e.message())?;
                continue;
            }
        };

        let request = match Request::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                let err = CliError::bad_request(e.to_string());
                write_error(err.code_str(), err.message())?;
                continue;
            }
        };

        match dispatch(&mut registrar, request) {
            Ok(data) => write_response(data)?,
            Err(e) => {
                write_error(e.code(), &e.message())?;
                if e.is_fatal() {
                    return Err(CliError::open_failed(e.to_string()));
                }
            }
        }
    }

    registrar.close().map_err(|e| CliError::open_failed(e.to_string()))
}

/// Print every row of `table` in its declared ordering.
///
/// An undeclared table answers with an error line and fails with
/// REG_CLI_BAD_REQUEST.
pub fn list(config_path: &Path, table: &str) -> CliResult<()> {
    let config = load_config(config_path)?;
    if !is_initialized(config.data_path()) {
        return Err(CliError::not_initialized());
    }
    let registrar = open(&config)?;

    let listed = match registrar.list_rows(table) {
        Ok(rows) => {
            let rows: Vec<_> = rows.into_iter().map(|(id, row)| row_with_id(id, row)).collect();
            write_response(json!(rows))
        }
        Err(e) => {
            write_error(e.code(), &e.message())?;
            Err(CliError::bad_request(e.message()))
        }
    };

    registrar.close().map_err(|e| CliError::open_failed(e.to_string()))?;
    listed
}

fn load_config(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.severity()?);
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("config", config_path.display().to_string().as_str()),
            ("data_dir", config.data_dir.as_str()),
        ],
    );
    Ok(config)
}

fn open(config: &Config) -> CliResult<Registrar> {
    Registrar::open(config.data_path(), config.open_options()).map_err(|e| CliError::open_failed(e.to_string()))
}

fn is_initialized(data_dir: &Path) -> bool {
    Migrator::new(data_dir).manifest_path().exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_in(tmp: &TempDir) -> std::path::PathBuf {
        let path = tmp.path().join("registrar.json");
        let body = json!({
            "data_dir": tmp.path().join("db").display().to_string(),
            "fsync": false,
            "log_level": "error",
        });
        fs::write(&path, body.to_string()).unwrap();
        path
    }

    #[test]
    fn test_init_creates_layout_once() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(&tmp);

        init(&config).unwrap();
        let db = tmp.path().join("db");
        assert!(db.join("metadata").join("schema.json").exists());
        assert!(db.join("metadata").join("schema.sql").exists());
        assert!(db.join("data").join("records.dat").exists());

        let err = init(&config).unwrap_err();
        assert_eq!(err.code_str(), "REG_CLI_ALREADY_INITIALIZED");
    }

    #[test]
    fn test_exec_requires_init() {
        let tmp = TempDir::new().unwrap();
        let err = exec(&config_in(&tmp)).unwrap_err();
        assert_eq!(err.code_str(), "REG_CLI_NOT_INITIALIZED");
    }

    #[test]
    fn test_list_unknown_table_fails() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(&tmp);
        init(&config).unwrap();

        let err = list(&config, "alumni").unwrap_err();
        assert_eq!(err.code_str(), "REG_CLI_BAD_REQUEST");

        // The handle was closed cleanly; the directory still opens.
        list(&config, "student").unwrap();
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(&tmp);
        migrate(&config).unwrap();
        migrate(&config).unwrap();
        assert!(is_initialized(&tmp.path().join("db")));
    }
}
