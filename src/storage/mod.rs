//! Record log storage subsystem for registrar
//!
//! A durable database keeps every row version in one append-only log.
//! The in-memory tables are rebuilt by replaying it on open.
//!
//! # Design Principles
//!
//! - Append-only (no in-place updates)
//! - Checksum-verified on every read
//! - Latest record wins for the same (table, id)
//! - Halt on corruption: a damaged log is never partially loaded

mod checksum;
mod errors;
mod reader;
mod record;
mod writer;

pub use checksum::{compute_checksum, verify_checksum};
pub use errors::{Severity, StorageError, StorageErrorCode, StorageResult};
pub use reader::{replay, StorageReader};
pub use record::{LogRecord, MIN_RECORD_SIZE};
pub use writer::{log_path, StorageWriter, LOG_FILE_NAME};
