//! Storage engine for registrar
//!
//! The engine is the authoritative enforcement point for storage-level
//! constraints: single-field uniqueness, composite uniqueness, reference
//! existence on write, and delete policies (cascade, set null).
//!
//! # Durability
//!
//! A persistent database is a data directory:
//!
//! ```text
//! <data_dir>/
//!   metadata/schema.json   manifest pinning the catalog
//!   metadata/schema.sql    rendered DDL
//!   data/records.dat       append-only record log
//! ```
//!
//! Opening replays the log; in-memory state is derived, never authoritative.

mod database;
mod errors;

pub use database::{Database, DeleteSummary, OpenOptions, RowRef};
pub use errors::{EngineError, EngineResult};
