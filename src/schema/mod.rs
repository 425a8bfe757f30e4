//! Record schema subsystem for registrar
//!
//! Tables are declared in code as explicit `TableSchema` values and
//! collected in a `Catalog`. A separate migration step pins a catalog to a
//! data directory and renders DDL for it.
//!
//! # Design Principles
//!
//! - Declaration is separate from enforcement
//! - Every write is validated against its table before it reaches storage
//! - Defaults are filled before validation, never after
//! - Deterministic validation (first violated field wins, in declaration order)

mod catalog;
mod errors;
mod migration;
mod types;
mod validator;

pub use catalog::Catalog;
pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, Severity, ValidationDetails};
pub use migration::{render_ddl, MigrationOutcome, Migrator, SchemaManifest, MANIFEST_FORMAT_VERSION};
pub use types::{
    Choice, DefaultValue, FieldDef, FieldType, OnDelete, OrderKey, TableSchema, POSITIVE_SMALL_INT_MAX,
};
pub use validator::{RowValidator, DATE_FORMAT};
