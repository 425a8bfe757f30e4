//! # Engine Errors

use thiserror::Error;

use crate::index::IndexError;
use crate::records::RecordId;
use crate::schema::SchemaError;
use crate::storage::StorageError;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("[REJECT] REG_FOREIGN_KEY_VIOLATION: {table}.{field} references missing {target} {id}")]
    ForeignKeyViolation {
        table: String,
        field: String,
        target: String,
        id: RecordId,
    },

    #[error("[REJECT] REG_NOT_FOUND: {table} {id} does not exist")]
    NotFound { table: String, id: RecordId },
}

impl EngineError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Schema(e) => e.code().code(),
            EngineError::Index(e) => e.code().code(),
            EngineError::Storage(e) => e.code().code(),
            EngineError::ForeignKeyViolation { .. } => "REG_FOREIGN_KEY_VIOLATION",
            EngineError::NotFound { .. } => "REG_NOT_FOUND",
        }
    }

    /// Storage-level constraint rejections (uniqueness, reference existence)
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, EngineError::Index(_) | EngineError::ForeignKeyViolation { .. })
    }

    /// The database must not be used after a fatal error
    pub fn is_fatal(&self) -> bool {
        match self {
            EngineError::Schema(e) => e.is_fatal(),
            EngineError::Storage(e) => e.is_fatal(),
            _ => false,
        }
    }

    pub(crate) fn not_found(table: &str, id: RecordId) -> Self {
        EngineError::NotFound {
            table: table.to_string(),
            id,
        }
    }
}
