//! Index error types
//!
//! Error codes:
//! - REG_UNIQUE_VIOLATION (REJECT)
//! - REG_INDEX_UNKNOWN_TABLE (REJECT)

use std::fmt;

use crate::records::RecordId;

/// Index-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexErrorCode {
    /// A unique or unique-together constraint would be violated
    UniqueViolation,
    /// No indexes exist for the table
    UnknownTable,
}

impl IndexErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            IndexErrorCode::UniqueViolation => "REG_UNIQUE_VIOLATION",
            IndexErrorCode::UnknownTable => "REG_INDEX_UNKNOWN_TABLE",
        }
    }
}

impl fmt::Display for IndexErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Index error type with full context
#[derive(Debug, Clone)]
pub struct IndexError {
    code: IndexErrorCode,
    message: String,
    table: String,
    fields: Vec<String>,
    holder: Option<RecordId>,
}

impl IndexError {
    /// Create a unique violation error
    pub fn unique_violation(
        table: impl Into<String>,
        fields: &[String],
        values: impl fmt::Display,
        holder: RecordId,
    ) -> Self {
        let table = table.into();
        Self {
            code: IndexErrorCode::UniqueViolation,
            message: format!(
                "{}({}) = {} already exists (record {})",
                table,
                fields.join(", "),
                values,
                holder
            ),
            table,
            fields: fields.to_vec(),
            holder: Some(holder),
        }
    }

    /// Create an unknown table error
    pub fn unknown_table(table: impl Into<String>) -> Self {
        let table = table.into();
        Self {
            code: IndexErrorCode::UnknownTable,
            message: format!("No indexes for table '{}'", table),
            table,
            fields: Vec::new(),
            holder: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> IndexErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the table name
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Fields of the violated constraint
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Record currently holding the conflicting value
    pub fn holder(&self) -> Option<RecordId> {
        self.holder
    }
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REJECT] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for IndexError {}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_display() {
        let err = IndexError::unique_violation(
            "student",
            &["email".to_string()],
            "('alice@uni.edu')",
            RecordId::new(3),
        );
        assert_eq!(err.code(), IndexErrorCode::UniqueViolation);
        assert_eq!(err.holder(), Some(RecordId::new(3)));
        let display = err.to_string();
        assert!(display.contains("REG_UNIQUE_VIOLATION"));
        assert!(display.contains("student(email)"));
    }
}
