//! Schema error types
//!
//! Error codes:
//! - REG_UNKNOWN_TABLE (REJECT)
//! - REG_SCHEMA_VALIDATION_FAILED (REJECT)
//! - REG_SCHEMA_MALFORMED (FATAL)
//! - REG_SCHEMA_DRIFT (FATAL)

use std::fmt;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client request rejected
    Reject,
    /// The database must not be opened
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Table name not declared in the catalog
    UnknownTable,
    /// Row violates its table declaration
    ValidationFailed,
    /// Catalog or manifest is structurally invalid
    Malformed,
    /// Stored manifest does not match the catalog in use
    Drift,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::UnknownTable => "REG_UNKNOWN_TABLE",
            SchemaErrorCode::ValidationFailed => "REG_SCHEMA_VALIDATION_FAILED",
            SchemaErrorCode::Malformed => "REG_SCHEMA_MALFORMED",
            SchemaErrorCode::Drift => "REG_SCHEMA_DRIFT",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            SchemaErrorCode::UnknownTable | SchemaErrorCode::ValidationFailed => Severity::Reject,
            SchemaErrorCode::Malformed | SchemaErrorCode::Drift => Severity::Fatal,
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Validation failure details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDetails {
    /// Field name ("$row" for the row itself)
    pub field: String,
    /// Expected type or condition
    pub expected: String,
    /// Actual value or type found
    pub actual: String,
}

impl ValidationDetails {
    pub fn new(field: impl Into<String>, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::new(field, "field to be present", "missing")
    }

    pub fn extra_field(field: impl Into<String>) -> Self {
        Self::new(field, "no undeclared fields", "extra field present")
    }

    pub fn null_value(field: impl Into<String>) -> Self {
        Self::new(field, "non-null value", "null")
    }

    pub fn blank_value(field: impl Into<String>) -> Self {
        Self::new(field, "non-blank value", "empty string")
    }

    pub fn too_long(field: impl Into<String>, max_length: usize, actual: usize) -> Self {
        Self::new(
            field,
            format!("at most {} characters", max_length),
            format!("{} characters", actual),
        )
    }
}

impl fmt::Display for ValidationDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}': expected {}, got {}", self.field, self.expected, self.actual)
    }
}

/// Schema error type with full context
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    table: Option<String>,
    details: Option<ValidationDetails>,
}

impl SchemaError {
    /// Create an unknown table error
    pub fn unknown_table(table: impl Into<String>) -> Self {
        let table = table.into();
        Self {
            code: SchemaErrorCode::UnknownTable,
            message: format!("Table '{}' is not declared", table),
            table: Some(table),
            details: None,
        }
    }

    /// Create a row validation error
    pub fn validation_failed(table: impl Into<String>, details: ValidationDetails) -> Self {
        let table = table.into();
        Self {
            code: SchemaErrorCode::ValidationFailed,
            message: format!("Row for '{}' failed validation: {}", table, details),
            table: Some(table),
            details: Some(details),
        }
    }

    /// Create a malformed catalog or manifest error
    pub fn malformed(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::Malformed,
            message: format!("Malformed schema '{}': {}", origin.into(), reason.into()),
            table: None,
            details: None,
        }
    }

    /// Create a schema drift error
    pub fn drift(stored: impl Into<String>, current: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::Drift,
            message: format!(
                "Stored schema fingerprint {} does not match catalog fingerprint {}",
                stored.into(),
                current.into()
            ),
            table: None,
            details: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the table name if applicable
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Returns validation details if applicable
    pub fn details(&self) -> Option<&ValidationDetails> {
        self.details.as_ref()
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
