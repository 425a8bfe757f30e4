//! # Registrar Errors

use thiserror::Error;

use crate::engine::EngineError;

/// Result type for registrar operations
pub type RegistrarResult<T> = Result<T, RegistrarError>;

/// Message of the duplicate enrollment rule
pub const DUPLICATE_ENROLLMENT_MESSAGE: &str = "This student is already enrolled in this course.";

/// An application-level rule refused a write.
///
/// Carries the user-facing message unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    /// Stable error code
    pub const CODE: &'static str = "REG_VALIDATION_ERROR";

    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The student already holds an enrollment in the course
    pub fn duplicate_enrollment() -> Self {
        Self::new(DUPLICATE_ENROLLMENT_MESSAGE)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> &'static str {
        Self::CODE
    }
}

/// Registrar errors
#[derive(Debug, Error)]
pub enum RegistrarError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("[REJECT] REG_RECORD_DECODE: {0}")]
    Record(#[from] serde_json::Error),
}

impl RegistrarError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            RegistrarError::Validation(e) => e.code(),
            RegistrarError::Engine(e) => e.code(),
            RegistrarError::Record(_) => "REG_RECORD_DECODE",
        }
    }

    /// Message without the code prefix for validation failures
    pub fn message(&self) -> String {
        match self {
            RegistrarError::Validation(e) => e.message().to_string(),
            other => other.to_string(),
        }
    }

    /// The application-level rule refused the write
    pub fn is_validation(&self) -> bool {
        matches!(self, RegistrarError::Validation(_))
    }

    /// The engine's storage-level constraints refused the write
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, RegistrarError::Engine(e) if e.is_constraint_violation())
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, RegistrarError::Engine(e) if e.is_fatal())
    }
}
