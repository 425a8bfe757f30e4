//! Observable events for registrar
//!
//! Events are explicit and typed.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Configuration loaded
    ConfigLoaded,
    /// Database handle opened
    DatabaseOpened,
    /// Database handle closed
    DatabaseClosed,
    /// Record log replayed into memory
    LogReplayed,
    /// Record log corruption detected (FATAL)
    LogCorruption,

    // Schema
    /// Manifest written for a new data directory
    SchemaMigrated,
    /// Manifest matched the catalog
    SchemaVerified,
    /// Manifest did not match the catalog (FATAL)
    SchemaDrift,

    // Writes
    /// Row inserted
    RecordCreated,
    /// Row replaced
    RecordUpdated,
    /// Row deleted
    RecordDeleted,
    /// Delete policy removed or nullified dependent rows
    CascadeApplied,

    // Rejections
    /// Application-level validation refused a write
    ValidationRejected,
    /// Storage-level constraint refused a write
    ConstraintRejected,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::DatabaseOpened => "DATABASE_OPENED",
            Event::DatabaseClosed => "DATABASE_CLOSED",
            Event::LogReplayed => "LOG_REPLAYED",
            Event::LogCorruption => "LOG_CORRUPTION",
            Event::SchemaMigrated => "SCHEMA_MIGRATED",
            Event::SchemaVerified => "SCHEMA_VERIFIED",
            Event::SchemaDrift => "SCHEMA_DRIFT",
            Event::RecordCreated => "RECORD_CREATED",
            Event::RecordUpdated => "RECORD_UPDATED",
            Event::RecordDeleted => "RECORD_DELETED",
            Event::CascadeApplied => "CASCADE_APPLIED",
            Event::ValidationRejected => "VALIDATION_REJECTED",
            Event::ConstraintRejected => "CONSTRAINT_REJECTED",
        }
    }

    /// Returns whether this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::LogCorruption | Event::SchemaDrift)
    }

    /// Returns whether this event is a refused write
    pub fn is_rejection(&self) -> bool {
        matches!(self, Event::ValidationRejected | Event::ConstraintRejected)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_strings() {
        assert_eq!(Event::RecordCreated.as_str(), "RECORD_CREATED");
        assert_eq!(Event::CascadeApplied.to_string(), "CASCADE_APPLIED");
    }

    #[test]
    fn test_fatal_events() {
        assert!(Event::LogCorruption.is_fatal());
        assert!(Event::SchemaDrift.is_fatal());
        assert!(!Event::RecordDeleted.is_fatal());
    }

    #[test]
    fn test_rejection_events() {
        assert!(Event::ValidationRejected.is_rejection());
        assert!(Event::ConstraintRejected.is_rejection());
        assert!(!Event::RecordCreated.is_rejection());
    }
}
