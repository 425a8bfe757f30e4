//! Observability subsystem for registrar
//!
//! - Structured logging (JSON lines on stderr)
//! - Typed lifecycle events
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. No async or background threads
//! 4. Deterministic output
//!
//! # Usage
//!
//! ```ignore
//! use registrar::observability::{log_event_with_fields, Event, Logger};
//!
//! Logger::info("CUSTOM_EVENT", &[("rows", "42")]);
//! log_event_with_fields(Event::RecordCreated, &[("table", "student"), ("id", "1")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

fn severity_for(event: Event) -> Severity {
    if event.is_fatal() {
        Severity::Fatal
    } else if event.is_rejection() {
        Severity::Warn
    } else {
        Severity::Info
    }
}

/// Log a lifecycle event
pub fn log_event(event: Event) {
    Logger::log(severity_for(event), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(severity_for(event), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_severity_mapping() {
        assert_eq!(severity_for(Event::SchemaDrift), Severity::Fatal);
        assert_eq!(severity_for(Event::ValidationRejected), Severity::Warn);
        assert_eq!(severity_for(Event::RecordCreated), Severity::Info);
    }

    #[test]
    fn test_log_event() {
        // Verifies no panic
        log_event(Event::DatabaseOpened);
        log_event_with_fields(Event::RecordCreated, &[("table", "student"), ("id", "1")]);
    }
}
