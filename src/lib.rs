//! registrar - University records with a declared schema and enforced constraints
//!
//! Four record types (students, instructors, courses, enrollments) are
//! declared as explicit table schemas. Every write is validated against
//! its table, checked against storage-level constraints, and appended to a
//! checksummed record log.

pub mod cli;
pub mod engine;
pub mod index;
pub mod observability;
pub mod records;
pub mod schema;
pub mod storage;
pub mod university;

pub use engine::{Database, DeleteSummary, EngineError, OpenOptions};
pub use records::{Course, Enrollment, Entity, Grade, Instructor, RecordId, Row, Stored, Student};
pub use schema::Catalog;
pub use university::{Registrar, RegistrarError, ValidationError};
