//! University records session
//!
//! `Registrar` is the entry point applications use: typed CRUD over the
//! four university tables, enrollment helpers, display labels, and the
//! duplicate enrollment rule.
//!
//! The duplicate rule is checked here, before the write, so callers get
//! the user-facing message. The engine's unique (student_id, course_id)
//! index still guards every write independently.

mod errors;
mod registrar;

pub use errors::{RegistrarError, RegistrarResult, ValidationError, DUPLICATE_ENROLLMENT_MESSAGE};
pub use registrar::Registrar;
