//! Constraint index subsystem for registrar
//!
//! Indexes are derived, in-memory-only state rebuilt from the live rows on
//! open. They are the authoritative enforcement point for uniqueness and
//! the lookup path for delete policies.
//!
//! # Design Principles
//!
//! - Derived state: indexes mirror the rows, never the source of truth
//! - Deterministic: BTreeMap iteration order, ascending record ids
//! - Nulls are never indexed and never collide

mod btree;
mod errors;
mod manager;

pub use btree::{CompositeKey, IndexKey, ReferenceTree, UniqueTree};
pub use errors::{IndexError, IndexErrorCode, IndexResult};
pub use manager::{IndexManager, TableIndexes};
