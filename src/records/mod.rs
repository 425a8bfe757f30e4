//! Typed university records
//!
//! Each entity is a flat record stored as one row of its table. Rows are
//! JSON objects keyed by field name; entities convert to and from rows
//! through serde.

mod course;
mod enrollment;
mod instructor;
mod student;

use std::fmt;
use std::ops::Deref;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use course::{Course, DEFAULT_CREDITS};
pub use enrollment::{Enrollment, Grade, UnknownGrade};
pub use instructor::Instructor;
pub use student::Student;

/// A stored row: field name to JSON value, without the implicit id.
pub type Row = serde_json::Map<String, Value>;

/// Table-local identity of a stored row.
///
/// Ids start at 1 and are never reused within one database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Current local calendar date, used for date defaults.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// A record type bound to one table.
pub trait Entity: Serialize + DeserializeOwned {
    /// Table name in the catalog
    const TABLE: &'static str;

    /// Converts the record to a row.
    fn to_row(&self) -> Result<Row, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(serde::ser::Error::custom(format!(
                "{} serialized to a non-object value: {}",
                Self::TABLE,
                other
            ))),
        }
    }

    /// Reads a record back from a row.
    fn from_row(row: &Row) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(row.clone()))
    }
}

/// A record together with its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stored<T> {
    pub id: RecordId,
    pub record: T,
}

impl<T> Stored<T> {
    pub fn new(id: RecordId, record: T) -> Self {
        Self { id, record }
    }

    pub fn into_inner(self) -> T {
        self.record
    }
}

impl<T> Deref for Stored<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.record
    }
}

impl<T: fmt::Display> fmt::Display for Stored<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.record.fmt(f)
    }
}
