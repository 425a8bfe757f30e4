//! The database handle
//!
//! `Database` owns every table's live rows, the constraint indexes, and the
//! record log writer. It is the only path by which rows are written.
//!
//! Write path, for every mutation:
//! 1. Fill absent fields (creation defaults on insert, stored values on
//!    update) and validate the row against its table
//! 2. Check reference existence and uniqueness
//! 3. Append the mutation (and its delete policy effects) to the log
//! 4. Apply it to memory and indexes
//!
//! A failure in steps 1-3 leaves both memory and log untouched.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use super::errors::{EngineError, EngineResult};
use crate::index::IndexManager;
use crate::observability::{log_event_with_fields, Event};
use crate::records::{today, RecordId, Row};
use crate::schema::{Catalog, MigrationOutcome, Migrator, OnDelete, OrderKey, RowValidator, SchemaError, SchemaErrorCode};
use crate::storage::{self, LogRecord, StorageError, StorageWriter};

/// Options for opening a persistent database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    /// fsync the record log after every mutation
    pub sync_on_write: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self { sync_on_write: true }
    }
}

/// A row touched by a delete
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct RowRef {
    pub table: String,
    pub id: RecordId,
}

impl RowRef {
    fn new(table: &str, id: RecordId) -> Self {
        Self {
            table: table.to_string(),
            id,
        }
    }
}

/// Everything a delete removed or nullified, in the order it was found
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteSummary {
    /// The requested row first, then cascaded rows
    pub deleted: Vec<RowRef>,
    /// Rows kept with a reference cleared
    pub nullified: Vec<RowRef>,
}

#[derive(Debug)]
struct Table {
    rows: BTreeMap<RecordId, Row>,
    next_id: u64,
}

impl Table {
    fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

/// Explicit storage handle for one catalog
pub struct Database {
    catalog: Catalog,
    tables: HashMap<String, Table>,
    indexes: IndexManager,
    storage: Option<StorageWriter>,
    data_dir: Option<PathBuf>,
}

impl Database {
    fn empty(catalog: Catalog) -> Self {
        let tables = catalog
            .tables()
            .iter()
            .map(|t| (t.name.clone(), Table::new()))
            .collect();
        let indexes = IndexManager::new(&catalog);
        Self {
            catalog,
            tables,
            indexes,
            storage: None,
            data_dir: None,
        }
    }

    /// A database that lives only as long as the handle.
    pub fn in_memory(catalog: Catalog) -> EngineResult<Self> {
        catalog.validate()?;
        Ok(Self::empty(catalog))
    }

    /// Opens (or creates) the database in `data_dir`.
    ///
    /// Applies the catalog to the data directory, replays the record log,
    /// and rebuilds every index from the surviving rows.
    ///
    /// # Errors
    ///
    /// - REG_SCHEMA_DRIFT if the directory was created with another catalog
    /// - REG_DATA_CORRUPTION if any log record fails its checksum
    pub fn open(data_dir: &Path, catalog: Catalog, options: OpenOptions) -> EngineResult<Self> {
        fs::create_dir_all(data_dir).map_err(|e| {
            StorageError::write_failed(format!("Failed to create {}", data_dir.display()), e)
        })?;

        let dir = data_dir.display().to_string();
        let outcome = Migrator::new(data_dir).apply(&catalog).inspect_err(|e| {
            if e.code() == SchemaErrorCode::Drift {
                log_event_with_fields(Event::SchemaDrift, &[("data_dir", dir.as_str()), ("message", e.message())]);
            }
        })?;
        let event = match outcome {
            MigrationOutcome::Created(_) => Event::SchemaMigrated,
            MigrationOutcome::UpToDate(_) => Event::SchemaVerified,
        };
        log_event_with_fields(event, &[("data_dir", dir.as_str()), ("fingerprint", outcome.manifest().fingerprint.as_str())]);

        let records = storage::replay(data_dir).inspect_err(|e| {
            log_event_with_fields(Event::LogCorruption, &[("data_dir", dir.as_str()), ("message", e.message())]);
        })?;
        let replayed = records.len();

        let mut db = Self::empty(catalog);
        db.load(records)?;
        db.rebuild_indexes()?;
        db.storage = Some(StorageWriter::open(data_dir, options.sync_on_write)?);
        db.data_dir = Some(data_dir.to_path_buf());

        log_event_with_fields(Event::LogReplayed, &[("records", replayed.to_string().as_str())]);
        let rows: usize = db.tables.values().map(|t| t.rows.len()).sum();
        log_event_with_fields(Event::DatabaseOpened, &[("data_dir", dir.as_str()), ("rows", rows.to_string().as_str())]);

        Ok(db)
    }

    /// Flushes the log and releases the handle.
    pub fn close(mut self) -> EngineResult<()> {
        if let Some(writer) = self.storage.as_mut() {
            writer.sync()?;
        }
        let dir = self
            .data_dir
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| ":memory:".to_string());
        log_event_with_fields(Event::DatabaseClosed, &[("data_dir", dir.as_str())]);
        Ok(())
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Data directory backing this handle, if any
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    fn load(&mut self, records: Vec<LogRecord>) -> EngineResult<()> {
        for record in records {
            let table = self.tables.get_mut(&record.table).ok_or_else(|| {
                StorageError::corruption_for_record(&record.table, record.record_id.get(), "table is not declared")
            })?;

            table.next_id = table.next_id.max(record.record_id.get() + 1);

            if record.is_tombstone {
                table.rows.remove(&record.record_id);
                continue;
            }

            let row: Row = serde_json::from_slice(&record.body).map_err(|e| {
                StorageError::corruption_for_record(&record.table, record.record_id.get(), e.to_string())
            })?;
            table.rows.insert(record.record_id, row);
        }
        Ok(())
    }

    fn rebuild_indexes(&mut self) -> EngineResult<()> {
        self.indexes.clear();
        for (name, table) in &self.tables {
            for (id, row) in &table.rows {
                self.indexes.apply_insert(name, *id, row).map_err(|e| {
                    StorageError::corruption_for_record(name, id.get(), e.message().to_string())
                })?;
            }
        }
        Ok(())
    }

    fn table(&self, name: &str) -> EngineResult<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| SchemaError::unknown_table(name).into())
    }

    fn table_mut(&mut self, name: &str) -> EngineResult<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| SchemaError::unknown_table(name).into())
    }

    /// Fills defaults and validates `row` without writing it.
    pub fn prepare_row(&self, table: &str, mut row: Row) -> EngineResult<Row> {
        let validator = RowValidator::new(&self.catalog);
        validator.fill_defaults(table, &mut row, today())?;
        validator.validate_row(table, &row)?;
        Ok(row)
    }

    /// Prepares a replacement for row `id` without writing it.
    ///
    /// Absent fields keep their stored values. Creation defaults such as
    /// the current date are never applied to an existing row.
    pub fn prepare_update(&self, table: &str, id: RecordId, mut row: Row) -> EngineResult<Row> {
        let stored = self.get(table, id)?;
        for (field, value) in stored {
            if !row.contains_key(field) {
                row.insert(field.clone(), value.clone());
            }
        }
        RowValidator::new(&self.catalog).validate_row(table, &row)?;
        Ok(row)
    }

    fn check_references(&self, table: &str, row: &Row) -> EngineResult<()> {
        let schema = self.catalog.get(table)?;
        for (field, target, _) in schema.references() {
            let Some(id) = row.get(&field.name).and_then(Value::as_u64).map(RecordId::new) else {
                continue;
            };
            if !self.table(target)?.rows.contains_key(&id) {
                return Err(EngineError::ForeignKeyViolation {
                    table: table.to_string(),
                    field: field.name.clone(),
                    target: target.to_string(),
                    id,
                });
            }
        }
        Ok(())
    }

    fn check_constraints(&self, table: &str, id: RecordId, row: &Row) -> EngineResult<()> {
        self.check_references(table, row)?;
        self.indexes.check_unique(table, id, row)?;
        Ok(())
    }

    fn persist(&mut self, records: &[LogRecord]) -> EngineResult<()> {
        if let Some(writer) = self.storage.as_mut() {
            writer.append_batch(records)?;
        }
        Ok(())
    }

    fn encode(table: &str, id: RecordId, row: &Row) -> EngineResult<LogRecord> {
        let body = serde_json::to_vec(row).map_err(|e| {
            StorageError::write_failed_no_source(format!("Failed to encode {} {}: {}", table, id, e))
        })?;
        Ok(LogRecord::live(table, id, body))
    }

    /// Inserts a row and returns its new id.
    ///
    /// # Errors
    ///
    /// - REG_SCHEMA_VALIDATION_FAILED for an invalid row
    /// - REG_FOREIGN_KEY_VIOLATION for a reference to a missing row
    /// - REG_UNIQUE_VIOLATION for a duplicate unique value
    pub fn insert(&mut self, table: &str, row: Row) -> EngineResult<RecordId> {
        let row = self.prepare_row(table, row)?;
        let id = RecordId::new(self.table(table)?.next_id);

        self.check_constraints(table, id, &row).inspect_err(|e| rejected(table, e))?;
        self.persist(&[Self::encode(table, id, &row)?])?;

        self.indexes.apply_insert(table, id, &row)?;
        let entry = self.table_mut(table)?;
        entry.rows.insert(id, row);
        entry.next_id = id.get() + 1;

        log_event_with_fields(Event::RecordCreated, &[("table", table), ("id", id.to_string().as_str())]);
        Ok(id)
    }

    /// Replaces a stored row. Fields absent from `row` keep their stored values.
    pub fn update(&mut self, table: &str, id: RecordId, row: Row) -> EngineResult<()> {
        let old = self.get(table, id)?.clone();
        let row = self.prepare_update(table, id, row)?;

        self.check_constraints(table, id, &row).inspect_err(|e| rejected(table, e))?;
        self.persist(&[Self::encode(table, id, &row)?])?;

        self.indexes.apply_update(table, id, &old, &row)?;
        self.table_mut(table)?.rows.insert(id, row);

        log_event_with_fields(Event::RecordUpdated, &[("table", table), ("id", id.to_string().as_str())]);
        Ok(())
    }

    /// Merges `changes` over a stored row and writes the result.
    pub fn patch(&mut self, table: &str, id: RecordId, changes: Row) -> EngineResult<()> {
        let mut merged = self.get(table, id)?.clone();
        merged.extend(changes);
        self.update(table, id, merged)
    }

    /// Deletes a row and applies every delete policy that points at it.
    ///
    /// Cascades are followed transitively. A row that is both cascaded and
    /// nullified is only deleted.
    pub fn delete(&mut self, table: &str, id: RecordId) -> EngineResult<DeleteSummary> {
        if !self.table(table)?.rows.contains_key(&id) {
            return Err(EngineError::not_found(table, id));
        }

        let mut deleted: Vec<RowRef> = Vec::new();
        let mut seen: BTreeSet<RowRef> = BTreeSet::new();
        // (table, id) -> fields to clear, in discovery order
        let mut nullify: Vec<(RowRef, Vec<String>)> = Vec::new();
        let mut stack = vec![RowRef::new(table, id)];

        while let Some(target) = stack.pop() {
            if !seen.insert(target.clone()) {
                continue;
            }
            for (source, field, policy) in self.catalog.referencing(&target.table) {
                let ids = self.indexes.referencing(&source.name, &field.name, target.id)?;
                for source_id in ids {
                    let source_ref = RowRef::new(&source.name, source_id);
                    match policy {
                        OnDelete::Cascade => stack.push(source_ref),
                        OnDelete::SetNull => match nullify.iter_mut().find(|(r, _)| *r == source_ref) {
                            Some((_, fields)) => fields.push(field.name.clone()),
                            None => nullify.push((source_ref, vec![field.name.clone()])),
                        },
                    }
                }
            }
            deleted.push(target);
        }

        nullify.retain(|(r, _)| !seen.contains(r));

        let mut updates: Vec<(RowRef, Row, Row)> = Vec::with_capacity(nullify.len());
        for (target, fields) in &nullify {
            let old = self.get(&target.table, target.id)?.clone();
            let mut new = old.clone();
            for field in fields {
                new.insert(field.clone(), Value::Null);
            }
            updates.push((target.clone(), old, new));
        }

        let mut batch = Vec::with_capacity(updates.len() + deleted.len());
        for (target, _, new) in &updates {
            batch.push(Self::encode(&target.table, target.id, new)?);
        }
        for target in deleted.iter().rev() {
            batch.push(LogRecord::tombstone(&target.table, target.id));
        }
        self.persist(&batch)?;

        for (target, old, new) in updates {
            self.indexes.apply_update(&target.table, target.id, &old, &new)?;
            self.table_mut(&target.table)?.rows.insert(target.id, new);
        }
        for target in &deleted {
            if let Some(row) = self.table_mut(&target.table)?.rows.remove(&target.id) {
                self.indexes.apply_delete(&target.table, target.id, &row)?;
            }
        }

        let summary = DeleteSummary {
            deleted,
            nullified: nullify.into_iter().map(|(r, _)| r).collect(),
        };

        log_event_with_fields(Event::RecordDeleted, &[("table", table), ("id", id.to_string().as_str())]);
        if summary.deleted.len() > 1 || !summary.nullified.is_empty() {
            log_event_with_fields(
                Event::CascadeApplied,
                &[
                    ("table", table),
                    ("id", id.to_string().as_str()),
                    ("deleted", (summary.deleted.len() - 1).to_string().as_str()),
                    ("nullified", summary.nullified.len().to_string().as_str()),
                ],
            );
        }

        Ok(summary)
    }

    /// A stored row
    pub fn get(&self, table: &str, id: RecordId) -> EngineResult<&Row> {
        self.table(table)?
            .rows
            .get(&id)
            .ok_or_else(|| EngineError::not_found(table, id))
    }

    /// Every row of a table in its declared ordering, ties by id ascending.
    pub fn list(&self, table: &str) -> EngineResult<Vec<(RecordId, &Row)>> {
        let ordering = &self.catalog.get(table)?.ordering;
        let mut rows: Vec<(RecordId, &Row)> = self.table(table)?.rows.iter().map(|(id, row)| (*id, row)).collect();
        rows.sort_by(|a, b| compare_rows(ordering, a, b));
        Ok(rows)
    }

    /// Rows whose fields equal every value in `predicates`, in list order.
    pub fn filter(&self, table: &str, predicates: &Row) -> EngineResult<Vec<(RecordId, &Row)>> {
        let mut rows = self.list(table)?;
        rows.retain(|(_, row)| row_matches(row, predicates));
        Ok(rows)
    }

    /// Whether any row other than `excluding` matches `predicates`.
    pub fn exists(&self, table: &str, predicates: &Row, excluding: Option<RecordId>) -> EngineResult<bool> {
        Ok(self
            .table(table)?
            .rows
            .iter()
            .any(|(id, row)| Some(*id) != excluding && row_matches(row, predicates)))
    }

    /// Number of live rows in a table
    pub fn count(&self, table: &str) -> EngineResult<usize> {
        Ok(self.table(table)?.rows.len())
    }
}

fn rejected(table: &str, err: &EngineError) {
    if err.is_constraint_violation() {
        log_event_with_fields(
            Event::ConstraintRejected,
            &[("table", table), ("code", err.code()), ("message", err.to_string().as_str())],
        );
    }
}

fn row_matches(row: &Row, predicates: &Row) -> bool {
    predicates
        .iter()
        .all(|(field, expected)| row.get(field).unwrap_or(&Value::Null) == expected)
}

fn compare_rows(ordering: &[OrderKey], a: &(RecordId, &Row), b: &(RecordId, &Row)) -> Ordering {
    for key in ordering {
        let ord = if key.field == "id" {
            a.0.cmp(&b.0)
        } else {
            compare_values(a.1.get(&key.field), b.1.get(&key.field))
        };
        let ord = if key.descending { ord.reverse() } else { ord };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.0.cmp(&b.0)
}

/// Nulls sort first; numbers numerically; strings by code point.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .unwrap_or(0.0)
                .partial_cmp(&y.as_f64().unwrap_or(0.0))
                .unwrap_or(Ordering::Equal),
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {}", other),
        }
    }

    fn university() -> Database {
        Database::in_memory(Catalog::university()).unwrap()
    }

    fn add_student(db: &mut Database, name: &str, email: &str) -> RecordId {
        db.insert(
            "student",
            row(json!({"name": name, "email": email, "department": "CS"})),
        )
        .unwrap()
    }

    fn add_course(db: &mut Database, code: &str, instructor: Option<RecordId>) -> RecordId {
        db.insert(
            "course",
            row(json!({"course_code": code, "title": "Intro", "instructor_id": instructor})),
        )
        .unwrap()
    }

    #[test]
    fn test_insert_fills_defaults() {
        let mut db = university();
        let course = add_course(&mut db, "CS101", None);
        let stored = db.get("course", course).unwrap();
        assert_eq!(stored["credits"], json!(3));
        assert_eq!(stored["instructor_id"], Value::Null);

        let student = add_student(&mut db, "Alice", "alice@u.edu");
        let stored = db.get("student", student).unwrap();
        assert_eq!(stored["enrollment_date"], json!(today().format("%Y-%m-%d").to_string()));
    }

    #[test]
    fn test_ids_are_monotonic_and_never_reused() {
        let mut db = university();
        let a = add_student(&mut db, "A", "a@u.edu");
        let b = add_student(&mut db, "B", "b@u.edu");
        assert_eq!((a.get(), b.get()), (1, 2));
        db.delete("student", b).unwrap();
        let c = add_student(&mut db, "C", "c@u.edu");
        assert_eq!(c.get(), 3);
    }

    #[test]
    fn test_unique_email_rejected() {
        let mut db = university();
        add_student(&mut db, "Alice", "alice@u.edu");
        let err = db
            .insert(
                "student",
                row(json!({"name": "Other", "email": "alice@u.edu", "department": "Math"})),
            )
            .unwrap_err();
        assert_eq!(err.code(), "REG_UNIQUE_VIOLATION");
        assert!(err.is_constraint_violation());
        assert_eq!(db.count("student").unwrap(), 1);
    }

    #[test]
    fn test_foreign_key_checked_on_write() {
        let mut db = university();
        let err = db
            .insert("enrollment", row(json!({"student_id": 7, "course_id": 1})))
            .unwrap_err();
        assert_eq!(err.code(), "REG_FOREIGN_KEY_VIOLATION");
        assert_eq!(db.count("enrollment").unwrap(), 0);
    }

    #[test]
    fn test_update_keeps_own_unique_values() {
        let mut db = university();
        let id = add_student(&mut db, "Alice", "alice@u.edu");
        db.patch("student", id, row(json!({"department": "Math"}))).unwrap();
        assert_eq!(db.get("student", id).unwrap()["department"], json!("Math"));
        assert_eq!(db.get("student", id).unwrap()["email"], json!("alice@u.edu"));
    }

    #[test]
    fn test_update_keeps_stored_creation_date() {
        let mut db = university();
        let id = db
            .insert(
                "student",
                row(json!({"name": "Alice", "email": "alice@u.edu", "department": "CS", "enrollment_date": "2020-01-01"})),
            )
            .unwrap();

        db.update("student", id, row(json!({"name": "Alice", "email": "alice@u.edu", "department": "Math"})))
            .unwrap();
        let stored = db.get("student", id).unwrap();
        assert_eq!(stored["enrollment_date"], json!("2020-01-01"));
        assert_eq!(stored["department"], json!("Math"));
    }

    #[test]
    fn test_update_missing_row() {
        let mut db = university();
        let err = db
            .update("student", RecordId::new(5), row(json!({"name": "X"})))
            .unwrap_err();
        assert_eq!(err.code(), "REG_NOT_FOUND");
    }

    #[test]
    fn test_delete_cascades_and_nullifies() {
        let mut db = university();
        let instructor = db
            .insert(
                "instructor",
                row(json!({"name": "Turing", "email": "turing@u.edu", "department": "CS"})),
            )
            .unwrap();
        let course = add_course(&mut db, "CS101", Some(instructor));
        let student = add_student(&mut db, "Alice", "alice@u.edu");
        let enrollment = db
            .insert("enrollment", row(json!({"student_id": student.get(), "course_id": course.get()})))
            .unwrap();

        let summary = db.delete("instructor", instructor).unwrap();
        assert_eq!(summary.deleted, vec![RowRef::new("instructor", instructor)]);
        assert_eq!(summary.nullified, vec![RowRef::new("course", course)]);
        assert_eq!(db.get("course", course).unwrap()["instructor_id"], Value::Null);

        let summary = db.delete("course", course).unwrap();
        assert_eq!(summary.deleted.len(), 2);
        assert_eq!(summary.deleted[1], RowRef::new("enrollment", enrollment));
        assert_eq!(db.count("enrollment").unwrap(), 0);
        assert_eq!(db.count("student").unwrap(), 1);
    }

    #[test]
    fn test_list_ordering_with_id_tiebreak() {
        let mut db = university();
        let s = add_student(&mut db, "Zed", "z@u.edu");
        let c1 = add_course(&mut db, "MA200", None);
        let c2 = add_course(&mut db, "CS101", None);
        let codes: Vec<_> = db
            .list("course")
            .unwrap()
            .iter()
            .map(|(_, r)| r["course_code"].clone())
            .collect();
        assert_eq!(codes, vec![json!("CS101"), json!("MA200")]);

        let e1 = db
            .insert(
                "enrollment",
                row(json!({"student_id": s.get(), "course_id": c1.get(), "enrollment_date": "2024-01-10"})),
            )
            .unwrap();
        let e2 = db
            .insert(
                "enrollment",
                row(json!({"student_id": s.get(), "course_id": c2.get(), "enrollment_date": "2024-01-10"})),
            )
            .unwrap();
        let ids: Vec<_> = db.list("enrollment").unwrap().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![e1, e2]);
    }

    #[test]
    fn test_filter_and_exists() {
        let mut db = university();
        let a = add_student(&mut db, "Alice", "alice@u.edu");
        add_student(&mut db, "Bob", "bob@u.edu");

        let found = db.filter("student", &row(json!({"name": "Alice"}))).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, a);

        let predicate = row(json!({"email": "alice@u.edu"}));
        assert!(db.exists("student", &predicate, None).unwrap());
        assert!(!db.exists("student", &predicate, Some(a)).unwrap());
    }

    #[test]
    fn test_prepare_row_does_not_write() {
        let db = university();
        let prepared = db
            .prepare_row("course", row(json!({"course_code": "CS101", "title": "Intro"})))
            .unwrap();
        assert_eq!(prepared["credits"], json!(3));
        assert_eq!(db.count("course").unwrap(), 0);
    }

    #[test]
    fn test_unknown_table() {
        let db = university();
        assert_eq!(db.count("alumni").unwrap_err().code(), "REG_UNKNOWN_TABLE");
    }

    #[test]
    fn test_reopen_restores_rows() {
        let tmp = TempDir::new().unwrap();
        let options = OpenOptions { sync_on_write: false };

        let mut db = Database::open(tmp.path(), Catalog::university(), options).unwrap();
        let alice = add_student(&mut db, "Alice", "alice@u.edu");
        let bob = add_student(&mut db, "Bob", "bob@u.edu");
        db.delete("student", bob).unwrap();
        db.close().unwrap();

        let mut db = Database::open(tmp.path(), Catalog::university(), options).unwrap();
        assert_eq!(db.count("student").unwrap(), 1);
        assert_eq!(db.get("student", alice).unwrap()["name"], json!("Alice"));
        assert_eq!(add_student(&mut db, "Carol", "carol@u.edu").get(), 3);
    }
}
