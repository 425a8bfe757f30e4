//! Registrar session
//!
//! The session owns the database handle and runs every write through the
//! same pipeline:
//!
//! 1. `prepare_row` or `prepare_update` (absent fields, field validation)
//! 2. application rules for the table (duplicate enrollment)
//! 3. the engine write, which enforces storage-level constraints

use std::path::Path;

use serde_json::{json, Value};

use super::errors::{RegistrarResult, ValidationError};
use crate::engine::{Database, DeleteSummary, OpenOptions};
use crate::observability::{log_event_with_fields, Event};
use crate::records::{Course, Enrollment, Entity, Grade, Instructor, RecordId, Row, Stored, Student};
use crate::schema::{Catalog, SchemaError};

/// A session over the university records.
pub struct Registrar {
    db: Database,
}

impl Registrar {
    /// Wraps an existing database handle
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// In-memory session over the university catalog
    pub fn in_memory() -> RegistrarResult<Self> {
        Ok(Self::new(Database::in_memory(Catalog::university())?))
    }

    /// Opens the university database stored in `data_dir`
    pub fn open(data_dir: &Path, options: OpenOptions) -> RegistrarResult<Self> {
        Ok(Self::new(Database::open(data_dir, Catalog::university(), options)?))
    }

    pub fn close(self) -> RegistrarResult<()> {
        Ok(self.db.close()?)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // ---- typed records ----

    /// Stores a new record.
    pub fn create<T: Entity>(&mut self, record: &T) -> RegistrarResult<Stored<T>> {
        let id = self.insert_row(T::TABLE, record.to_row()?)?;
        self.get(id)
    }

    pub fn get<T: Entity>(&self, id: RecordId) -> RegistrarResult<Stored<T>> {
        let row = self.db.get(T::TABLE, id)?;
        Ok(Stored::new(id, T::from_row(row)?))
    }

    /// Replaces a stored record.
    pub fn update<T: Entity>(&mut self, id: RecordId, record: &T) -> RegistrarResult<Stored<T>> {
        self.update_row(T::TABLE, id, record.to_row()?)?;
        self.get(id)
    }

    pub fn delete<T: Entity>(&mut self, id: RecordId) -> RegistrarResult<DeleteSummary> {
        self.delete_row(T::TABLE, id)
    }

    /// Every record of a type, in its table's ordering.
    pub fn list<T: Entity>(&self) -> RegistrarResult<Vec<Stored<T>>> {
        self.db
            .list(T::TABLE)?
            .into_iter()
            .map(|(id, row)| Ok(Stored::new(id, T::from_row(row)?)))
            .collect()
    }

    // ---- raw rows ----

    pub fn insert_row(&mut self, table: &str, row: Row) -> RegistrarResult<RecordId> {
        let row = self.db.prepare_row(table, row)?;
        self.clean_row(table, &row, None)?;
        Ok(self.db.insert(table, row)?)
    }

    /// Replaces a stored row. Absent fields keep their stored values.
    pub fn update_row(&mut self, table: &str, id: RecordId, row: Row) -> RegistrarResult<()> {
        let row = self.db.prepare_update(table, id, row)?;
        self.clean_row(table, &row, Some(id))?;
        Ok(self.db.update(table, id, row)?)
    }

    /// Merges `changes` over the stored row, then writes it like `update_row`.
    pub fn patch_row(&mut self, table: &str, id: RecordId, changes: Row) -> RegistrarResult<()> {
        let mut merged = self.db.get(table, id)?.clone();
        merged.extend(changes);
        self.update_row(table, id, merged)
    }

    pub fn delete_row(&mut self, table: &str, id: RecordId) -> RegistrarResult<DeleteSummary> {
        Ok(self.db.delete(table, id)?)
    }

    pub fn get_row(&self, table: &str, id: RecordId) -> RegistrarResult<&Row> {
        Ok(self.db.get(table, id)?)
    }

    pub fn list_rows(&self, table: &str) -> RegistrarResult<Vec<(RecordId, &Row)>> {
        Ok(self.db.list(table)?)
    }

    /// Application rules that run after field validation and before the write.
    fn clean_row(&self, table: &str, row: &Row, own_id: Option<RecordId>) -> RegistrarResult<()> {
        if table != Enrollment::TABLE {
            return Ok(());
        }
        let (Some(student), Some(course)) = (reference(row, "student_id"), reference(row, "course_id")) else {
            return Ok(());
        };
        self.check_duplicate_enrollment(student, course, own_id)
    }

    // ---- enrollments ----

    /// Fails with the duplicate enrollment message if any other enrollment
    /// pairs the same student and course. `own_id` is never a conflict.
    pub fn validate_enrollment(&self, candidate: &Enrollment, own_id: Option<RecordId>) -> RegistrarResult<()> {
        self.check_duplicate_enrollment(candidate.student_id, candidate.course_id, own_id)
    }

    fn check_duplicate_enrollment(
        &self,
        student: RecordId,
        course: RecordId,
        own_id: Option<RecordId>,
    ) -> RegistrarResult<()> {
        let predicates = as_row(json!({"student_id": student, "course_id": course}));
        if self.db.exists(Enrollment::TABLE, &predicates, own_id)? {
            let err = ValidationError::duplicate_enrollment();
            log_event_with_fields(
                Event::ValidationRejected,
                &[
                    ("table", Enrollment::TABLE),
                    ("student_id", student.to_string().as_str()),
                    ("course_id", course.to_string().as_str()),
                    ("message", err.message()),
                ],
            );
            return Err(err.into());
        }
        Ok(())
    }

    /// Enrolls a student in a course today, ungraded.
    pub fn enroll(&mut self, student: RecordId, course: RecordId) -> RegistrarResult<Stored<Enrollment>> {
        self.create(&Enrollment::new(student, course))
    }

    pub fn set_grade(&mut self, enrollment: RecordId, grade: Grade) -> RegistrarResult<Stored<Enrollment>> {
        self.patch_row(Enrollment::TABLE, enrollment, as_row(json!({"grade": grade})))?;
        self.get(enrollment)
    }

    // ---- labels ----

    /// Human label of any stored row.
    pub fn label(&self, table: &str, id: RecordId) -> RegistrarResult<String> {
        match table {
            Student::TABLE => Ok(self.get::<Student>(id)?.to_string()),
            Instructor::TABLE => Ok(self.get::<Instructor>(id)?.to_string()),
            Course::TABLE => Ok(self.get::<Course>(id)?.to_string()),
            Enrollment::TABLE => self.enrollment_label(id),
            other => Err(crate::engine::EngineError::from(SchemaError::unknown_table(other)).into()),
        }
    }

    /// `"{student name} in {course code}"`
    pub fn enrollment_label(&self, id: RecordId) -> RegistrarResult<String> {
        let enrollment = self.get::<Enrollment>(id)?;
        let student = self.get::<Student>(enrollment.student_id)?;
        let course = self.get::<Course>(enrollment.course_id)?;
        Ok(enrollment.label(&student, &course))
    }

    // ---- reverse collections ----

    /// Courses taught by an instructor
    pub fn courses_of(&self, instructor: RecordId) -> RegistrarResult<Vec<Stored<Course>>> {
        self.related(Course::TABLE, "instructor_id", instructor)
    }

    /// Enrollments of a student, most recent first
    pub fn enrollments_of_student(&self, student: RecordId) -> RegistrarResult<Vec<Stored<Enrollment>>> {
        self.related(Enrollment::TABLE, "student_id", student)
    }

    /// Enrollments in a course, most recent first
    pub fn enrollments_of_course(&self, course: RecordId) -> RegistrarResult<Vec<Stored<Enrollment>>> {
        self.related(Enrollment::TABLE, "course_id", course)
    }

    fn related<T: Entity>(&self, table: &str, field: &str, target: RecordId) -> RegistrarResult<Vec<Stored<T>>> {
        let mut predicates = Row::new();
        predicates.insert(field.to_string(), json!(target));
        self.db
            .filter(table, &predicates)?
            .into_iter()
            .map(|(id, row)| Ok(Stored::new(id, T::from_row(row)?)))
            .collect()
    }
}

fn reference(row: &Row, field: &str) -> Option<RecordId> {
    row.get(field).and_then(Value::as_u64).map(RecordId::new)
}

fn as_row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}
