//! The catalog of declared tables and the university schema itself

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::errors::{SchemaError, SchemaResult};
use super::types::{Choice, DefaultValue, FieldDef, OnDelete, OrderKey, TableSchema};
use crate::records::{Course, Enrollment, Entity, Grade, Instructor, Student};

/// Ordered set of table declarations.
///
/// Tables are kept in declaration order, which is also a valid creation
/// order: every reference points at a table declared earlier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    tables: Vec<TableSchema>,
}

impl Catalog {
    /// Builds a catalog and validates it.
    pub fn new(tables: Vec<TableSchema>) -> SchemaResult<Self> {
        let catalog = Self { tables };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The four university tables.
    pub fn university() -> Self {
        let student = TableSchema::new(
            Student::TABLE,
            vec![
                FieldDef::text("name", 200),
                FieldDef::email("email", 254).unique(),
                FieldDef::text("department", 120),
                FieldDef::date("enrollment_date").with_default(DefaultValue::Today),
            ],
        )
        .ordered_by(OrderKey::asc("name"));

        let instructor = TableSchema::new(
            Instructor::TABLE,
            vec![
                FieldDef::text("name", 200),
                FieldDef::email("email", 254).unique(),
                FieldDef::text("department", 120),
                FieldDef::date("hire_date").with_default(DefaultValue::Today),
            ],
        )
        .ordered_by(OrderKey::asc("name"));

        let course = TableSchema::new(
            Course::TABLE,
            vec![
                FieldDef::text("course_code", 20).unique(),
                FieldDef::text("title", 250),
                FieldDef::positive_small_int("credits").with_default(DefaultValue::Int(3)),
                FieldDef::reference("instructor_id", Instructor::TABLE, OnDelete::SetNull)
                    .nullable()
                    .blank(),
            ],
        )
        .ordered_by(OrderKey::asc("course_code"));

        let grades = Grade::ALL
            .iter()
            .map(|g| Choice::new(g.as_str(), g.label()))
            .collect();

        let enrollment = TableSchema::new(
            Enrollment::TABLE,
            vec![
                FieldDef::reference("student_id", Student::TABLE, OnDelete::Cascade),
                FieldDef::reference("course_id", Course::TABLE, OnDelete::Cascade),
                FieldDef::date("enrollment_date").with_default(DefaultValue::Today),
                FieldDef::choice("grade", 3, grades)
                    .blank()
                    .with_default(DefaultValue::Text(String::new())),
            ],
        )
        .unique_together(&["student_id", "course_id"])
        .ordered_by(OrderKey::desc("enrollment_date"));

        Self {
            tables: vec![student, instructor, course, enrollment],
        }
    }

    /// All tables in declaration order
    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }

    /// Look up a table by name
    pub fn get(&self, name: &str) -> SchemaResult<&TableSchema> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| SchemaError::unknown_table(name))
    }

    /// Returns whether a table is declared
    pub fn contains(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t.name == name)
    }

    /// Every reference field that points at `target`, with its owning table.
    pub fn referencing(&self, target: &str) -> Vec<(&TableSchema, &FieldDef, OnDelete)> {
        let mut result = Vec::new();
        for table in &self.tables {
            for (field, to, policy) in table.references() {
                if to == target {
                    result.push((table, field, policy));
                }
            }
        }
        result
    }

    /// Validates every table and every cross-table reference.
    pub fn validate(&self) -> SchemaResult<()> {
        for (position, table) in self.tables.iter().enumerate() {
            table
                .validate_structure()
                .map_err(|e| SchemaError::malformed(&table.name, e))?;

            if self.tables[..position].iter().any(|t| t.name == table.name) {
                return Err(SchemaError::malformed(&table.name, "table declared twice"));
            }

            for (field, target, policy) in table.references() {
                let declared_before = self.tables[..position].iter().any(|t| t.name == target);
                if !declared_before {
                    return Err(SchemaError::malformed(
                        &table.name,
                        format!("'{}' references undeclared table '{}'", field.name, target),
                    ));
                }
                if policy == OnDelete::SetNull && !field.nullable {
                    return Err(SchemaError::malformed(
                        &table.name,
                        format!("'{}' uses SET NULL but is not nullable", field.name),
                    ));
                }
            }
        }
        Ok(())
    }

    /// SHA-256 over the canonical JSON form, hex encoded.
    pub fn fingerprint(&self) -> String {
        // Struct fields serialize in declaration order and tables are a Vec,
        // so the JSON form is stable.
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        let digest = Sha256::digest(&canonical);
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::university()
    }
}
