//! Schema migration step
//!
//! Declarations live in code; this module turns them into storage-facing
//! artifacts and pins them to a data directory:
//!
//! - `metadata/schema.json`: manifest with the catalog fingerprint
//! - `metadata/schema.sql`: DDL rendered from the catalog
//!
//! A data directory accepts exactly one catalog. Opening it with a catalog
//! whose fingerprint differs is schema drift and is FATAL.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::catalog::Catalog;
use super::errors::{SchemaError, SchemaResult};
use super::types::{DefaultValue, FieldDef, FieldType, TableSchema};

/// Manifest format understood by this build
pub const MANIFEST_FORMAT_VERSION: u32 = 1;

/// Renders `CREATE TABLE` statements for every table, in declaration order.
pub fn render_ddl(catalog: &Catalog) -> String {
    catalog
        .tables()
        .iter()
        .map(render_table)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_table(table: &TableSchema) -> String {
    let mut lines = vec!["    id BIGINT PRIMARY KEY".to_string()];

    for field in &table.fields {
        lines.push(format!("    {}", render_column(field)));
    }

    for group in &table.unique_together {
        lines.push(format!("    UNIQUE ({})", group.join(", ")));
    }

    for (field, target, policy) in table.references() {
        lines.push(format!(
            "    FOREIGN KEY ({}) REFERENCES {} (id) ON DELETE {}",
            field.name,
            target,
            policy.as_sql()
        ));
    }

    format!("CREATE TABLE {} (\n{}\n);\n", table.name, lines.join(",\n"))
}

fn render_column(field: &FieldDef) -> String {
    let mut column = format!("{} {}", field.name, sql_type(&field.field_type));

    if !field.nullable {
        column.push_str(" NOT NULL");
    }
    if field.unique {
        column.push_str(" UNIQUE");
    }
    if let Some(default) = &field.default {
        let rendered = match default {
            DefaultValue::Today => "CURRENT_DATE".to_string(),
            DefaultValue::Int(v) => v.to_string(),
            DefaultValue::Text(s) => quote(s),
        };
        column.push_str(&format!(" DEFAULT {}", rendered));
    }

    match &field.field_type {
        FieldType::PositiveSmallInt => {
            column.push_str(&format!(" CHECK ({} >= 0)", field.name));
        }
        FieldType::Choice { choices, .. } => {
            let values: Vec<String> = choices.iter().map(|c| quote(&c.value)).collect();
            column.push_str(&format!(" CHECK ({} IN ({}))", field.name, values.join(", ")));
        }
        _ => {}
    }

    column
}

fn sql_type(field_type: &FieldType) -> String {
    match field_type {
        FieldType::Text { max_length }
        | FieldType::Email { max_length }
        | FieldType::Choice { max_length, .. } => format!("VARCHAR({})", max_length),
        FieldType::Date => "DATE".to_string(),
        FieldType::PositiveSmallInt => "SMALLINT".to_string(),
        FieldType::Reference { .. } => "BIGINT".to_string(),
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Persisted record of the catalog a data directory was created with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaManifest {
    pub format_version: u32,
    /// Identity of the data directory, fixed at first migration
    pub instance_id: Uuid,
    pub fingerprint: String,
    pub tables: Vec<String>,
    pub applied_at: DateTime<Utc>,
}

impl SchemaManifest {
    fn for_catalog(catalog: &Catalog) -> Self {
        Self {
            format_version: MANIFEST_FORMAT_VERSION,
            instance_id: Uuid::new_v4(),
            fingerprint: catalog.fingerprint(),
            tables: catalog.tables().iter().map(|t| t.name.clone()).collect(),
            applied_at: Utc::now(),
        }
    }
}

/// Result of applying a catalog to a data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// No manifest existed; one was written
    Created(SchemaManifest),
    /// Manifest matches the catalog
    UpToDate(SchemaManifest),
}

impl MigrationOutcome {
    pub fn manifest(&self) -> &SchemaManifest {
        match self {
            MigrationOutcome::Created(m) | MigrationOutcome::UpToDate(m) => m,
        }
    }
}

/// Applies a catalog to a data directory.
pub struct Migrator {
    metadata_dir: PathBuf,
}

impl Migrator {
    /// Manifest files live at `<data_dir>/metadata/`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            metadata_dir: data_dir.join("metadata"),
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.metadata_dir.join("schema.json")
    }

    pub fn ddl_path(&self) -> PathBuf {
        self.metadata_dir.join("schema.sql")
    }

    /// Reads the stored manifest, if any.
    pub fn load_manifest(&self) -> SchemaResult<Option<SchemaManifest>> {
        let path = self.manifest_path();
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            SchemaError::malformed(path.display().to_string(), format!("Failed to read file: {}", e))
        })?;

        let manifest: SchemaManifest = serde_json::from_str(&content).map_err(|e| {
            SchemaError::malformed(path.display().to_string(), format!("Invalid JSON: {}", e))
        })?;

        if manifest.format_version != MANIFEST_FORMAT_VERSION {
            return Err(SchemaError::malformed(
                path.display().to_string(),
                format!("Unsupported manifest format {}", manifest.format_version),
            ));
        }

        Ok(Some(manifest))
    }

    /// Writes the manifest and DDL on first use, verifies the fingerprint afterwards.
    pub fn apply(&self, catalog: &Catalog) -> SchemaResult<MigrationOutcome> {
        catalog.validate()?;

        if let Some(existing) = self.load_manifest()? {
            let current = catalog.fingerprint();
            if existing.fingerprint != current {
                return Err(SchemaError::drift(existing.fingerprint, current));
            }
            return Ok(MigrationOutcome::UpToDate(existing));
        }

        fs::create_dir_all(&self.metadata_dir).map_err(|e| {
            SchemaError::malformed(
                self.metadata_dir.display().to_string(),
                format!("Failed to create metadata directory: {}", e),
            )
        })?;

        let manifest = SchemaManifest::for_catalog(catalog);
        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| SchemaError::malformed("<manifest>", e.to_string()))?;

        self.write_file(&self.ddl_path(), &render_ddl(catalog))?;
        // Manifest last: its presence marks the migration as complete.
        self.write_file(&self.manifest_path(), &json)?;

        Ok(MigrationOutcome::Created(manifest))
    }

    fn write_file(&self, path: &Path, content: &str) -> SchemaResult<()> {
        fs::write(path, content).map_err(|e| {
            SchemaError::malformed(path.display().to_string(), format!("Failed to write file: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ddl_declares_constraints() {
        let ddl = render_ddl(&Catalog::university());

        assert!(ddl.contains("CREATE TABLE student ("));
        assert!(ddl.contains("email VARCHAR(254) NOT NULL UNIQUE"));
        assert!(ddl.contains("course_code VARCHAR(20) NOT NULL UNIQUE"));
        assert!(ddl.contains("credits SMALLINT NOT NULL DEFAULT 3 CHECK (credits >= 0)"));
        assert!(ddl.contains("instructor_id BIGINT,"));
        assert!(ddl.contains("FOREIGN KEY (instructor_id) REFERENCES instructor (id) ON DELETE SET NULL"));
        assert!(ddl.contains("FOREIGN KEY (student_id) REFERENCES student (id) ON DELETE CASCADE"));
        assert!(ddl.contains("FOREIGN KEY (course_id) REFERENCES course (id) ON DELETE CASCADE"));
        assert!(ddl.contains("UNIQUE (student_id, course_id)"));
        assert!(ddl.contains("CHECK (grade IN ('A', 'A-', 'B+', 'B', 'B-', 'C+', 'C', 'D', 'F', 'I', ''))"));
        assert!(ddl.contains("enrollment_date DATE NOT NULL DEFAULT CURRENT_DATE"));
    }

    #[test]
    fn test_tables_rendered_in_dependency_order() {
        let ddl = render_ddl(&Catalog::university());
        let pos = |name: &str| ddl.find(&format!("CREATE TABLE {} (", name)).unwrap();
        assert!(pos("instructor") < pos("course"));
        assert!(pos("course") < pos("enrollment"));
        assert!(pos("student") < pos("enrollment"));
    }

    #[test]
    fn test_apply_creates_then_verifies() {
        let tmp = TempDir::new().unwrap();
        let migrator = Migrator::new(tmp.path());
        let catalog = Catalog::university();

        let first = migrator.apply(&catalog).unwrap();
        assert!(matches!(first, MigrationOutcome::Created(_)));
        assert!(migrator.ddl_path().exists());

        let second = migrator.apply(&catalog).unwrap();
        match second {
            MigrationOutcome::UpToDate(m) => {
                assert_eq!(m.instance_id, first.manifest().instance_id);
                assert_eq!(m.tables, vec!["student", "instructor", "course", "enrollment"]);
            }
            other => panic!("expected UpToDate, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_manifest_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let migrator = Migrator::new(tmp.path());
        fs::create_dir_all(tmp.path().join("metadata")).unwrap();
        fs::write(migrator.manifest_path(), "{not json").unwrap();

        let err = migrator.apply(&Catalog::university()).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.message().contains("Invalid JSON"));
    }
}
