//! Index Manager for registrar
//!
//! Holds the constraint indexes of every table. Indexes are derived state:
//! they are rebuilt from the live rows whenever a database is opened.
//!
//! # API
//!
//! - `check_unique(table, id, row)` - Would this row collide with another record?
//! - `apply_insert(table, id, row)` - Index a new row
//! - `apply_update(table, id, old, new)` - Re-index a replaced row
//! - `apply_delete(table, id, row)` - Drop a row from every index
//! - `referencing(table, field, target)` - Reverse reference lookup

use std::collections::{BTreeMap, HashMap};

use super::btree::{CompositeKey, IndexKey, ReferenceTree, UniqueTree};
use super::errors::{IndexError, IndexResult};
use crate::records::{RecordId, Row};
use crate::schema::{Catalog, TableSchema};

/// One unique constraint and the tree enforcing it
#[derive(Debug)]
struct UniqueConstraint {
    fields: Vec<String>,
    tree: UniqueTree,
}

impl UniqueConstraint {
    /// Key for a row, or None if any component is null or absent.
    fn key_for(&self, row: &Row) -> Option<CompositeKey> {
        let mut parts = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            parts.push(IndexKey::from_json(row.get(field)?)?);
        }
        Some(CompositeKey(parts))
    }
}

/// Unique and reverse-reference indexes of one table
#[derive(Debug)]
pub struct TableIndexes {
    table: String,
    uniques: Vec<UniqueConstraint>,
    references: BTreeMap<String, ReferenceTree>,
}

impl TableIndexes {
    /// Creates empty indexes for every constraint the table declares
    pub fn for_table(schema: &TableSchema) -> Self {
        let uniques = schema
            .unique_constraints()
            .into_iter()
            .map(|fields| UniqueConstraint {
                fields,
                tree: UniqueTree::new(),
            })
            .collect();

        let references = schema
            .references()
            .map(|(field, _, _)| (field.name.clone(), ReferenceTree::new()))
            .collect();

        Self {
            table: schema.name.clone(),
            uniques,
            references,
        }
    }

    /// Fails if another record already holds any unique value of `row`.
    pub fn check_unique(&self, id: RecordId, row: &Row) -> IndexResult<()> {
        for constraint in &self.uniques {
            if let Some(key) = constraint.key_for(row) {
                if let Some(holder) = constraint.tree.lookup(&key) {
                    if holder != id {
                        return Err(IndexError::unique_violation(&self.table, &constraint.fields, &key, holder));
                    }
                }
            }
        }
        Ok(())
    }

    fn insert(&mut self, id: RecordId, row: &Row) -> IndexResult<()> {
        self.check_unique(id, row)?;
        for constraint in &mut self.uniques {
            if let Some(key) = constraint.key_for(row) {
                if let Err(holder) = constraint.tree.insert(key.clone(), id) {
                    return Err(IndexError::unique_violation(&self.table, &constraint.fields, &key, holder));
                }
            }
        }
        for (field, tree) in &mut self.references {
            if let Some(target) = reference_of(row, field) {
                tree.insert(target, id);
            }
        }
        Ok(())
    }

    fn remove(&mut self, id: RecordId, row: &Row) {
        for constraint in &mut self.uniques {
            if let Some(key) = constraint.key_for(row) {
                constraint.tree.remove(&key, id);
            }
        }
        for (field, tree) in &mut self.references {
            if let Some(target) = reference_of(row, field) {
                tree.remove(target, id);
            }
        }
    }

    /// Records of this table whose `field` points at `target`
    pub fn referencing(&self, field: &str, target: RecordId) -> Vec<RecordId> {
        self.references
            .get(field)
            .map(|tree| tree.referencing(target))
            .unwrap_or_default()
    }

    fn clear(&mut self) {
        for constraint in &mut self.uniques {
            constraint.tree.clear();
        }
        for tree in self.references.values_mut() {
            tree.clear();
        }
    }
}

fn reference_of(row: &Row, field: &str) -> Option<RecordId> {
    row.get(field).and_then(|v| v.as_u64()).map(RecordId::new)
}

/// Index Manager that maintains the constraint indexes of all tables
#[derive(Debug)]
pub struct IndexManager {
    tables: HashMap<String, TableIndexes>,
}

impl IndexManager {
    /// Creates empty indexes for every table in the catalog
    pub fn new(catalog: &Catalog) -> Self {
        let tables = catalog
            .tables()
            .iter()
            .map(|t| (t.name.clone(), TableIndexes::for_table(t)))
            .collect();
        Self { tables }
    }

    pub fn table(&self, table: &str) -> IndexResult<&TableIndexes> {
        self.tables.get(table).ok_or_else(|| IndexError::unknown_table(table))
    }

    fn table_mut(&mut self, table: &str) -> IndexResult<&mut TableIndexes> {
        self.tables.get_mut(table).ok_or_else(|| IndexError::unknown_table(table))
    }

    /// Fails with REG_UNIQUE_VIOLATION if `row` collides with another record.
    pub fn check_unique(&self, table: &str, id: RecordId, row: &Row) -> IndexResult<()> {
        self.table(table)?.check_unique(id, row)
    }

    /// Index a newly stored row.
    pub fn apply_insert(&mut self, table: &str, id: RecordId, row: &Row) -> IndexResult<()> {
        self.table_mut(table)?.insert(id, row)
    }

    /// Re-index a replaced row. The old entries are kept if the new row collides.
    pub fn apply_update(&mut self, table: &str, id: RecordId, old: &Row, new: &Row) -> IndexResult<()> {
        let indexes = self.table_mut(table)?;
        indexes.check_unique(id, new)?;
        indexes.remove(id, old);
        indexes.insert(id, new)
    }

    /// Drop a row from every index of its table.
    pub fn apply_delete(&mut self, table: &str, id: RecordId, row: &Row) -> IndexResult<()> {
        self.table_mut(table)?.remove(id, row);
        Ok(())
    }

    /// Records of `table` whose `field` points at `target`.
    pub fn referencing(&self, table: &str, field: &str, target: RecordId) -> IndexResult<Vec<RecordId>> {
        Ok(self.table(table)?.referencing(field, target))
    }

    /// Clear every index (before a rebuild)
    pub fn clear(&mut self) {
        for indexes in self.tables.values_mut() {
            indexes.clear();
        }
    }
}
