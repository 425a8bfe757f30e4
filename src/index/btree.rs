//! BTreeMap-based constraint index structures
//!
//! Deterministic ordering everywhere: keys iterate in `Ord` order and
//! reference sets iterate by ascending record id.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_json::Value;

use crate::records::RecordId;

/// Index key representing one field value.
///
/// Ordering is deterministic: Int < String.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKey {
    Int(i64),
    String(String),
}

impl IndexKey {
    /// Create a key from a JSON value.
    ///
    /// Null yields `None`: a null never collides with anything, so it is
    /// never indexed.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(IndexKey::Int),
            Value::String(s) => Some(IndexKey::String(s.clone())),
            Value::Bool(b) => Some(IndexKey::Int(i64::from(*b))),
            _ => None,
        }
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKey::Int(v) => write!(f, "{}", v),
            IndexKey::String(s) => write!(f, "'{}'", s),
        }
    }
}

/// Ordered tuple of keys for single-field and composite constraints.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompositeKey(pub Vec<IndexKey>);

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|k| k.to_string()).collect();
        write!(f, "({})", parts.join(", "))
    }
}

/// Maps each key to the single record that holds it.
#[derive(Debug, Default)]
pub struct UniqueTree {
    tree: BTreeMap<CompositeKey, RecordId>,
}

impl UniqueTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a key for a record.
    ///
    /// Returns the current holder if a different record already owns it.
    pub fn insert(&mut self, key: CompositeKey, id: RecordId) -> Result<(), RecordId> {
        match self.tree.get(&key) {
            Some(holder) if *holder != id => Err(*holder),
            _ => {
                self.tree.insert(key, id);
                Ok(())
            }
        }
    }

    /// Release a key, only if `id` holds it.
    pub fn remove(&mut self, key: &CompositeKey, id: RecordId) {
        if self.tree.get(key) == Some(&id) {
            self.tree.remove(key);
        }
    }

    pub fn lookup(&self, key: &CompositeKey) -> Option<RecordId> {
        self.tree.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }
}

/// Reverse index of one reference field: target id to referencing ids.
#[derive(Debug, Default)]
pub struct ReferenceTree {
    tree: BTreeMap<RecordId, BTreeSet<RecordId>>,
}

impl ReferenceTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, target: RecordId, source: RecordId) {
        self.tree.entry(target).or_default().insert(source);
    }

    /// Removes one edge; drops the target entry once empty.
    pub fn remove(&mut self, target: RecordId, source: RecordId) {
        if let Some(sources) = self.tree.get_mut(&target) {
            sources.remove(&source);
            if sources.is_empty() {
                self.tree.remove(&target);
            }
        }
    }

    /// Records pointing at `target`, ascending.
    pub fn referencing(&self, target: RecordId) -> Vec<RecordId> {
        self.tree
            .get(&target)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn edge_count(&self) -> usize {
        self.tree.values().map(|s| s.len()).sum()
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(s: &str) -> CompositeKey {
        CompositeKey(vec![IndexKey::String(s.into())])
    }

    #[test]
    fn test_key_ordering() {
        assert!(IndexKey::Int(100) < IndexKey::String("a".into()));
        assert!(IndexKey::String("aaa".into()) < IndexKey::String("zzz".into()));
    }

    #[test]
    fn test_null_is_not_indexed() {
        assert_eq!(IndexKey::from_json(&json!(null)), None);
        assert_eq!(IndexKey::from_json(&json!(5)), Some(IndexKey::Int(5)));
        assert_eq!(IndexKey::from_json(&json!("x")), Some(IndexKey::String("x".into())));
    }

    #[test]
    fn test_unique_tree_rejects_second_holder() {
        let mut tree = UniqueTree::new();
        assert!(tree.insert(key("alice@uni.edu"), RecordId::new(1)).is_ok());
        assert_eq!(tree.insert(key("alice@uni.edu"), RecordId::new(2)), Err(RecordId::new(1)));
        // Same holder re-inserting is fine
        assert!(tree.insert(key("alice@uni.edu"), RecordId::new(1)).is_ok());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_unique_tree_remove_only_by_holder() {
        let mut tree = UniqueTree::new();
        tree.insert(key("k"), RecordId::new(1)).unwrap();
        tree.remove(&key("k"), RecordId::new(2));
        assert_eq!(tree.lookup(&key("k")), Some(RecordId::new(1)));
        tree.remove(&key("k"), RecordId::new(1));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_reference_tree() {
        let mut tree = ReferenceTree::new();
        tree.insert(RecordId::new(1), RecordId::new(30));
        tree.insert(RecordId::new(1), RecordId::new(10));
        tree.insert(RecordId::new(2), RecordId::new(20));

        assert_eq!(tree.referencing(RecordId::new(1)), vec![RecordId::new(10), RecordId::new(30)]);
        assert_eq!(tree.edge_count(), 3);

        tree.remove(RecordId::new(2), RecordId::new(20));
        assert!(tree.referencing(RecordId::new(2)).is_empty());
        assert_eq!(tree.edge_count(), 2);
    }

    #[test]
    fn test_composite_key_display() {
        let k = CompositeKey(vec![IndexKey::Int(1), IndexKey::String("CS101".into())]);
        assert_eq!(k.to_string(), "(1, 'CS101')");
    }
}
