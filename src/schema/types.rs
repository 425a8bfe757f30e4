//! Table declaration types
//!
//! Supported field types:
//! - text: UTF-8 string with a maximum character length
//! - email: text that must look like an address
//! - date: ISO calendar date (YYYY-MM-DD)
//! - positive_small_int: integer in 0..=32767
//! - choice: text restricted to an enumerated set
//! - reference: id of a row in another table, with a delete policy

use serde::{Deserialize, Serialize};

/// Largest value accepted by a positive small integer field.
pub const POSITIVE_SMALL_INT_MAX: i64 = 32767;

/// What happens to a referencing row when its target is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnDelete {
    /// Delete the referencing row too
    Cascade,
    /// Clear the reference, keep the row
    SetNull,
}

impl OnDelete {
    /// SQL spelling of the policy
    pub fn as_sql(&self) -> &'static str {
        match self {
            OnDelete::Cascade => "CASCADE",
            OnDelete::SetNull => "SET NULL",
        }
    }
}

/// One allowed value of a choice field and its human label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Supported field types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    Text { max_length: usize },
    Email { max_length: usize },
    Date,
    PositiveSmallInt,
    Choice { max_length: usize, choices: Vec<Choice> },
    Reference { table: String, on_delete: OnDelete },
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::Text { .. } => "text",
            FieldType::Email { .. } => "email",
            FieldType::Date => "date",
            FieldType::PositiveSmallInt => "positive_small_int",
            FieldType::Choice { .. } => "choice",
            FieldType::Reference { .. } => "reference",
        }
    }

    /// Maximum character length for string-valued types
    pub fn max_length(&self) -> Option<usize> {
        match self {
            FieldType::Text { max_length }
            | FieldType::Email { max_length }
            | FieldType::Choice { max_length, .. } => Some(*max_length),
            _ => None,
        }
    }
}

/// Value used when a field is absent from an inserted row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DefaultValue {
    /// The current calendar date at write time
    Today,
    Int(i64),
    Text(String),
}

/// Field definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(flatten)]
    pub field_type: FieldType,
    /// Null is a legal stored value
    #[serde(default)]
    pub nullable: bool,
    /// Empty string is a legal value
    #[serde(default)]
    pub blank: bool,
    /// No two rows may share this value
    #[serde(default)]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
}

impl FieldDef {
    fn of(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable: false,
            blank: false,
            unique: false,
            default: None,
        }
    }

    /// Create a required text field
    pub fn text(name: impl Into<String>, max_length: usize) -> Self {
        Self::of(name, FieldType::Text { max_length })
    }

    /// Create a required email field
    pub fn email(name: impl Into<String>, max_length: usize) -> Self {
        Self::of(name, FieldType::Email { max_length })
    }

    /// Create a required date field
    pub fn date(name: impl Into<String>) -> Self {
        Self::of(name, FieldType::Date)
    }

    /// Create a required positive small integer field
    pub fn positive_small_int(name: impl Into<String>) -> Self {
        Self::of(name, FieldType::PositiveSmallInt)
    }

    /// Create a required choice field
    pub fn choice(name: impl Into<String>, max_length: usize, choices: Vec<Choice>) -> Self {
        Self::of(name, FieldType::Choice { max_length, choices })
    }

    /// Create a required reference field
    pub fn reference(name: impl Into<String>, table: impl Into<String>, on_delete: OnDelete) -> Self {
        Self::of(
            name,
            FieldType::Reference {
                table: table.into(),
                on_delete,
            },
        )
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn blank(mut self) -> Self {
        self.blank = true;
        self
    }

    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Returns the referenced table and delete policy for reference fields
    pub fn reference_target(&self) -> Option<(&str, OnDelete)> {
        match &self.field_type {
            FieldType::Reference { table, on_delete } => Some((table.as_str(), *on_delete)),
            _ => None,
        }
    }
}

/// One ordering key of a table's default listing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderKey {
    pub field: String,
    #[serde(default)]
    pub descending: bool,
}

impl OrderKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

/// Complete declaration of one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    /// Fields in declaration order; the implicit `id` is not listed
    pub fields: Vec<FieldDef>,
    /// Composite uniqueness constraints
    #[serde(default)]
    pub unique_together: Vec<Vec<String>>,
    #[serde(default)]
    pub ordering: Vec<OrderKey>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            fields,
            unique_together: Vec::new(),
            ordering: Vec::new(),
        }
    }

    pub fn unique_together(mut self, fields: &[&str]) -> Self {
        self.unique_together
            .push(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn ordered_by(mut self, key: OrderKey) -> Self {
        self.ordering.push(key);
        self
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// All uniqueness constraints as field lists, single-field ones first
    pub fn unique_constraints(&self) -> Vec<Vec<String>> {
        let mut constraints: Vec<Vec<String>> = self
            .fields
            .iter()
            .filter(|f| f.unique)
            .map(|f| vec![f.name.clone()])
            .collect();
        constraints.extend(self.unique_together.iter().cloned());
        constraints
    }

    /// Reference fields with their target table and policy
    pub fn references(&self) -> impl Iterator<Item = (&FieldDef, &str, OnDelete)> {
        self.fields
            .iter()
            .filter_map(|f| f.reference_target().map(|(t, p)| (f, t, p)))
    }

    /// Validates the declaration itself (not a row)
    pub fn validate_structure(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("Table name must not be empty".into());
        }

        let mut seen = std::collections::HashSet::new();
        for field in &self.fields {
            if field.name == "id" {
                return Err(format!("Table '{}' must not declare the implicit 'id' field", self.name));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(format!("Table '{}' declares '{}' twice", self.name, field.name));
            }
            if let FieldType::Choice { choices, .. } = &field.field_type {
                if choices.is_empty() {
                    return Err(format!("Choice field '{}' has no choices", field.name));
                }
            }
            if field.default.is_some() && field.reference_target().is_some() {
                return Err(format!("Reference field '{}' cannot carry a default", field.name));
            }
        }

        for group in &self.unique_together {
            if group.is_empty() {
                return Err(format!("Table '{}' has an empty unique_together group", self.name));
            }
            for name in group {
                if self.field(name).is_none() {
                    return Err(format!("unique_together names unknown field '{}'", name));
                }
            }
        }

        for key in &self.ordering {
            if key.field != "id" && self.field(&key.field).is_none() {
                return Err(format!("ordering names unknown field '{}'", key.field));
            }
        }

        Ok(())
    }
}
