//! Row validator
//!
//! Validation semantics:
//! - Only declared fields may appear
//! - Absent fields take their default, or null when nullable
//! - Null only where the field is nullable
//! - Text and email respect max length and blank rules
//! - Dates are ISO `YYYY-MM-DD`
//! - Positive small ints are integers in 0..=32767
//! - Choices come from the declared set
//! - References are positive integer ids (existence is checked by the engine)

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;

use super::catalog::Catalog;
use super::errors::{SchemaError, SchemaResult, ValidationDetails};
use super::types::{DefaultValue, FieldDef, FieldType, TableSchema, POSITIVE_SMALL_INT_MAX};
use crate::records::Row;

/// Date format used for every date field
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// `local@domain.tld` with an alphabetic (or punycode) TLD of two or more
/// characters, or `local@localhost`.
fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@(?:localhost|(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+(?:[A-Za-z]{2,63}|xn--[A-Za-z0-9]{1,59}))$",
        )
        .expect("email pattern is a valid regex")
    })
}

/// Validates rows against the catalog.
///
/// The validator never touches storage; uniqueness and reference
/// existence belong to the engine.
pub struct RowValidator<'a> {
    catalog: &'a Catalog,
}

impl<'a> RowValidator<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Fills absent fields with their defaults (or null when nullable).
    ///
    /// Present fields are left untouched, including explicit nulls.
    pub fn fill_defaults(&self, table: &str, row: &mut Row, today: NaiveDate) -> SchemaResult<()> {
        let schema = self.catalog.get(table)?;
        for field in &schema.fields {
            if row.contains_key(&field.name) {
                continue;
            }
            let value = match &field.default {
                Some(DefaultValue::Today) => Value::String(today.format(DATE_FORMAT).to_string()),
                Some(DefaultValue::Int(v)) => Value::from(*v),
                Some(DefaultValue::Text(s)) => Value::String(s.clone()),
                None if field.nullable => Value::Null,
                None => continue,
            };
            row.insert(field.name.clone(), value);
        }
        Ok(())
    }

    /// Validates a complete row.
    ///
    /// # Errors
    ///
    /// - REG_UNKNOWN_TABLE if the table is not declared
    /// - REG_SCHEMA_VALIDATION_FAILED on the first violated field
    pub fn validate_row(&self, table: &str, row: &Row) -> SchemaResult<()> {
        let schema = self.catalog.get(table)?;

        for key in row.keys() {
            if schema.field(key).is_none() {
                return Err(SchemaError::validation_failed(table, ValidationDetails::extra_field(key)));
            }
        }

        for field in &schema.fields {
            match row.get(&field.name) {
                None => {
                    return Err(SchemaError::validation_failed(
                        table,
                        ValidationDetails::missing_field(&field.name),
                    ))
                }
                Some(Value::Null) => {
                    if !field.nullable {
                        return Err(SchemaError::validation_failed(
                            table,
                            ValidationDetails::null_value(&field.name),
                        ));
                    }
                }
                Some(value) => validate_value(schema, field, value)?,
            }
        }

        Ok(())
    }
}

fn validate_value(schema: &TableSchema, field: &FieldDef, value: &Value) -> SchemaResult<()> {
    let table = schema.name.as_str();
    match &field.field_type {
        FieldType::Text { max_length } => {
            validate_text(table, field, value, *max_length)?;
        }
        FieldType::Email { max_length } => {
            let text = validate_text(table, field, value, *max_length)?;
            if !text.is_empty() && !email_pattern().is_match(text) {
                return Err(SchemaError::validation_failed(
                    table,
                    ValidationDetails::new(&field.name, "a valid email address", format!("'{}'", text)),
                ));
            }
        }
        FieldType::Date => {
            let text = value
                .as_str()
                .ok_or_else(|| type_error(table, field, value))?;
            if NaiveDate::parse_from_str(text, DATE_FORMAT).is_err() {
                return Err(SchemaError::validation_failed(
                    table,
                    ValidationDetails::new(&field.name, "a date formatted YYYY-MM-DD", format!("'{}'", text)),
                ));
            }
        }
        FieldType::PositiveSmallInt => {
            let n = value.as_i64().ok_or_else(|| type_error(table, field, value))?;
            if !(0..=POSITIVE_SMALL_INT_MAX).contains(&n) {
                return Err(SchemaError::validation_failed(
                    table,
                    ValidationDetails::new(
                        &field.name,
                        format!("an integer between 0 and {}", POSITIVE_SMALL_INT_MAX),
                        n.to_string(),
                    ),
                ));
            }
        }
        FieldType::Choice { max_length, choices } => {
            let text = validate_text(table, field, value, *max_length)?;
            if !choices.iter().any(|c| c.value == text) {
                let allowed: Vec<String> = choices.iter().map(|c| format!("'{}'", c.value)).collect();
                return Err(SchemaError::validation_failed(
                    table,
                    ValidationDetails::new(
                        &field.name,
                        format!("one of {}", allowed.join(", ")),
                        format!("'{}'", text),
                    ),
                ));
            }
        }
        FieldType::Reference { .. } => match value.as_u64() {
            Some(id) if id > 0 => {}
            _ => {
                return Err(SchemaError::validation_failed(
                    table,
                    ValidationDetails::new(&field.name, "a positive record id", value.to_string()),
                ))
            }
        },
    }
    Ok(())
}

fn validate_text<'v>(
    table: &str,
    field: &FieldDef,
    value: &'v Value,
    max_length: usize,
) -> SchemaResult<&'v str> {
    let text = value.as_str().ok_or_else(|| type_error(table, field, value))?;
    if text.is_empty() && !field.blank {
        return Err(SchemaError::validation_failed(
            table,
            ValidationDetails::blank_value(&field.name),
        ));
    }
    let length = text.chars().count();
    if length > max_length {
        return Err(SchemaError::validation_failed(
            table,
            ValidationDetails::too_long(&field.name, max_length, length),
        ));
    }
    Ok(text)
}

fn type_error(table: &str, field: &FieldDef, value: &Value) -> SchemaError {
    SchemaError::validation_failed(
        table,
        ValidationDetails::new(&field.name, field.field_type.type_name(), json_type_name(value)),
    )
}

/// Returns the JSON type name of a value
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
    }

    fn student() -> Row {
        row(json!({
            "name": "Alice",
            "email": "alice@uni.edu",
            "department": "CS",
            "enrollment_date": "2024-09-01"
        }))
    }

    #[test]
    fn test_valid_student() {
        let catalog = Catalog::university();
        let validator = RowValidator::new(&catalog);
        assert!(validator.validate_row("student", &student()).is_ok());
    }

    #[test]
    fn test_defaults_fill_absent_fields() {
        let catalog = Catalog::university();
        let validator = RowValidator::new(&catalog);

        let mut course = row(json!({"course_code": "CS101", "title": "Intro"}));
        validator.fill_defaults("course", &mut course, today()).unwrap();
        assert_eq!(course["credits"], json!(3));
        assert_eq!(course["instructor_id"], Value::Null);
        assert!(validator.validate_row("course", &course).is_ok());

        let mut enrollment = row(json!({"student_id": 1, "course_id": 2}));
        validator.fill_defaults("enrollment", &mut enrollment, today()).unwrap();
        assert_eq!(enrollment["enrollment_date"], json!("2024-09-02"));
        assert_eq!(enrollment["grade"], json!(""));
    }

    #[test]
    fn test_missing_required_field() {
        let catalog = Catalog::university();
        let validator = RowValidator::new(&catalog);
        let mut r = student();
        r.remove("department");
        let err = validator.validate_row("student", &r).unwrap_err();
        assert_eq!(err.details().unwrap().field, "department");
    }

    #[test]
    fn test_extra_field_rejected() {
        let catalog = Catalog::university();
        let validator = RowValidator::new(&catalog);
        let mut r = student();
        r.insert("gpa".into(), json!(3.9));
        let err = validator.validate_row("student", &r).unwrap_err();
        assert_eq!(err.details().unwrap().actual, "extra field present");
    }

    #[test]
    fn test_blank_and_length_rules() {
        let catalog = Catalog::university();
        let validator = RowValidator::new(&catalog);

        let mut blank = student();
        blank.insert("name".into(), json!(""));
        assert!(validator.validate_row("student", &blank).is_err());

        let mut long = student();
        long.insert("department".into(), json!("x".repeat(121)));
        let err = validator.validate_row("student", &long).unwrap_err();
        assert!(err.message().contains("at most 120"));

        let mut exact = student();
        exact.insert("department".into(), json!("x".repeat(120)));
        assert!(validator.validate_row("student", &exact).is_ok());
    }

    #[test]
    fn test_email_format() {
        let catalog = Catalog::university();
        let validator = RowValidator::new(&catalog);
        for bad in ["alice", "alice@", "@uni.edu", "alice@uni", "a b@uni.edu", "a@uni.c", "a@uni.123", "a@-uni.edu"] {
            let mut r = student();
            r.insert("email".into(), json!(bad));
            assert!(validator.validate_row("student", &r).is_err(), "{} accepted", bad);
        }
        for good in ["user@localhost", "o'neil+cs@mail.uni.edu", "a@uni.xn--p1ai"] {
            let mut r = student();
            r.insert("email".into(), json!(good));
            assert!(validator.validate_row("student", &r).is_ok(), "{} rejected", good);
        }
    }

    #[test]
    fn test_date_format() {
        let catalog = Catalog::university();
        let validator = RowValidator::new(&catalog);
        let mut r = student();
        r.insert("enrollment_date".into(), json!("2024-02-30"));
        assert!(validator.validate_row("student", &r).is_err());
        r.insert("enrollment_date".into(), json!(20240201));
        assert!(validator.validate_row("student", &r).is_err());
    }

    #[test]
    fn test_credits_range() {
        let catalog = Catalog::university();
        let validator = RowValidator::new(&catalog);
        let base = json!({"course_code": "CS101", "title": "Intro", "instructor_id": null});
        for (credits, ok) in [(json!(0), true), (json!(32767), true), (json!(-1), false), (json!(32768), false), (json!(2.5), false)] {
            let mut r = row(base.clone());
            r.insert("credits".into(), credits.clone());
            assert_eq!(validator.validate_row("course", &r).is_ok(), ok, "credits {}", credits);
        }
    }

    #[test]
    fn test_grade_choices() {
        let catalog = Catalog::university();
        let validator = RowValidator::new(&catalog);
        let base = json!({"student_id": 1, "course_id": 1, "enrollment_date": "2024-09-01"});
        for grade in ["A", "A-", "B+", "B", "B-", "C+", "C", "D", "F", "I", ""] {
            let mut r = row(base.clone());
            r.insert("grade".into(), json!(grade));
            assert!(validator.validate_row("enrollment", &r).is_ok(), "{} rejected", grade);
        }
        for grade in ["E", "A+", "a", "Incomplete"] {
            let mut r = row(base.clone());
            r.insert("grade".into(), json!(grade));
            assert!(validator.validate_row("enrollment", &r).is_err(), "{} accepted", grade);
        }
    }

    #[test]
    fn test_reference_nullability() {
        let catalog = Catalog::university();
        let validator = RowValidator::new(&catalog);
        let r = row(json!({"student_id": null, "course_id": 1, "enrollment_date": "2024-09-01", "grade": ""}));
        let err = validator.validate_row("enrollment", &r).unwrap_err();
        assert_eq!(err.details().unwrap().actual, "null");

        let r = row(json!({"student_id": 0, "course_id": 1, "enrollment_date": "2024-09-01", "grade": ""}));
        assert!(validator.validate_row("enrollment", &r).is_err());
    }
}
