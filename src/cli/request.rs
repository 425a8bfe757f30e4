//! Requests accepted by `registrar exec`
//!
//! ```json
//! {"op": "insert", "table": "student", "row": {"name": "Alice", "email": "alice@u.edu", "department": "CS"}}
//! {"op": "patch", "table": "enrollment", "id": 1, "changes": {"grade": "A"}}
//! {"op": "list", "table": "enrollment", "filter": {"course_id": 2}}
//! ```

use serde::Deserialize;
use serde_json::{json, Value};

use crate::records::{RecordId, Row};
use crate::university::{Registrar, RegistrarResult};

/// One request line
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Insert { table: String, row: Row },
    Update { table: String, id: RecordId, row: Row },
    Patch { table: String, id: RecordId, changes: Row },
    Delete { table: String, id: RecordId },
    Get { table: String, id: RecordId },
    List {
        table: String,
        #[serde(default)]
        filter: Option<Row>,
    },
    Label { table: String, id: RecordId },
}

impl Request {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

/// Row as returned to clients: the stored fields plus `id`
pub fn row_with_id(id: RecordId, row: &Row) -> Value {
    let mut object = Row::with_capacity(row.len() + 1);
    object.insert("id".to_string(), json!(id));
    object.extend(row.iter().map(|(k, v)| (k.clone(), v.clone())));
    Value::Object(object)
}

/// Executes one request against the session.
pub fn dispatch(registrar: &mut Registrar, request: Request) -> RegistrarResult<Value> {
    match request {
        Request::Insert { table, row } => {
            let id = registrar.insert_row(&table, row)?;
            Ok(row_with_id(id, registrar.get_row(&table, id)?))
        }
        Request::Update { table, id, row } => {
            registrar.update_row(&table, id, row)?;
            Ok(row_with_id(id, registrar.get_row(&table, id)?))
        }
        Request::Patch { table, id, changes } => {
            registrar.patch_row(&table, id, changes)?;
            Ok(row_with_id(id, registrar.get_row(&table, id)?))
        }
        Request::Delete { table, id } => Ok(json!(registrar.delete_row(&table, id)?)),
        Request::Get { table, id } => Ok(row_with_id(id, registrar.get_row(&table, id)?)),
        Request::List { table, filter } => {
            let rows = match filter {
                Some(predicates) => registrar.database().filter(&table, &predicates)?,
                None => registrar.list_rows(&table)?,
            };
            Ok(Value::Array(rows.into_iter().map(|(id, row)| row_with_id(id, row)).collect()))
        }
        Request::Label { table, id } => Ok(json!({"label": registrar.label(&table, id)?})),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(registrar: &mut Registrar, value: Value) -> RegistrarResult<Value> {
        dispatch(registrar, Request::from_value(value).unwrap())
    }

    #[test]
    fn test_parse_ops() {
        let req = Request::from_value(json!({"op": "get", "table": "student", "id": 3})).unwrap();
        assert_eq!(
            req,
            Request::Get {
                table: "student".into(),
                id: RecordId::new(3)
            }
        );
        assert!(Request::from_value(json!({"op": "truncate", "table": "student"})).is_err());
        assert!(Request::from_value(json!({"table": "student"})).is_err());
    }

    #[test]
    fn test_insert_get_label() {
        let mut reg = Registrar::in_memory().unwrap();
        let inserted = run(
            &mut reg,
            json!({"op": "insert", "table": "course", "row": {"course_code": "CS101", "title": "Intro"}}),
        )
        .unwrap();
        assert_eq!(inserted["id"], json!(1));
        assert_eq!(inserted["credits"], json!(3));

        let label = run(&mut reg, json!({"op": "label", "table": "course", "id": 1})).unwrap();
        assert_eq!(label["label"], json!("CS101 - Intro"));
    }

    #[test]
    fn test_list_with_filter_and_delete_summary() {
        let mut reg = Registrar::in_memory().unwrap();
        for (name, email) in [("Bob", "bob@u.edu"), ("Alice", "alice@u.edu")] {
            run(
                &mut reg,
                json!({"op": "insert", "table": "student", "row": {"name": name, "email": email, "department": "CS"}}),
            )
            .unwrap();
        }

        let all = run(&mut reg, json!({"op": "list", "table": "student"})).unwrap();
        assert_eq!(all[0]["name"], json!("Alice"));
        assert_eq!(all[1]["name"], json!("Bob"));

        let filtered = run(&mut reg, json!({"op": "list", "table": "student", "filter": {"name": "Bob"}})).unwrap();
        assert_eq!(filtered.as_array().unwrap().len(), 1);

        let summary = run(&mut reg, json!({"op": "delete", "table": "student", "id": 1})).unwrap();
        assert_eq!(summary["deleted"][0], json!({"table": "student", "id": 1}));
        assert_eq!(summary["nullified"], json!([]));
    }

    #[test]
    fn test_duplicate_enrollment_surfaces_validation_code() {
        let mut reg = Registrar::in_memory().unwrap();
        run(
            &mut reg,
            json!({"op": "insert", "table": "student", "row": {"name": "Alice", "email": "a@u.edu", "department": "CS"}}),
        )
        .unwrap();
        run(&mut reg, json!({"op": "insert", "table": "course", "row": {"course_code": "CS101", "title": "Intro"}}))
            .unwrap();
        let enroll = json!({"op": "insert", "table": "enrollment", "row": {"student_id": 1, "course_id": 1}});
        run(&mut reg, enroll.clone()).unwrap();

        let err = run(&mut reg, enroll).unwrap_err();
        assert_eq!(err.code(), "REG_VALIDATION_ERROR");
        assert_eq!(err.message(), "This student is already enrolled in this course.");
    }
}
