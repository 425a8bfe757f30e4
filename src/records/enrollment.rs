use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{today, Course, Entity, RecordId, Student};

/// Letter grade of an enrollment.
///
/// `NotGraded` is stored as the empty string and is also the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "F")]
    F,
    #[serde(rename = "I")]
    Incomplete,
    #[default]
    #[serde(rename = "")]
    NotGraded,
}

impl Grade {
    /// Every grade, in display order
    pub const ALL: [Grade; 11] = [
        Grade::A,
        Grade::AMinus,
        Grade::BPlus,
        Grade::B,
        Grade::BMinus,
        Grade::CPlus,
        Grade::C,
        Grade::D,
        Grade::F,
        Grade::Incomplete,
        Grade::NotGraded,
    ];

    /// Stored value
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::AMinus => "A-",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::BMinus => "B-",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
            Grade::Incomplete => "I",
            Grade::NotGraded => "",
        }
    }

    /// Human label
    pub fn label(&self) -> &'static str {
        match self {
            Grade::Incomplete => "Incomplete",
            Grade::NotGraded => "Not graded",
            other => other.as_str(),
        }
    }

    pub fn is_graded(&self) -> bool {
        *self != Grade::NotGraded
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A grade string outside the allowed set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a valid grade")]
pub struct UnknownGrade(pub String);

impl FromStr for Grade {
    type Err = UnknownGrade;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Grade::ALL
            .iter()
            .copied()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| UnknownGrade(s.to_string()))
    }
}

/// A student's enrollment in a course. At most one per (student, course).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub student_id: RecordId,
    pub course_id: RecordId,
    pub enrollment_date: NaiveDate,
    #[serde(default)]
    pub grade: Grade,
}

impl Enrollment {
    /// New ungraded enrollment dated today.
    pub fn new(student_id: RecordId, course_id: RecordId) -> Self {
        Self {
            student_id,
            course_id,
            enrollment_date: today(),
            grade: Grade::NotGraded,
        }
    }

    pub fn enrolled_on(mut self, date: NaiveDate) -> Self {
        self.enrollment_date = date;
        self
    }

    pub fn with_grade(mut self, grade: Grade) -> Self {
        self.grade = grade;
        self
    }

    /// Label built from the resolved student and course.
    pub fn label(&self, student: &Student, course: &Course) -> String {
        format!("{} in {}", student.name, course.course_code)
    }
}

impl Entity for Enrollment {
    const TABLE: &'static str = "enrollment";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_grade_round_trips_through_str() {
        for grade in Grade::ALL {
            assert_eq!(grade.as_str().parse::<Grade>().unwrap(), grade);
        }
        assert_eq!("A+".parse::<Grade>(), Err(UnknownGrade("A+".into())));
    }

    #[test]
    fn test_grade_serde_uses_stored_values() {
        assert_eq!(serde_json::to_value(Grade::BPlus).unwrap(), json!("B+"));
        assert_eq!(serde_json::to_value(Grade::NotGraded).unwrap(), json!(""));
        let g: Grade = serde_json::from_value(json!("I")).unwrap();
        assert_eq!(g, Grade::Incomplete);
        assert!(serde_json::from_value::<Grade>(json!("E")).is_err());
    }

    #[test]
    fn test_grade_labels() {
        assert_eq!(Grade::Incomplete.label(), "Incomplete");
        assert_eq!(Grade::NotGraded.label(), "Not graded");
        assert_eq!(Grade::AMinus.label(), "A-");
        assert_eq!(Grade::default(), Grade::NotGraded);
        assert!(!Grade::default().is_graded());
    }

    #[test]
    fn test_enrollment_label() {
        let student = Student::new("Alice", "alice@uni.edu", "CS");
        let course = Course::new("CS101", "Intro");
        let e = Enrollment::new(RecordId::new(1), RecordId::new(1));
        assert_eq!(e.label(&student, &course), "Alice in CS101");
    }

    #[test]
    fn test_missing_grade_defaults_to_not_graded() {
        let row = json!({"student_id": 1, "course_id": 2, "enrollment_date": "2024-09-01"});
        let e = Enrollment::from_row(row.as_object().unwrap()).unwrap();
        assert_eq!(e.grade, Grade::NotGraded);
    }
}
