use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Entity, RecordId};

/// Credits given to a course when none are specified
pub const DEFAULT_CREDITS: u16 = 3;

/// A course, optionally taught by one instructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub course_code: String,
    pub title: String,
    pub credits: u16,
    /// Cleared when the instructor is deleted
    pub instructor_id: Option<RecordId>,
}

impl Course {
    pub fn new(course_code: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            course_code: course_code.into(),
            title: title.into(),
            credits: DEFAULT_CREDITS,
            instructor_id: None,
        }
    }

    pub fn with_credits(mut self, credits: u16) -> Self {
        self.credits = credits;
        self
    }

    pub fn taught_by(mut self, instructor: RecordId) -> Self {
        self.instructor_id = Some(instructor);
        self
    }
}

impl Entity for Course {
    const TABLE: &'static str = "course";
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.course_code, self.title)
    }
}
