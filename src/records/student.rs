use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{today, Entity};

/// A student. Emails are unique across students.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub name: String,
    pub email: String,
    pub department: String,
    pub enrollment_date: NaiveDate,
}

impl Student {
    /// New student enrolled today.
    pub fn new(name: impl Into<String>, email: impl Into<String>, department: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            department: department.into(),
            enrollment_date: today(),
        }
    }

    pub fn enrolled_on(mut self, date: NaiveDate) -> Self {
        self.enrollment_date = date;
        self
    }
}

impl Entity for Student {
    const TABLE: &'static str = "student";
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.email)
    }
}
