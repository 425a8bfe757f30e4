use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{today, Entity};

/// An instructor. Courses point at instructors; instructors own nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructor {
    pub name: String,
    pub email: String,
    pub department: String,
    pub hire_date: NaiveDate,
}

impl Instructor {
    /// New instructor hired today.
    pub fn new(name: impl Into<String>, email: impl Into<String>, department: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            department: department.into(),
            hire_date: today(),
        }
    }

    pub fn hired_on(mut self, date: NaiveDate) -> Self {
        self.hire_date = date;
        self
    }
}

impl Entity for Instructor {
    const TABLE: &'static str = "instructor";
}

impl fmt::Display for Instructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.department)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_uses_department() {
        let i = Instructor::new("Grace Hopper", "grace@uni.edu", "Computer Science");
        assert_eq!(i.to_string(), "Grace Hopper (Computer Science)");
    }
}
