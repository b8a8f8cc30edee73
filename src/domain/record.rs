//! Extraction results.
//!
//! A `Record` is what the extractor produces from one text: every field is
//! optional because free-form input rarely carries all of them. Once the
//! gaps are filled it converts into a `Student`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the five tracked attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    College,
    Course,
    Name,
    Group,
    Id,
}

impl Field {
    /// Fixed processing order for extraction and prompting
    pub const ALL: [Field; 5] = [
        Field::College,
        Field::Course,
        Field::Name,
        Field::Group,
        Field::Id,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::College => "college",
            Field::Course => "course",
            Field::Name => "name",
            Field::Group => "group",
            Field::Id => "id",
        }
    }

    /// Human-readable label used by prompts and rendering
    pub fn display_label(&self) -> &'static str {
        match self {
            Field::College => "College",
            Field::Course => "Course",
            Field::Name => "Full name",
            Field::Group => "Group",
            Field::Id => "ID",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RecordError::UnknownField(s.to_string()))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("record is missing fields: {}", join_fields(.missing))]
    Incomplete { missing: Vec<Field> },

    #[error("unknown field: {0}")]
    UnknownField(String),
}

fn join_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(Field::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Extracted values, absent where nothing matched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub college: Option<String>,
    pub course: Option<String>,
    pub name: Option<String>,
    pub group: Option<String>,
    pub id: Option<String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.slot(field).as_deref()
    }

    fn slot(&self, field: Field) -> &Option<String> {
        match field {
            Field::College => &self.college,
            Field::Course => &self.course,
            Field::Name => &self.name,
            Field::Group => &self.group,
            Field::Id => &self.id,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::College => &mut self.college,
            Field::Course => &mut self.course,
            Field::Name => &mut self.name,
            Field::Group => &mut self.group,
            Field::Id => &mut self.id,
        }
    }

    /// Return a copy with `field` set to `value`
    pub fn with_value(&self, field: Field, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        *next.slot_mut(field) = Some(value.into());
        next
    }

    /// Return a copy where every absent slot takes the value from `other`.
    /// Present slots are never overwritten.
    pub fn fill_missing(&self, other: &Record) -> Self {
        let mut next = self.clone();
        for field in Field::ALL {
            if next.get(field).is_none() {
                *next.slot_mut(field) = other.slot(field).clone();
            }
        }
        next
    }

    /// Absent fields in `Field::ALL` order
    pub fn missing(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|field| self.get(*field).is_none())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Present fields with their values, in `Field::ALL` order
    pub fn present(&self) -> Vec<(Field, &str)> {
        Field::ALL
            .into_iter()
            .filter_map(|field| self.get(field).map(|value| (field, value)))
            .collect()
    }

    pub fn into_student(self) -> Result<Student, RecordError> {
        let missing = self.missing();
        match self {
            Record {
                college: Some(college),
                course: Some(course),
                name: Some(name),
                group: Some(group),
                id: Some(id),
            } => Ok(Student {
                college,
                course,
                name,
                group,
                id,
            }),
            _ => Err(RecordError::Incomplete { missing }),
        }
    }
}

impl From<Student> for Record {
    fn from(student: Student) -> Self {
        Self {
            college: Some(student.college),
            course: Some(student.course),
            name: Some(student.name),
            group: Some(student.group),
            id: Some(student.id),
        }
    }
}

/// A record with every field present
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    #[serde(default)]
    pub college: String,
    #[serde(default)]
    pub course: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub id: String,
}

impl Student {
    pub fn new(
        college: impl Into<String>,
        course: impl Into<String>,
        name: impl Into<String>,
        group: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            college: college.into(),
            course: course.into(),
            name: name.into(),
            group: group.into(),
            id: id.into(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::College => &self.college,
            Field::Course => &self.course,
            Field::Name => &self.name,
            Field::Group => &self.group,
            Field::Id => &self.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_follows_field_order() {
        let record = Record::new()
            .with_value(Field::Name, "Ivanov I.I.")
            .with_value(Field::Course, "2");

        assert_eq!(
            record.missing(),
            vec![Field::College, Field::Group, Field::Id]
        );
        assert!(!record.is_complete());
    }

    #[test]
    fn test_fill_missing_keeps_present_values() {
        let extracted = Record::new().with_value(Field::Name, "Ivanov I.I.");
        let typed = Record::new()
            .with_value(Field::Name, "Petrov P.P.")
            .with_value(Field::Group, "G1");

        let merged = extracted.fill_missing(&typed);

        assert_eq!(merged.get(Field::Name), Some("Ivanov I.I."));
        assert_eq!(merged.get(Field::Group), Some("G1"));
        assert_eq!(merged.get(Field::Id), None);
        // Source record untouched
        assert_eq!(extracted.get(Field::Group), None);
    }

    #[test]
    fn test_into_student_reports_missing() {
        let err = Record::new()
            .with_value(Field::Name, "Ivanov I.I.")
            .into_student()
            .unwrap_err();

        assert_eq!(
            err,
            RecordError::Incomplete {
                missing: vec![Field::College, Field::Course, Field::Group, Field::Id]
            }
        );
        assert!(err.to_string().contains("college, course, group, id"));
    }

    #[test]
    fn test_into_student_complete() {
        let student = Student::new("MIT", "1", "Ivanov I.I.", "G1", "42");
        let record = Record::from(student.clone());

        assert!(record.is_complete());
        assert_eq!(record.into_student().unwrap(), student);
    }

    #[test]
    fn test_field_from_str() {
        assert_eq!("NAME".parse::<Field>().unwrap(), Field::Name);
        assert_eq!(" id ".parse::<Field>().unwrap(), Field::Id);
        assert!("surname".parse::<Field>().is_err());
    }
}
