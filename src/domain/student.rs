//! Registry entries.

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use super::record::Student;

/// Status stamped on freshly registered students
pub const DEFAULT_STATUS: &str = "new student";

/// Timestamp layout used in the registry file
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Composite identity of a registry entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StudentKey {
    pub name: String,
    pub group: String,
    pub id: String,
}

impl StudentKey {
    pub fn new(name: impl Into<String>, group: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            id: id.into(),
        }
    }
}

impl std::fmt::Display for StudentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}) #{}", self.name, self.group, self.id)
    }
}

impl From<&Student> for StudentKey {
    fn from(student: &Student) -> Self {
        Self::new(&student.name, &student.group, &student.id)
    }
}

/// A student as persisted in the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredStudent {
    #[serde(flatten)]
    pub student: Student,

    /// When the entry was inserted (local time, second resolution)
    #[serde(with = "registration_date")]
    pub registration_date: NaiveDateTime,

    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    DEFAULT_STATUS.to_string()
}

impl StoredStudent {
    /// Stamp `student` with the current time and the given status
    pub fn register(student: Student, status: impl Into<String>) -> Self {
        let now = Local::now().naive_local();
        Self {
            student,
            // Truncate so the stored value survives a save/load cycle unchanged
            registration_date: now.with_nanosecond(0).unwrap_or(now),
            status: status.into(),
        }
    }

    pub fn key(&self) -> StudentKey {
        StudentKey::from(&self.student)
    }

    pub fn has_key(&self, name: &str, group: &str, id: &str) -> bool {
        self.student.name == name && self.student.group == group && self.student.id == id
    }

    pub fn registration_date_string(&self) -> String {
        self.registration_date.format(DATE_FORMAT).to_string()
    }
}

mod registration_date {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    /// `DATE_FORMAT` plus an optional fraction, which `%.f` omits when zero
    const STORED_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

    pub fn serialize<S>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(STORED_FORMAT).to_string())
    }

    /// Accepts `YYYY-MM-DD HH:MM:SS` with or without fractional seconds, and
    /// ISO 8601 with a `T` separator
    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let raw = raw.trim();
        NaiveDateTime::parse_from_str(raw, STORED_FORMAT)
            .or_else(|_| raw.parse::<NaiveDateTime>())
            .map_err(serde::de::Error::custom)
    }
}
