//! Label-based field extraction.
//!
//! Every field owns an ordered list of label patterns. A pattern matches a
//! line that starts with its label (case-insensitive), followed by a
//! separator and a value running to the end of the line. The first pattern
//! in a field's list that matches anywhere in the text decides the value,
//! so more specific labels are listed before looser ones.
//!
//! Separator rules:
//! - any run of `:` `-` `–` `—` `=` mixed with blanks, e.g. `Group:: G1`,
//!   `Course:- 3`, `name = Ann`; or
//! - at least one blank.
//!
//! A label ending in a word character needs one of those separators unless
//! the value starts with a digit (`ID42`), so `ФИ` never reads the `ФИО`
//! line as `О: ...`. A label ending in a symbol (`№`) may be followed by the
//! value directly (`№5`). A value never starts with a separator character.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::domain::{Field, Record, RecordError};

/// Built-in label sets, highest precedence first
pub const BUILTIN_LABELS: [(Field, &[&str]); 5] = [
    (Field::College, &["Колледж", "College", "Учебное заведение"]),
    (Field::Course, &["Курс", "Course"]),
    (Field::Name, &["ФИО", "ФИ", "Full name", "Name", "Имя"]),
    (Field::Group, &["Команда", "Группа", "Group", "Team"]),
    (Field::Id, &["ID", "ИД", "Номер", "№"]),
];

static BUILTIN: OnceLock<FieldTable> = OnceLock::new();

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid label pattern {label:?}: {source}")]
    InvalidLabel {
        label: String,
        #[source]
        source: regex::Error,
    },

    #[error("field {0} has no labels")]
    EmptyField(Field),

    #[error(transparent)]
    Record(#[from] RecordError),
}

/// A single label matcher
#[derive(Debug, Clone)]
pub struct LabelPattern {
    label: String,
    regex: Regex,
}

impl LabelPattern {
    pub fn new(label: impl Into<String>) -> Result<Self, ExtractError> {
        let label = label.into();
        let trimmed = label.trim();
        let ends_in_word = trimmed
            .chars()
            .last()
            .is_some_and(|c| c.is_alphanumeric() || c == '_');

        let tail = if ends_in_word {
            r"(?:(?:[ \t]*[:\-–—=])+[ \t]*|[ \t]+)([^\s:=\-–—][^\r\n]*)|(\d[^\r\n]*)"
        } else {
            r"(?:[ \t]*[:\-–—=])*[ \t]*([^\s:=\-–—][^\r\n]*)"
        };
        let source = format!(r"(?im)^[ \t]*{}(?:{})", regex::escape(trimmed), tail);

        let regex = Regex::new(&source).map_err(|source| ExtractError::InvalidLabel {
            label: label.clone(),
            source,
        })?;
        Ok(Self { label, regex })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Value of the earliest matching line
    pub fn find(&self, text: &str) -> Option<String> {
        self.find_all(text).next()
    }

    /// Values of every matching line, in text order
    pub fn find_all<'t>(&'t self, text: &'t str) -> impl Iterator<Item = String> + 't {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|value| value.as_str().trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

/// One field and its ordered candidate patterns
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub field: Field,
    patterns: Vec<LabelPattern>,
}

impl FieldSpec {
    pub fn new<I, S>(field: Field, labels: I) -> Result<Self, ExtractError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns = labels
            .into_iter()
            .map(LabelPattern::new)
            .collect::<Result<Vec<_>, _>>()?;

        if patterns.is_empty() {
            return Err(ExtractError::EmptyField(field));
        }

        Ok(Self { field, patterns })
    }

    pub fn labels(&self) -> Vec<&str> {
        self.patterns.iter().map(LabelPattern::label).collect()
    }

    /// First pattern (by priority) with a match decides the value
    pub fn find(&self, text: &str) -> Option<String> {
        self.patterns.iter().find_map(|pattern| {
            let value = pattern.find(text)?;
            debug!(field = %self.field, label = pattern.label(), "Field matched");
            Some(value)
        })
    }

    /// Distinct values across all patterns, by pattern priority then position
    pub fn find_all(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.patterns
            .iter()
            .flat_map(|pattern| pattern.find_all(text))
            .filter(|value| seen.insert(value.clone()))
            .collect()
    }
}

/// The full extraction table in `Field::ALL` order
#[derive(Debug, Clone)]
pub struct FieldTable {
    specs: Vec<FieldSpec>,
}

impl FieldTable {
    /// Shared built-in table
    pub fn builtin() -> &'static FieldTable {
        BUILTIN.get_or_init(|| {
            Self::from_labels(BUILTIN_LABELS.iter().map(|(field, labels)| (*field, labels.to_vec())))
                .expect("built-in labels compile")
        })
    }

    /// Build a table from per-field label lists. Fields not listed fall back
    /// to the built-in labels.
    pub fn from_labels<I, L, S>(labels: I) -> Result<Self, ExtractError>
    where
        I: IntoIterator<Item = (Field, L)>,
        L: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut by_field: BTreeMap<Field, Vec<String>> = labels
            .into_iter()
            .map(|(field, labels)| (field, labels.into_iter().map(Into::into).collect()))
            .collect();

        let specs = Field::ALL
            .into_iter()
            .map(|field| match by_field.remove(&field) {
                Some(labels) => FieldSpec::new(field, labels),
                None => FieldSpec::new(field, builtin_labels(field).iter().copied()),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { specs })
    }

    /// Built-in table with some fields' labels replaced, keyed by field name
    pub fn with_overrides(overrides: &HashMap<String, Vec<String>>) -> Result<Self, ExtractError> {
        let mut parsed = Vec::with_capacity(overrides.len());
        for (name, labels) in overrides {
            let field: Field = name.parse()?;
            parsed.push((field, labels.clone()));
        }
        Self::from_labels(parsed)
    }

    pub fn spec(&self, field: Field) -> &FieldSpec {
        // Invariant: specs holds exactly one entry per field in Field::ALL order
        &self.specs[field_index(field)]
    }

    pub fn specs(&self) -> &[FieldSpec] {
        &self.specs
    }

    /// Extract one record; absent fields are a normal result
    pub fn extract(&self, text: &str) -> Record {
        self.specs.iter().fold(Record::new(), |record, spec| {
            match spec.find(text) {
                Some(value) => record.with_value(spec.field, value),
                None => record,
            }
        })
    }

    /// Every distinct value of `field` in the text
    pub fn collect_all(&self, text: &str, field: Field) -> Vec<String> {
        self.spec(field).find_all(text)
    }
}

fn field_index(field: Field) -> usize {
    match field {
        Field::College => 0,
        Field::Course => 1,
        Field::Name => 2,
        Field::Group => 3,
        Field::Id => 4,
    }
}

fn builtin_labels(field: Field) -> &'static [&'static str] {
    BUILTIN_LABELS[field_index(field)].1
}

/// Extract with the built-in table
pub fn extract(text: &str) -> Record {
    FieldTable::builtin().extract(text)
}

/// Collect all distinct values of `field` with the built-in table
pub fn collect_all(text: &str, field: Field) -> Vec<String> {
    FieldTable::builtin().collect_all(text, field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_is_line_anchored() {
        let pattern = LabelPattern::new("Name").unwrap();

        assert_eq!(pattern.find("Name: Ann"), Some("Ann".to_string()));
        assert_eq!(pattern.find("  name :  Ann  "), Some("Ann".to_string()));
        assert_eq!(pattern.find("My Name: Ann"), None);
        assert_eq!(pattern.find("Surname: Ann\nName: Bob"), Some("Bob".to_string()));
    }

    #[test]
    fn test_label_requires_separator() {
        let short = LabelPattern::new("ФИ").unwrap();

        assert_eq!(short.find("ФИО: Иванов"), None);
        assert_eq!(short.find("ФИ: Иванов"), Some("Иванов".to_string()));
        assert_eq!(short.find("ФИ Иванов"), Some("Иванов".to_string()));
    }

    #[test]
    fn test_separator_runs() {
        let group = LabelPattern::new("Group").unwrap();
        let course = LabelPattern::new("Course").unwrap();
        let name = LabelPattern::new("ФИО").unwrap();

        assert_eq!(group.find("Group:: G1"), Some("G1".to_string()));
        assert_eq!(course.find("Course:- 3"), Some("3".to_string()));
        assert_eq!(course.find("Course = = 3"), Some("3".to_string()));
        assert_eq!(name.find("ФИО:\tIvanov"), Some("Ivanov".to_string()));
    }

    #[test]
    fn test_symbol_label_needs_no_separator() {
        let number = LabelPattern::new("№").unwrap();

        assert_eq!(number.find("№5"), Some("5".to_string()));
        assert_eq!(number.find("№ 5"), Some("5".to_string()));
        assert_eq!(number.find("№: 5"), Some("5".to_string()));
    }

    #[test]
    fn test_word_label_followed_by_digits() {
        let id = LabelPattern::new("ID").unwrap();

        assert_eq!(id.find("ID42"), Some("42".to_string()));
        assert_eq!(id.find("Identity: x"), None);
    }

    #[test]
    fn test_builtin_labels_compile() {
        let table = FieldTable::from_labels(
            BUILTIN_LABELS
                .iter()
                .map(|(field, labels)| (*field, labels.to_vec())),
        )
        .unwrap();

        assert_eq!(table.specs().len(), BUILTIN_LABELS.len());
        for (spec, (field, labels)) in table.specs().iter().zip(BUILTIN_LABELS.iter()) {
            assert_eq!(spec.field, *field);
            assert_eq!(spec.labels(), labels.to_vec());
        }
    }

    #[test]
    fn test_value_does_not_cross_lines() {
        let pattern = LabelPattern::new("Group").unwrap();

        assert_eq!(pattern.find("Group:\nG1"), None);
        assert_eq!(pattern.find("Group :\nG1"), None);
        assert_eq!(pattern.find("Group: G1\r\nID: 5"), Some("G1".to_string()));
    }

    #[test]
    fn test_cyrillic_case_insensitive() {
        let pattern = LabelPattern::new("Группа").unwrap();
        assert_eq!(pattern.find("ГРУППА - ИС-21"), Some("ИС-21".to_string()));
    }

    #[test]
    fn test_pattern_priority_beats_text_position() {
        let spec = FieldSpec::new(Field::Group, ["Команда", "Группа"]).unwrap();
        let text = "Группа: ИС-21\nКоманда: Alpha";

        assert_eq!(spec.find(text), Some("Alpha".to_string()));
    }

    #[test]
    fn test_label_with_regex_metacharacters() {
        let pattern = LabelPattern::new("No.").unwrap();
        assert_eq!(pattern.find("No.: 7"), Some("7".to_string()));
        assert_eq!(pattern.find("Nox: 7"), None);
    }

    #[test]
    fn test_empty_label_list_rejected() {
        let err = FieldSpec::new(Field::Id, Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, ExtractError::EmptyField(Field::Id)));
    }

    #[test]
    fn test_overrides_replace_only_named_fields() {
        let overrides = HashMap::from([("name".to_string(), vec!["Student".to_string()])]);
        let table = FieldTable::with_overrides(&overrides).unwrap();

        assert_eq!(table.spec(Field::Name).labels(), vec!["Student"]);
        assert_eq!(table.spec(Field::Course).labels(), vec!["Курс", "Course"]);

        let record = table.extract("Student: Ann\nName: Bob\nCourse: 3");
        assert_eq!(record.name.as_deref(), Some("Ann"));
        assert_eq!(record.course.as_deref(), Some("3"));
    }

    #[test]
    fn test_overrides_reject_unknown_field() {
        let overrides = HashMap::from([("surname".to_string(), vec!["X".to_string()])]);
        assert!(FieldTable::with_overrides(&overrides).is_err());
    }
}
