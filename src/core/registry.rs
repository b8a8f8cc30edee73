//! Student registry with whole-file JSON persistence.
//!
//! The registry is a flat, ordered list of `StoredStudent` entries keyed by
//! (name, group, id). It is loaded once per session, mutated only through
//! `insert_if_absent`, and rewritten in full after every successful insert.
//!
//! Writes go to a temporary file in the same directory which is then renamed
//! over the registry, so a failed save leaves the previous file intact.
//!
//! There is no locking. Two stores opened on the same file each keep their
//! own in-memory copy and the last save wins.

use std::collections::HashSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{StoredStudent, Student, StudentKey, DEFAULT_STATUS};

/// Number of recent entries reported by default
pub const DEFAULT_RECENT: usize = 3;

#[derive(Debug, Error)]
pub enum InsertError {
    #[error("student already registered: {key}")]
    AlreadyExists { key: StudentKey },

    #[error("failed to persist registry to {}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Ordered collection of registered students
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    students: Vec<StoredStudent>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_students(students: Vec<StoredStudent>) -> Self {
        Self { students }
    }

    pub fn students(&self) -> &[StoredStudent] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Exact, case-sensitive match on all three key components
    pub fn find_by_key(&self, name: &str, group: &str, id: &str) -> Option<&StoredStudent> {
        self.students.iter().find(|s| s.has_key(name, group, id))
    }

    pub fn contains_key(&self, key: &StudentKey) -> bool {
        self.find_by_key(&key.name, &key.group, &key.id).is_some()
    }

    /// Drop entries whose key already appeared earlier; returns how many
    pub fn dedup_keys(&mut self) -> usize {
        let before = self.students.len();
        let mut seen = HashSet::new();
        self.students.retain(|s| seen.insert(s.key()));
        before - self.students.len()
    }

    /// Total count plus the last `recent` entries in insertion order
    pub fn stats(&self, recent: usize) -> RegistryStats {
        let start = self.students.len().saturating_sub(recent);
        RegistryStats {
            count: self.students.len(),
            recent: self.students[start..].to_vec(),
        }
    }
}

/// Summary used for reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryStats {
    pub count: usize,
    pub recent: Vec<StoredStudent>,
}

/// Durable registry bound to one file
#[derive(Debug)]
pub struct RegistryStore {
    path: PathBuf,
    registry: Registry,
    default_status: String,
}

impl RegistryStore {
    /// Open the registry at `path`, loading whatever is there
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let registry = Self::load(&path);
        Self {
            path,
            registry,
            default_status: DEFAULT_STATUS.to_string(),
        }
    }

    /// Status stamped on newly inserted entries
    pub fn with_default_status(mut self, status: impl Into<String>) -> Self {
        self.default_status = status.into();
        self
    }

    /// Read the registry file.
    ///
    /// A missing file yields an empty registry. So does a file that cannot be
    /// read or parsed: the condition is logged and the content is ignored.
    /// Entries repeating an earlier key are dropped; the first one wins.
    pub fn load(path: &Path) -> Registry {
        if !path.exists() {
            debug!(path = %path.display(), "No registry file, starting empty");
            return Registry::new();
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Registry unreadable, treating as empty");
                return Registry::new();
            }
        };

        match serde_json::from_str::<Registry>(&content) {
            Ok(mut registry) => {
                let dropped = registry.dedup_keys();
                if dropped > 0 {
                    warn!(path = %path.display(), dropped, "Registry has duplicate keys, keeping first");
                }
                debug!(path = %path.display(), count = registry.len(), "Loaded registry");
                registry
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Registry malformed, treating as empty");
                Registry::new()
            }
        }
    }

    /// Re-read the file, replacing the in-memory copy
    pub fn reload(&mut self) {
        self.registry = Self::load(&self.path);
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn find_by_key(&self, name: &str, group: &str, id: &str) -> Option<&StoredStudent> {
        self.registry.find_by_key(name, group, id)
    }

    pub fn stats(&self, recent: usize) -> RegistryStats {
        self.registry.stats(recent)
    }

    /// Register `student` unless its key is already present.
    ///
    /// On a persist failure the new entry is dropped again, so the in-memory
    /// registry keeps matching the file.
    pub fn insert_if_absent(&mut self, student: Student) -> Result<StoredStudent, InsertError> {
        let key = StudentKey::from(&student);
        if self.registry.contains_key(&key) {
            debug!(%key, "Insert skipped, key present");
            return Err(InsertError::AlreadyExists { key });
        }

        let stored = StoredStudent::register(student, self.default_status.clone());
        self.registry.students.push(stored.clone());

        if let Err(source) = self.save() {
            self.registry.students.pop();
            warn!(path = %self.path.display(), error = %source, "Registry save failed");
            return Err(InsertError::Persist {
                path: self.path.clone(),
                source,
            });
        }

        info!(%key, count = self.registry.len(), "Student registered");
        Ok(stored)
    }

    /// Write the current registry to disk
    pub fn save(&self) -> io::Result<()> {
        write_registry(&self.path, &self.registry)
    }
}

/// Atomically replace `path` with the serialized registry
pub fn write_registry(path: &Path, registry: &Registry) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let content = serde_json::to_string_pretty(registry)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(content.as_bytes())?;
    file.write_all(b"\n")?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn student(name: &str, group: &str, id: &str) -> Student {
        Student::new("College of Communications", "2", name, group, id)
    }

    fn create_test_store() -> (RegistryStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = RegistryStore::open(temp_dir.path().join("students_database.json"));
        (store, temp_dir)
    }

    #[test]
    fn test_insert_then_find() {
        let (mut store, _temp) = create_test_store();

        let stored = store.insert_if_absent(student("Ivanov I.I.", "G1", "42")).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(stored.status, DEFAULT_STATUS);
        assert_eq!(store.find_by_key("Ivanov I.I.", "G1", "42"), Some(&stored));
        assert!(store.path().exists());
    }

    #[test]
    fn test_duplicate_key_rejected_without_write() {
        let (mut store, _temp) = create_test_store();
        store.insert_if_absent(student("Ivanov I.I.", "G1", "42")).unwrap();
        let before = std::fs::read_to_string(store.path()).unwrap();

        // Same key, different college: still a duplicate
        let mut again = student("Ivanov I.I.", "G1", "42");
        again.college = "Another".to_string();
        let err = store.insert_if_absent(again).unwrap_err();

        assert!(matches!(err, InsertError::AlreadyExists { .. }));
        assert_eq!(store.len(), 1);
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn test_key_components_are_independent() {
        let (mut store, _temp) = create_test_store();
        store.insert_if_absent(student("Ivanov I.I.", "G1", "42")).unwrap();
        store.insert_if_absent(student("Ivanov I.I.", "G2", "42")).unwrap();
        store.insert_if_absent(student("Ivanov I.I.", "G1", "43")).unwrap();
        store.insert_if_absent(student("ivanov i.i.", "G1", "42")).unwrap();

        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_stats_recent_window() {
        let (mut store, _temp) = create_test_store();
        for i in 0..5 {
            store
                .insert_if_absent(student(&format!("Student {}", i), "G1", &i.to_string()))
                .unwrap();
        }

        let stats = store.stats(DEFAULT_RECENT);
        assert_eq!(stats.count, 5);
        let names: Vec<_> = stats.recent.iter().map(|s| s.student.name.as_str()).collect();
        assert_eq!(names, vec!["Student 2", "Student 3", "Student 4"]);

        let stats = store.stats(10);
        assert_eq!(stats.recent.len(), 5);
    }

    #[test]
    fn test_custom_default_status() {
        let (store, _temp) = create_test_store();
        let mut store = store.with_default_status("transfer");

        let stored = store.insert_if_absent(student("A", "B", "C")).unwrap();
        assert_eq!(stored.status, "transfer");
    }

    #[test]
    fn test_persist_failure_rolls_back() {
        let temp_dir = TempDir::new().unwrap();
        // A regular file where the parent directory should be
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let mut store = RegistryStore::open(blocker.join("students_database.json"));
        let err = store.insert_if_absent(student("A", "B", "C")).unwrap_err();

        assert!(matches!(err, InsertError::Persist { .. }));
        assert!(store.is_empty());
        assert!(store.find_by_key("A", "B", "C").is_none());
    }

    #[test]
    fn test_dedup_keys_keeps_first() {
        let first = StoredStudent::register(student("A", "B", "C"), "first");
        let other = StoredStudent::register(student("D", "E", "F"), "other");
        let repeat = StoredStudent::register(student("A", "B", "C"), "repeat");
        let mut registry = Registry::from_students(vec![first.clone(), other.clone(), repeat]);

        assert_eq!(registry.dedup_keys(), 1);
        assert_eq!(registry.students(), &[first, other]);
        assert_eq!(registry.dedup_keys(), 0);
    }

    #[test]
    fn test_reload_sees_file_changes() {
        let (mut store, temp) = create_test_store();
        store.insert_if_absent(student("A", "B", "C")).unwrap();

        let mut other = RegistryStore::open(temp.path().join("students_database.json"));
        other.insert_if_absent(student("D", "E", "F")).unwrap();

        assert_eq!(store.len(), 1);
        store.reload();
        assert_eq!(store.len(), 2);
    }
}
