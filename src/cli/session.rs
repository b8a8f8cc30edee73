//! Interactive session: analyze student files and gate registration.
//!
//! One session owns the registry store for its whole lifetime. Every file
//! goes through the same steps:
//!
//! 1. resolve the path (typed or default) and check that it exists
//! 2. decode and extract a `Record`
//! 3. ask the operator for any missing fields
//! 4. look the key up; greet a known student or offer registration

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::prompt::Prompter;
use crate::cli::render;
use crate::core::{InsertError, RegistryStore};
use crate::domain::{Field, Record, StoredStudent, Student};
use crate::ingest::{decode, DecodeError, FieldTable};

/// What happened to one analyzed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Path does not exist or could not be opened
    FileMissing(PathBuf),
    /// No candidate encoding accepted the file
    Undecodable(PathBuf),
    /// Fields were missing and the operator declined to fill them
    Incomplete(Vec<Field>),
    /// The key is already registered
    Known(StoredStudent),
    /// A new registry entry was written
    Registered(StoredStudent),
    /// The operator declined registration
    Declined(Student),
    /// The registry already held the key at insert time
    Duplicate(Student),
    /// The registry could not be saved
    PersistFailed(Student),
}

pub struct Session<'a, P: Prompter, W: Write> {
    store: &'a mut RegistryStore,
    table: FieldTable,
    prompter: P,
    out: W,
    default_input: PathBuf,
    recent: usize,
}

impl<'a, P: Prompter, W: Write> Session<'a, P, W> {
    pub fn new(store: &'a mut RegistryStore, table: FieldTable, prompter: P, out: W) -> Self {
        Self {
            store,
            table,
            prompter,
            out,
            default_input: PathBuf::from(crate::config::DEFAULT_INPUT),
            recent: crate::core::registry::DEFAULT_RECENT,
        }
    }

    pub fn with_default_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_input = path.into();
        self
    }

    pub fn with_recent(mut self, recent: usize) -> Self {
        self.recent = recent;
        self
    }

    /// Main menu loop
    pub fn run(&mut self) -> Result<()> {
        writeln!(self.out, "Student file analyzer")?;
        render::rule(&mut self.out)?;
        self.show_stats()?;

        loop {
            writeln!(self.out)?;
            writeln!(self.out, "Choose an action:")?;
            writeln!(self.out, "1. Analyze a student file")?;
            writeln!(self.out, "2. Show registry statistics")?;
            writeln!(self.out, "3. Quit")?;

            match self.prompter.ask("Your choice (1-3)")?.as_str() {
                "1" => {
                    let Some(path) = self.choose_path()? else {
                        continue;
                    };
                    self.process_file(&path)?;

                    if !self.prompter.confirm("Analyze another file?")? {
                        writeln!(self.out, "Goodbye!")?;
                        break;
                    }
                }
                "2" => self.show_stats()?,
                "3" => {
                    writeln!(self.out, "Goodbye!")?;
                    break;
                }
                _ => writeln!(self.out, "Invalid choice, try again.")?,
            }
        }

        Ok(())
    }

    pub fn show_stats(&mut self) -> Result<()> {
        let stats = self.store.stats(self.recent);
        render::stats(&mut self.out, &stats)?;
        Ok(())
    }

    /// Typed path or the configured default; `None` on an invalid choice
    fn choose_path(&mut self) -> Result<Option<PathBuf>> {
        writeln!(self.out, "Choose the file source:")?;
        writeln!(self.out, "1. Enter a path")?;
        writeln!(
            self.out,
            "2. Use the default file ({})",
            self.default_input.display()
        )?;

        match self.prompter.ask("Your choice (1-2)")?.as_str() {
            "1" => Ok(Some(PathBuf::from(self.prompter.ask("Path to file")?))),
            "2" => Ok(Some(self.default_input.clone())),
            _ => {
                writeln!(self.out, "Invalid choice.")?;
                Ok(None)
            }
        }
    }

    /// Run one file through decode, extract, fill-in and registry check
    pub fn process_file(&mut self, path: &Path) -> Result<Outcome> {
        if !path.exists() {
            writeln!(self.out, "File '{}' does not exist.", path.display())?;
            return Ok(Outcome::FileMissing(path.to_path_buf()));
        }

        writeln!(self.out, "Reading file: {}", path.display())?;
        let decoded = match decode(path) {
            Ok(decoded) => decoded,
            Err(e @ DecodeError::NotFound { .. }) => {
                writeln!(self.out, "Error: {}", e)?;
                return Ok(Outcome::FileMissing(path.to_path_buf()));
            }
            Err(e @ DecodeError::NoApplicableEncoding { .. }) => {
                warn!(path = %path.display(), "No applicable encoding");
                writeln!(self.out, "Error: {}", e)?;
                return Ok(Outcome::Undecodable(path.to_path_buf()));
            }
        };
        writeln!(self.out, "Read with encoding: {}", decoded.encoding)?;

        let record = self.table.extract(&decoded.text);
        writeln!(self.out)?;
        render::record(&mut self.out, &record)?;
        writeln!(self.out)?;
        writeln!(self.out, "File content:")?;
        render::rule(&mut self.out)?;
        writeln!(self.out, "{}", decoded.text)?;
        render::rule(&mut self.out)?;

        let record = if record.is_complete() {
            record
        } else {
            writeln!(self.out, "Not all fields were found in the file.")?;
            if !self.prompter.confirm("Enter the missing fields manually?")? {
                writeln!(self.out, "Cancelled: not all fields are available.")?;
                return Ok(Outcome::Incomplete(record.missing()));
            }
            self.fill_missing(&record)?
        };

        let student = record.into_student()?;
        self.check_student(student)
    }

    /// Ask for every absent field, never touching present ones
    pub fn fill_missing(&mut self, record: &Record) -> Result<Record> {
        let mut typed = Record::new();
        for field in record.missing() {
            let value = self.ask_non_empty(&format!("Enter {}", field.display_label()))?;
            typed = typed.with_value(field, value);
        }
        Ok(record.fill_missing(&typed))
    }

    /// Ask again for every field; an empty answer keeps the current value
    fn correct_all(&mut self, student: &Student) -> Result<Student> {
        let mut record = Record::from(student.clone());
        for field in Field::ALL {
            let current = student.get(field);
            let answer = self
                .prompter
                .ask(&format!("{} [{}]", field.display_label(), current))?;
            if !answer.is_empty() {
                record = record.with_value(field, answer);
            }
        }
        Ok(record.into_student()?)
    }

    fn ask_non_empty(&mut self, question: &str) -> Result<String> {
        loop {
            let answer = self.prompter.ask(question)?;
            if !answer.is_empty() {
                return Ok(answer);
            }
            writeln!(self.out, "A value is required.")?;
        }
    }

    /// Greet a known student or walk through registration
    pub fn check_student(&mut self, student: Student) -> Result<Outcome> {
        if let Some(stored) = self
            .store
            .find_by_key(&student.name, &student.group, &student.id)
            .cloned()
        {
            info!(key = %stored.key(), "Known student");
            writeln!(self.out)?;
            writeln!(self.out, "Student found in the registry.")?;
            render::rule(&mut self.out)?;
            render::stored_student(&mut self.out, &stored)?;
            render::rule(&mut self.out)?;
            writeln!(self.out, "Welcome! Access granted.")?;
            return Ok(Outcome::Known(stored));
        }

        self.register(student)
    }

    fn register(&mut self, student: Student) -> Result<Outcome> {
        writeln!(self.out)?;
        writeln!(self.out, "Student not found in the registry. Access denied.")?;
        writeln!(self.out, "Registration is required.")?;
        writeln!(self.out)?;
        writeln!(self.out, "Check the registration data:")?;
        render::rule(&mut self.out)?;
        render::student(&mut self.out, &student)?;
        render::rule(&mut self.out)?;

        let student = if self.prompter.confirm("Is the data correct?")? {
            student
        } else {
            writeln!(self.out, "Correct the data (press Enter to keep a value):")?;
            self.correct_all(&student)?
        };

        if !self.prompter.confirm("Register this student?")? {
            writeln!(self.out, "Registration cancelled. Access denied.")?;
            return Ok(Outcome::Declined(student));
        }

        match self.store.insert_if_absent(student.clone()) {
            Ok(stored) => {
                writeln!(self.out)?;
                writeln!(self.out, "Registration successful!")?;
                render::rule(&mut self.out)?;
                render::stored_student(&mut self.out, &stored)?;
                render::rule(&mut self.out)?;
                Ok(Outcome::Registered(stored))
            }
            Err(e @ InsertError::AlreadyExists { .. }) => {
                writeln!(self.out, "{}", e)?;
                Ok(Outcome::Duplicate(student))
            }
            Err(e @ InsertError::Persist { .. }) => {
                writeln!(self.out, "Error: {}. The student was not added.", e)?;
                Ok(Outcome::PersistFailed(student))
            }
        }
    }
}
