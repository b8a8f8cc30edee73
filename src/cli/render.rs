//! Human-readable output for records, registry entries and stats.

use std::io::{self, Write};

use crate::core::RegistryStats;
use crate::domain::{Field, Record, StoredStudent, Student};

const RULE_WIDTH: usize = 50;

pub fn rule(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))
}

/// Fields found in a file; absent ones are listed separately
pub fn record(out: &mut impl Write, record: &Record) -> io::Result<()> {
    writeln!(out, "Fields found in file:")?;
    rule(out)?;
    for (field, value) in record.present() {
        writeln!(out, "{:<10} {}", format!("{}:", field.display_label()), value)?;
    }

    let missing = record.missing();
    if !missing.is_empty() {
        let names: Vec<_> = missing.iter().map(Field::as_str).collect();
        writeln!(out, "Not found: {}", names.join(", "))?;
    }
    Ok(())
}

pub fn student(out: &mut impl Write, student: &Student) -> io::Result<()> {
    for field in Field::ALL {
        writeln!(out, "{:<10} {}", format!("{}:", field.display_label()), student.get(field))?;
    }
    Ok(())
}

pub fn stored_student(out: &mut impl Write, stored: &StoredStudent) -> io::Result<()> {
    student(out, &stored.student)?;
    writeln!(out, "{:<10} {}", "Registered:", stored.registration_date_string())?;
    writeln!(out, "{:<10} {}", "Status:", stored.status)
}

pub fn stats(out: &mut impl Write, stats: &RegistryStats) -> io::Result<()> {
    writeln!(out, "Registry statistics:")?;
    writeln!(out, "Total students: {}", stats.count)?;

    if !stats.recent.is_empty() {
        writeln!(out, "Recently added:")?;
        for (i, stored) in stats.recent.iter().enumerate() {
            writeln!(
                out,
                "{}. {} ({}) - {}",
                i + 1,
                stored.student.name,
                stored.student.group,
                stored.registration_date_string()
            )?;
        }
    }
    Ok(())
}
