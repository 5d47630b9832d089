//! File import: format negotiation, column check, row mapping, then one
//! transactional batch insert.

use std::path::Path;

use tracing::info;

use crate::delimited::{DelimitedReader, DelimitedTable, SkippedLine};
use crate::error::{Result, RosterError};
use crate::spreadsheet::{self, ImportFormat};
use crate::store::{NewStudent, RosterStore};

pub const NAME_COLUMN: &str = "Name";
pub const STUDENT_ID_COLUMN: &str = "StudentID";
pub const CLASS_COLUMN: &str = "Class";
pub const REQUIRED_COLUMNS: [&str; 3] = [NAME_COLUMN, STUDENT_ID_COLUMN, CLASS_COLUMN];

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub imported: usize,
    pub classes_created: Vec<String>,
    pub skipped: Vec<SkippedLine>,
}

/// Maps parsed rows to students. Fails before looking at any row if a
/// required column is missing.
pub fn students_from_table(table: &DelimitedTable) -> Result<Vec<NewStudent>> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !table.has_column(c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(RosterError::MissingColumns {
            missing,
            found: table.headers.clone(),
        });
    }

    Ok(table
        .rows
        .iter()
        .map(|row| NewStudent {
            name: row.get(NAME_COLUMN).unwrap_or_default().to_string(),
            student_id: row.get(STUDENT_ID_COLUMN).unwrap_or_default().to_string(),
            class_name: row.get(CLASS_COLUMN).unwrap_or_default().to_string(),
            photo: None,
        })
        .collect())
}

pub fn read_table(path: &Path) -> Result<DelimitedTable> {
    match ImportFormat::from_path(path) {
        ImportFormat::Csv => DelimitedReader::new().read_file(path),
        ImportFormat::Xlsx => spreadsheet::read_spreadsheet(path),
        ImportFormat::Unsupported => Err(RosterError::UnsupportedFormat(
            "Please select a CSV or XLSX file.".to_string(),
        )),
    }
}

pub fn import_file(store: &mut RosterStore, path: &Path) -> Result<ImportSummary> {
    let table = read_table(path)?;
    let students = students_from_table(&table)?;
    let outcome = store.import_students(&students)?;
    info!(
        path = %path.display(),
        imported = outcome.imported,
        skipped = table.skipped.len(),
        "roster file imported"
    );
    Ok(ImportSummary {
        imported: outcome.imported,
        classes_created: outcome.classes_created,
        skipped: table.skipped,
    })
}
