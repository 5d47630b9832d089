//! Import format negotiation. Only comma-separated text is readable; the
//! spreadsheet format is advertised so the file picker can offer it, and
//! every read attempt answers with conversion guidance.

use std::path::Path;

use tracing::warn;

use crate::delimited::DelimitedTable;
use crate::error::{Result, RosterError};

pub const XLSX_GUIDANCE: &str = "XLSX format is not yet fully supported.\n\
Please convert your file to CSV format.\n\n\
How to convert:\n\
1. Open your XLSX file in Excel/LibreOffice\n\
2. File > Save As\n\
3. Choose 'CSV (Comma delimited)' format\n\
4. Save and import the CSV file instead";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Csv,
    Xlsx,
    Unsupported,
}

impl ImportFormat {
    pub const ADVERTISED: [ImportFormat; 2] = [ImportFormat::Csv, ImportFormat::Xlsx];

    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => ImportFormat::Csv,
            Some("xlsx") => ImportFormat::Xlsx,
            _ => ImportFormat::Unsupported,
        }
    }

    pub fn is_readable(self) -> bool {
        matches!(self, ImportFormat::Csv)
    }

    pub fn extension(self) -> Option<&'static str> {
        match self {
            ImportFormat::Csv => Some("csv"),
            ImportFormat::Xlsx => Some("xlsx"),
            ImportFormat::Unsupported => None,
        }
    }
}

pub fn read_spreadsheet(path: &Path) -> Result<DelimitedTable> {
    warn!(path = %path.display(), "xlsx import attempted; asking for CSV instead");
    Err(RosterError::UnsupportedFormat(XLSX_GUIDANCE.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_by_extension_case_insensitively() {
        assert_eq!(ImportFormat::from_path(Path::new("a/b/Roster.CSV")), ImportFormat::Csv);
        assert_eq!(ImportFormat::from_path(Path::new("roster.xlsx")), ImportFormat::Xlsx);
        assert_eq!(ImportFormat::from_path(Path::new("roster.txt")), ImportFormat::Unsupported);
        assert_eq!(ImportFormat::from_path(Path::new("roster")), ImportFormat::Unsupported);
    }

    #[test]
    fn only_csv_is_readable() {
        assert!(ImportFormat::Csv.is_readable());
        assert!(!ImportFormat::Xlsx.is_readable());
        assert!(!ImportFormat::Unsupported.is_readable());
    }

    #[test]
    fn spreadsheet_read_always_fails_with_guidance() {
        let err = read_spreadsheet(Path::new("whatever.xlsx")).unwrap_err();
        assert_eq!(err.code(), "unsupported_format");
        assert!(err.to_string().contains("convert your file to CSV"));
    }
}
