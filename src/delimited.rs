//! Comma-separated text reader.
//!
//! Quoting is a plain toggle: a `"` flips between inside/outside state and
//! is dropped from the value. There is no `""` escape, so a field cannot
//! carry a literal quote character.

use std::path::Path;

use tracing::{info, warn};

use crate::error::{Result, RosterError};

pub const DEFAULT_DELIMITER: char = ',';
const QUOTE: char = '"';
const BOM: char = '\u{feff}';

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRow {
    fields: Vec<(String, String)>,
}

impl ParsedRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A data line dropped because its field count did not match the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    pub line: usize,
    pub found: usize,
    pub expected: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DelimitedTable {
    pub headers: Vec<String>,
    pub rows: Vec<ParsedRow>,
    pub skipped: Vec<SkippedLine>,
}

impl DelimitedTable {
    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }
}

#[derive(Debug, Clone)]
pub struct DelimitedReader {
    delimiter: char,
    has_header: bool,
}

impl Default for DelimitedReader {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            has_header: true,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    Outside,
    Inside,
}

impl DelimitedReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Treat the first line as data and name columns `Column_1`, `Column_2`, ...
    pub fn without_header(mut self) -> Self {
        self.has_header = false;
        self
    }

    pub fn read_file(&self, path: &Path) -> Result<DelimitedTable> {
        let bytes = std::fs::read(path).map_err(|e| RosterError::io(path, e))?;
        let text = String::from_utf8_lossy(&bytes);
        let table = self.parse_str(&text);
        info!(
            path = %path.display(),
            rows = table.rows.len(),
            skipped = table.skipped.len(),
            "read delimited file"
        );
        Ok(table)
    }

    pub fn parse_str(&self, text: &str) -> DelimitedTable {
        // Spreadsheet "CSV UTF-8" exports lead with a byte-order mark.
        let text = text.strip_prefix(BOM).unwrap_or(text);
        let mut table = DelimitedTable::default();
        let mut seen_first = false;

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let fields = self.split_line(line);

            if !seen_first {
                seen_first = true;
                if self.has_header {
                    table.headers = fields;
                    continue;
                }
                table.headers = (1..=fields.len()).map(|i| format!("Column_{i}")).collect();
            }

            if fields.len() != table.headers.len() {
                warn!(
                    line = idx + 1,
                    found = fields.len(),
                    expected = table.headers.len(),
                    "skipping line with wrong field count"
                );
                table.skipped.push(SkippedLine {
                    line: idx + 1,
                    found: fields.len(),
                    expected: table.headers.len(),
                });
                continue;
            }

            table.rows.push(ParsedRow {
                fields: table.headers.iter().cloned().zip(fields).collect(),
            });
        }

        table
    }

    fn split_line(&self, line: &str) -> Vec<String> {
        let mut fields = Vec::new();
        let mut current = String::new();
        let mut state = QuoteState::Outside;

        for c in line.chars() {
            match (state, c) {
                (QuoteState::Outside, QUOTE) => state = QuoteState::Inside,
                (QuoteState::Inside, QUOTE) => state = QuoteState::Outside,
                (QuoteState::Outside, d) if d == self.delimiter => {
                    fields.push(current.trim().to_string());
                    current.clear();
                }
                (_, other) => current.push(other),
            }
        }
        fields.push(current.trim().to_string());
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_rows() {
        let table = DelimitedReader::new().parse_str("Name,StudentID,Class\nAlice,S1,10A\nBob,S2,10A\n");
        assert_eq!(table.headers, vec!["Name", "StudentID", "Class"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].get("Name"), Some("Bob"));
        assert_eq!(table.rows[1].get("Class"), Some("10A"));
        assert!(table.skipped.is_empty());
    }

    #[test]
    fn quoted_delimiter_stays_in_field() {
        let table = DelimitedReader::new().parse_str("Name,StudentID,Class\n\"Doe, Jane\",S100,10A");
        assert_eq!(table.rows.len(), 1);
        let row = &table.rows[0];
        assert_eq!(row.get("Name"), Some("Doe, Jane"));
        assert_eq!(row.get("StudentID"), Some("S100"));
        assert_eq!(row.get("Class"), Some("10A"));
    }

    #[test]
    fn quote_chars_are_dropped_not_escaped() {
        let table = DelimitedReader::new().parse_str("A\n\"say \"\"hi\"\"\"");
        assert_eq!(table.rows[0].get("A"), Some("say hi"));
    }

    #[test]
    fn mismatched_rows_are_skipped_without_touching_neighbours() {
        let text = "Name,StudentID,Class\n\nAlice,S1,10A\nBroken,S2\nCarol,S3,10B,extra\nDan,S4,10B\n";
        let table = DelimitedReader::new().parse_str(text);
        let names: Vec<_> = table.rows.iter().map(|r| r.get("Name").unwrap()).collect();
        assert_eq!(names, vec!["Alice", "Dan"]);
        assert_eq!(
            table.skipped,
            vec![
                SkippedLine { line: 4, found: 2, expected: 3 },
                SkippedLine { line: 5, found: 4, expected: 3 },
            ]
        );
    }

    #[test]
    fn blank_leading_lines_do_not_become_header() {
        let table = DelimitedReader::new().parse_str("\n   \r\n  Name , Class \r\n Ann , 9C \r\n");
        assert_eq!(table.headers, vec!["Name", "Class"]);
        assert_eq!(table.rows[0].get("Name"), Some("Ann"));
        assert_eq!(table.rows[0].get("Class"), Some("9C"));
    }

    #[test]
    fn headerless_mode_synthesizes_names() {
        let table = DelimitedReader::new()
            .without_header()
            .parse_str("Alice,S1,10A\nBob,S2,10A\n");
        assert_eq!(table.headers, vec!["Column_1", "Column_2", "Column_3"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].get("Column_2"), Some("S1"));
    }

    #[test]
    fn custom_delimiter() {
        let table = DelimitedReader::new()
            .with_delimiter(';')
            .parse_str("Name;Class\n\"Roe; Ann\";7B\nLee,Kim;7B\n");
        assert_eq!(table.rows[0].get("Name"), Some("Roe; Ann"));
        assert_eq!(table.rows[1].get("Name"), Some("Lee,Kim"));
    }

    #[test]
    fn row_iterates_in_header_order() {
        let table = DelimitedReader::new().parse_str("b,a\n2,1\n");
        let pairs: Vec<_> = table.rows[0].iter().collect();
        assert_eq!(pairs, vec![("b", "2"), ("a", "1")]);
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let err = DelimitedReader::new()
            .read_file(Path::new("/definitely/not/here.csv"))
            .unwrap_err();
        assert!(matches!(err, RosterError::Io { .. }));
    }

    #[test]
    fn leading_byte_order_mark_is_not_part_of_header() {
        let table = DelimitedReader::new().parse_str("\u{feff}Name,StudentID,Class\r\nAlice,S1,10A\r\n");
        assert_eq!(table.headers, vec!["Name", "StudentID", "Class"]);
        assert_eq!(table.rows[0].get("Name"), Some("Alice"));
    }

    #[test]
    fn empty_input_gives_empty_table() {
        let table = DelimitedReader::new().parse_str("\n\n");
        assert!(table.headers.is_empty());
        assert!(table.rows.is_empty());
    }
}
