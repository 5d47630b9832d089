//! Error types shared by the roster core and the IPC layer.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("cannot open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("failed to load image: {0}")]
    Image(#[from] image::ImageError),

    #[error("empty image data")]
    EmptyImage,

    #[error(
        "file must contain columns: {}; found columns: {}",
        missing.join(", "),
        found.join(", ")
    )]
    MissingColumns {
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("{0}")]
    UnsupportedFormat(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl RosterError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RosterError::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable error code reported to the GUI.
    pub fn code(&self) -> &'static str {
        match self {
            RosterError::Io { .. } => "io_error",
            RosterError::Database(_) => "db_error",
            RosterError::Image(_) | RosterError::EmptyImage => "image_error",
            RosterError::MissingColumns { .. } => "missing_columns",
            RosterError::UnsupportedFormat(_) => "unsupported_format",
            RosterError::InvalidInput(_) => "bad_params",
            RosterError::Config(_) => "config_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, RosterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_lists_both_sides() {
        let err = RosterError::MissingColumns {
            missing: vec!["StudentID".into()],
            found: vec!["Name".into(), "Class".into()],
        };
        assert_eq!(
            err.to_string(),
            "file must contain columns: StudentID; found columns: Name, Class"
        );
        assert_eq!(err.code(), "missing_columns");
    }

    #[test]
    fn io_error_keeps_path() {
        let err = RosterError::io(
            "/nowhere/roster.csv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        );
        assert!(err.to_string().contains("/nowhere/roster.csv"));
        assert_eq!(err.code(), "io_error");
    }

    #[test]
    fn constraint_failure_maps_to_db_code() {
        let err = RosterError::from(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(err.code(), "db_error");
    }
}
