//! Roster core for the student picker: SQLite-backed classes and students,
//! CSV import, photo size-fitting, and the JSON-line IPC surface the desktop
//! GUI drives.

pub mod backup;
pub mod config;
pub mod db;
pub mod delimited;
pub mod error;
pub mod import;
pub mod ipc;
pub mod logging;
pub mod photo;
pub mod spreadsheet;
pub mod store;

pub use error::{Result, RosterError};
