use std::path::PathBuf;

use serde::Deserialize;

use crate::config::RosterConfig;
use crate::store::RosterStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: RosterConfig,
    /// Database file backing `store`.
    pub db_path: Option<PathBuf>,
    pub store: Option<RosterStore>,
}

impl AppState {
    pub fn new(config: RosterConfig) -> Self {
        Self {
            config,
            db_path: None,
            store: None,
        }
    }
}

impl AppState {
    /// Opens (creating if needed) the database at `db_path` and makes it the
    /// active store, dropping any previous connection first.
    pub fn open_store(&mut self, db_path: PathBuf) -> crate::error::Result<()> {
        self.store = None;
        self.db_path = None;
        let store = RosterStore::open(&db_path)?;
        self.store = Some(store);
        self.db_path = Some(db_path);
        Ok(())
    }

    pub fn close_store(&mut self) {
        self.store = None;
    }
}
