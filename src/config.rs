//! TOML configuration for the sidecar.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RosterError};

pub const CONFIG_ENV: &str = "ROSTERD_CONFIG";
pub const DATA_DIR_ENV: &str = "ROSTERD_DATA_DIR";
pub const CONFIG_FILE_NAME: &str = "rosterd.toml";
const APP_DIR_NAME: &str = "rosterd";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub images: ImageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the database. Defaults to the platform app-data dir.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_database_name")]
    pub database_name: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            database_name: default_database_name(),
        }
    }
}

fn default_database_name() -> String {
    "students.db".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_max_size_kb")]
    pub max_size_kb: usize,
    /// Lower bound kept for the GUI; size-fitting does not enforce it.
    #[serde(default = "default_min_size_kb")]
    pub min_size_kb: usize,
    #[serde(default = "default_encode_quality")]
    pub encode_quality: u8,
    #[serde(default = "default_display_width")]
    pub display_width: u32,
    #[serde(default = "default_display_height")]
    pub display_height: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_size_kb: default_max_size_kb(),
            min_size_kb: default_min_size_kb(),
            encode_quality: default_encode_quality(),
            display_width: default_display_width(),
            display_height: default_display_height(),
        }
    }
}

fn default_max_size_kb() -> usize {
    300
}

fn default_min_size_kb() -> usize {
    100
}

fn default_encode_quality() -> u8 {
    crate::photo::DEFAULT_QUALITY
}

fn default_display_width() -> u32 {
    300
}

fn default_display_height() -> u32 {
    400
}

impl RosterConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: RosterConfig =
            toml::from_str(text).map_err(|e| RosterError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| RosterError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Resolves the config the way the sidecar does at startup:
    /// `ROSTERD_CONFIG`, then `<data dir>/rosterd.toml`, then defaults.
    /// `ROSTERD_DATA_DIR` always wins over `storage.data_dir`.
    pub fn from_env() -> Result<Self> {
        let mut cfg = match std::env::var_os(CONFIG_ENV) {
            Some(p) => Self::load(Path::new(&p))?,
            None => {
                let candidate = env_data_dir()
                    .unwrap_or_else(platform_data_dir)
                    .join(CONFIG_FILE_NAME);
                if candidate.is_file() {
                    Self::load(&candidate)?
                } else {
                    Self::default()
                }
            }
        };
        if let Some(dir) = env_data_dir() {
            cfg.storage.data_dir = Some(dir);
        }
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.storage.database_name.trim().is_empty() {
            return Err(RosterError::Config(
                "storage.database_name must not be empty".into(),
            ));
        }
        if self.images.encode_quality > 100 {
            return Err(RosterError::Config(format!(
                "images.encode_quality must be 0-100, got {}",
                self.images.encode_quality
            )));
        }
        Ok(())
    }

    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(platform_data_dir)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.database_name)
    }
}

fn env_data_dir() -> Option<PathBuf> {
    std::env::var_os(DATA_DIR_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Writable per-user application data location.
pub fn platform_data_dir() -> PathBuf {
    let base = if cfg!(target_os = "windows") {
        std::env::var_os("APPDATA").map(PathBuf::from)
    } else if cfg!(target_os = "macos") {
        std::env::var_os("HOME")
            .map(|h| PathBuf::from(h).join("Library").join("Application Support"))
    } else {
        std::env::var_os("XDG_DATA_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local").join("share"))
            })
    };
    base.unwrap_or_else(std::env::temp_dir).join(APP_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = RosterConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.storage.database_name, "students.db");
        assert_eq!(cfg.images.max_size_kb, 300);
        assert_eq!(cfg.images.min_size_kb, 100);
        assert_eq!(cfg.images.encode_quality, 85);
        assert_eq!(cfg.images.display_width, 300);
        assert_eq!(cfg.images.display_height, 400);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let cfg = RosterConfig::from_toml_str(
            r#"
            [storage]
            data_dir = "/srv/roster"

            [images]
            max_size_kb = 120
            "#,
        )
        .unwrap();
        assert_eq!(cfg.database_path(), PathBuf::from("/srv/roster/students.db"));
        assert_eq!(cfg.images.max_size_kb, 120);
        assert_eq!(cfg.images.encode_quality, 85);
    }

    #[test]
    fn rejects_out_of_range_quality() {
        let err = RosterConfig::from_toml_str("[images]\nencode_quality = 140\n").unwrap_err();
        assert!(matches!(err, RosterError::Config(_)));
    }

    #[test]
    fn rejects_blank_database_name() {
        let err =
            RosterConfig::from_toml_str("[storage]\ndatabase_name = \"  \"\n").unwrap_err();
        assert!(err.to_string().contains("database_name"));
    }

    #[test]
    fn platform_dir_ends_with_app_name() {
        assert!(platform_data_dir().ends_with("rosterd"));
    }
}
