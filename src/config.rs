//! Configuration file support for the ADIF logbook.
//!
//! Loads settings from `~/.config/adif-logbook/config.toml` on Linux
//! (or platform-appropriate location on other OSes).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default SQLite database file.
pub const DEFAULT_DATABASE_PATH: &str = "contact_logs.db";

/// Default directory scanned for ADIF files.
pub const DEFAULT_UPLOAD_DIR: &str = "adif_uploads";

/// Configuration for the contact store.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the SQLite database file.
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
        }
    }
}

impl StorageConfig {
    /// Create a storage configuration for the given database file.
    pub fn with_database(path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: path.into(),
        }
    }
}

/// Configuration for the upload directory scan.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Directory containing `.adif`/`.adi` files.
    pub upload_dir: PathBuf,

    /// Only scan when the database does not exist yet.
    pub skip_if_database_exists: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            skip_if_database_exists: true,
        }
    }
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database settings.
    pub storage: StorageConfig,

    /// Upload scan settings.
    pub ingest: IngestConfig,
}

impl Config {
    /// Load configuration from the default config file location.
    ///
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but is malformed.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Config::default()),
        }
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in config file: {}", path.display()))
    }

    /// Returns the path to the config file.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("adif-logbook/config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(
            config.storage.database_path,
            PathBuf::from(DEFAULT_DATABASE_PATH)
        );
        assert_eq!(config.ingest.upload_dir, PathBuf::from(DEFAULT_UPLOAD_DIR));
        assert!(config.ingest.skip_if_database_exists);
    }

    #[test]
    fn test_parse_empty_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(
            config.storage.database_path,
            PathBuf::from(DEFAULT_DATABASE_PATH)
        );
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
            [storage]
            database_path = "/var/lib/logbook/contacts.db"

            [ingest]
            upload_dir = "/srv/adif"
            skip_if_database_exists = false
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.storage.database_path,
            PathBuf::from("/var/lib/logbook/contacts.db")
        );
        assert_eq!(config.ingest.upload_dir, PathBuf::from("/srv/adif"));
        assert!(!config.ingest.skip_if_database_exists);
    }

    #[test]
    fn test_parse_partial_section() {
        let toml = r#"
            [ingest]
            upload_dir = "logs"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.ingest.upload_dir, PathBuf::from("logs"));
        assert!(config.ingest.skip_if_database_exists);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[storage]\ndatabase_path = \"qsos.db\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.storage.database_path, PathBuf::from("qsos.db"));
    }

    #[test]
    fn test_load_from_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[storage\ndatabase_path = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_storage_config_with_database() {
        let storage = StorageConfig::with_database("/tmp/x.db");
        assert_eq!(storage.database_path, PathBuf::from("/tmp/x.db"));
    }
}
