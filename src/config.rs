//! Configuration file handling.
//!
//! A JSON file (default `/data/config/config.json`) with every field optional.
//! A missing file is written out with defaults on first start.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CatalogError;

pub const DEFAULT_CONFIG_PATH: &str = "/data/config/config.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub debug: bool,
    /// Root of the working directories (exports, reports, snapshots).
    pub data_dir: PathBuf,
    /// Target catalog database (see `index`).
    pub catalog_db: PathBuf,
    /// Navidrome-style library database, opened read-only.
    pub library_db: PathBuf,
    /// Where `.m3u8` files are written.
    pub playlist_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            data_dir: PathBuf::from("/data"),
            catalog_db: PathBuf::from("/data/catalog.sqlite3"),
            library_db: PathBuf::from("/navidrome/navidrome.db"),
            playlist_dir: PathBuf::from("/playlists"),
        }
    }
}

impl Config {
    /// Load `path`, creating it with defaults when absent.
    /// Returns the config and whether the file was created.
    pub fn load_or_create(path: &Path) -> Result<(Self, bool), CatalogError> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&contents)?;
            return Ok((config, false));
        }
        let config = Config::default();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&config)?)?;
        Ok((config, true))
    }

    /// Source playlist exports.
    pub fn source_dir(&self) -> PathBuf {
        self.data_dir.join("spotify")
    }

    /// Missing-track reports from `reconcile`.
    pub fn missing_dir(&self) -> PathBuf {
        self.data_dir.join("missing")
    }

    /// Target playlist snapshots written after `reconcile`.
    pub fn snapshot_dir(&self) -> PathBuf {
        self.data_dir.join("tidal")
    }

    /// Missing-track reports from `import-local`.
    pub fn local_missing_dir(&self) -> PathBuf {
        self.data_dir.join("navidrome-missing")
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [
            self.source_dir(),
            self.missing_dir(),
            self.snapshot_dir(),
            self.local_missing_dir(),
            self.playlist_dir.clone(),
        ] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}
