//! JSON file sink for missing-track reports.

use log::debug;
use std::fs;
use std::path::PathBuf;

use crate::catalog::MissingSink;
use crate::error::CatalogError;
use crate::models::MissingRecord;
use crate::safety::sanitize_file_stem;

/// Writes `<dir>/<sanitized label>.json`, replacing the previous report for
/// the same label.
pub struct JsonMissingSink {
    dir: PathBuf,
}

impl JsonMissingSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn report_path(&self, label: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_file_stem(label)))
    }
}

impl MissingSink for JsonMissingSink {
    fn record_missing(&self, records: &[MissingRecord], label: &str) -> Result<(), CatalogError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.report_path(label);
        let json = serde_json::to_string_pretty(records)?;
        fs::write(&path, json)?;
        debug!("Wrote {} missing tracks to {}", records.len(), path.display());
        Ok(())
    }
}
