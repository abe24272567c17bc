//! Extended M3U playlist files for the local library.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::safety::sanitize_file_stem;

pub const M3U_HEADER: &str = "#EXTM3U";

/// An `.m3u8` file whose entries are absolute library paths, one per line.
#[derive(Debug)]
pub struct M3uPlaylist {
    path: PathBuf,
}

impl M3uPlaylist {
    /// `<dir>/<sanitized name>.m3u8`, created with the header if absent.
    /// An existing file is left as is.
    pub fn open_or_create(dir: &Path, name: &str) -> std::io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.m3u8", sanitize_file_stem(name)));
        if !path.exists() {
            fs::write(&path, format!("{}\n", M3U_HEADER))?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries in file order, header and comments excluded.
    pub fn entries(&self) -> std::io::Result<Vec<String>> {
        let contents = fs::read_to_string(&self.path)?;
        Ok(contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect())
    }

    /// Append `entry` unless an identical line is already present.
    /// Returns whether the file changed.
    pub fn append_unique(&self, entry: &str) -> std::io::Result<bool> {
        let entry = entry.trim();
        if self.entries()?.iter().any(|existing| existing == entry) {
            return Ok(false);
        }
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        writeln!(file, "{}", entry)?;
        Ok(true)
    }
}
