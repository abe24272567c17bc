//! JSON playlist exports and snapshots.
//!
//! One playlist per `<sanitized title>.json`. A `playlists.json` index file may
//! sit in the same directory and is never read as a playlist.

use log::{debug, error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::PlaylistTarget;
use crate::error::CatalogError;
use crate::models::{CatalogPlaylist, CatalogTrack};
use crate::safety::sanitize_file_stem;

const INDEX_FILE: &str = "playlists.json";

/// Every playlist file in `dir`, in file-name order.
pub fn read_playlists(dir: &Path) -> Result<Vec<CatalogPlaylist>, CatalogError> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map_or(false, |ext| ext == "json"))
        .filter(|path| path.file_name().map_or(true, |name| name != INDEX_FILE))
        .collect();
    paths.sort();

    let mut playlists = Vec::with_capacity(paths.len());
    for path in paths {
        let contents = fs::read_to_string(&path)?;
        let playlist: CatalogPlaylist = serde_json::from_str(&contents)?;
        debug!("Read playlist '{}' ({} tracks) from {}", playlist.title, playlist.tracks.len(), path.display());
        playlists.push(playlist);
    }
    if playlists.is_empty() {
        warn!("No playlist files found in {}", dir.display());
    }
    Ok(playlists)
}

/// Write `playlist` to `<dir>/<sanitized title>.json`.
pub fn write_playlist(dir: &Path, playlist: &CatalogPlaylist) -> Result<PathBuf, CatalogError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.json", sanitize_file_stem(&playlist.title)));
    fs::write(&path, serde_json::to_string_pretty(playlist)?)?;
    Ok(path)
}

/// Re-read each of `playlists` from `target` and write it to `dir`.
///
/// A playlist that cannot be refreshed or written is logged and skipped; the
/// rest are still written. Returns the written paths and the failure count.
pub fn write_snapshots(
    target: &dyn PlaylistTarget,
    dir: &Path,
    playlists: &[&CatalogPlaylist],
) -> (Vec<PathBuf>, usize) {
    let mut written = Vec::with_capacity(playlists.len());
    let mut failed = 0;
    for playlist in playlists {
        let result = target.playlist_tracks(&playlist.id).and_then(|tracks| {
            let snapshot = CatalogPlaylist {
                tracks,
                ..(*playlist).clone()
            };
            write_playlist(dir, &snapshot)
        });
        match result {
            Ok(path) => {
                info!("Wrote snapshot of '{}' to {}", playlist.title, path.display());
                written.push(path);
            }
            Err(e) => {
                error!("Failed to write snapshot for '{}': {}", playlist.title, e);
                failed += 1;
            }
        }
    }
    (written, failed)
}

/// A catalog dump: a JSON array of tracks.
pub fn read_tracks(path: &Path) -> Result<Vec<CatalogTrack>, CatalogError> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
