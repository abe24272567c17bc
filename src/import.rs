//! Local-library import: target playlist snapshots to `.m3u8` files.

use log::{debug, error, info, warn};
use std::path::Path;

use crate::catalog::{LocalLibrary, MissingSink};
use crate::error::CatalogError;
use crate::local::{find_local_path, LocalTier};
use crate::m3u::M3uPlaylist;
use crate::models::{CatalogPlaylist, MissingRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub title: String,
    pub found: usize,
    pub appended: usize,
    pub missing: usize,
    /// Hits per local tier, in tier order.
    pub by_tier: [usize; 4],
    /// The missing-track report could not be written.
    pub sink_failed: bool,
}

fn tier_index(tier: LocalTier) -> usize {
    match tier {
        LocalTier::TitleArtist => 0,
        LocalTier::TitleAlbum => 1,
        LocalTier::TypographicTitleArtist => 2,
        LocalTier::AsciiTitleArtist => 3,
    }
}

/// Resolve every track of `playlist` against `library` and append the hits to
/// `<m3u_dir>/<title>.m3u8`. Unresolved tracks go to `sink` under the
/// playlist title. A failed library query counts the track as missing.
pub fn import_playlist(
    library: &dyn LocalLibrary,
    sink: &dyn MissingSink,
    playlist: &CatalogPlaylist,
    m3u_dir: &Path,
) -> Result<ImportReport, CatalogError> {
    let m3u = M3uPlaylist::open_or_create(m3u_dir, &playlist.title)?;
    info!(
        "Processing playlist '{}' which has {} tracks",
        playlist.title,
        playlist.tracks.len()
    );

    let mut report = ImportReport {
        title: playlist.title.clone(),
        ..Default::default()
    };
    let mut missing = Vec::new();

    for track in &playlist.tracks {
        let album = track.album.as_deref().unwrap_or("");
        let artist = track.primary_artist().unwrap_or("");
        let found = match find_local_path(library, &track.title, album, artist) {
            Ok(found) => found,
            Err(e) => {
                warn!("Library lookup failed for '{}': {}", track, e);
                None
            }
        };

        match found {
            Some((path, tier)) => {
                report.found += 1;
                report.by_tier[tier_index(tier)] += 1;
                if m3u.append_unique(&path)? {
                    debug!("Added {} to {}", path, m3u.path().display());
                    report.appended += 1;
                }
            }
            None => {
                debug!("Track '{}' not found locally", track);
                missing.push(MissingRecord::from(track));
            }
        }
    }

    report.missing = missing.len();
    if !missing.is_empty() {
        for record in &missing {
            debug!("Missing locally: '{}' by {}", record.name, record.artist_credit());
        }
        if let Err(e) = sink.record_missing(&missing, &playlist.title) {
            error!("Failed to record missing tracks for '{}': {}", playlist.title, e);
            report.sink_failed = true;
        }
    }
    info!(
        "Finished processing playlist '{}': {} found, {} missing",
        playlist.title, report.found, report.missing
    );
    Ok(report)
}
