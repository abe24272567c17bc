//! Collaborator interfaces consumed by the reconciliation engine.
//!
//! All calls are synchronous and opaque; the engine enforces no timeouts and
//! never retries.

use crate::error::CatalogError;
use crate::models::{CatalogPlaylist, CatalogTrack, MissingRecord, SearchResults};

/// Free-text search against the target catalog.
pub trait TrackSearch {
    /// Ranked candidates for `query`. An empty result is not an error.
    fn search(&self, query: &str) -> Result<SearchResults, CatalogError>;
}

/// Result of adding a track to a target playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// The target reported the track as already there; counted as success.
    Conflict,
}

/// Read and mutate playlists in the target catalog.
pub trait PlaylistTarget {
    /// All playlists, without their tracks.
    fn list_playlists(&self) -> Result<Vec<CatalogPlaylist>, CatalogError>;

    fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<CatalogTrack>, CatalogError>;

    fn add_track(&self, playlist_id: &str, track_id: &str) -> Result<AddOutcome, CatalogError>;

    fn create_playlist(&self, name: &str, description: &str) -> Result<CatalogPlaylist, CatalogError>;
}

/// Title/album/artist lookup against a local library.
pub trait LocalLibrary {
    /// Path of the first row whose title is `LIKE title_pattern` and whose
    /// `field` is `LIKE value_pattern`. Patterns arrive already wrapped in `%`.
    fn find_path(
        &self,
        title_pattern: &str,
        field: LibraryField,
        value_pattern: &str,
    ) -> Result<Option<String>, CatalogError>;
}

/// Second column constrained by a local-library query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryField {
    Artist,
    Album,
}

impl LibraryField {
    pub fn column(self) -> &'static str {
        match self {
            LibraryField::Artist => "artist",
            LibraryField::Album => "album",
        }
    }
}

/// Persists unmatched tracks for manual review.
pub trait MissingSink {
    fn record_missing(&self, records: &[MissingRecord], label: &str) -> Result<(), CatalogError>;
}
