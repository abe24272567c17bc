//! Error types for catalog collaborators and the reconciliation orchestrator.

use thiserror::Error;

/// Failure inside a catalog, library or sink adapter.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// SQLite query or connection error
    #[error(transparent)]
    Query(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Adapter cannot serve requests (closed, misconfigured)
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

impl CatalogError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Failure that stops reconciliation of a playlist.
///
/// Lookup failures are not represented here: they turn the track into a
/// missing entry and the playlist continues.
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("failed to list target playlists: {0}")]
    ListPlaylists(#[source] CatalogError),

    #[error("failed to add track {track_id} to playlist {playlist_id}: {source}")]
    Mutation {
        playlist_id: String,
        track_id: String,
        #[source]
        source: CatalogError,
    },

    #[error("failed to create playlist '{name}': {source}")]
    CreatePlaylist {
        name: String,
        #[source]
        source: CatalogError,
    },

    #[error("failed to read target playlist {playlist_id}: {source}")]
    TargetRead {
        playlist_id: String,
        #[source]
        source: CatalogError,
    },

    #[error("failed to record missing tracks for '{label}': {source}")]
    Sink {
        label: String,
        #[source]
        source: CatalogError,
    },
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
