//! SQLite-backed target catalog.
//!
//! Tracks are searchable through an FTS5 index over title and artists;
//! playlists live in plain tables. Implements both [`TrackSearch`] and
//! [`PlaylistTarget`].

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;

use crate::catalog::{AddOutcome, PlaylistTarget, TrackSearch};
use crate::error::CatalogError;
use crate::models::{CatalogPlaylist, CatalogTrack, SearchResults};
use crate::progress::{create_progress_bar, create_spinner, log_progress};

const WRITE_BATCH_SIZE: usize = 10_000;

/// Candidates returned per query.
pub const SEARCH_LIMIT: usize = 20;

static QUERY_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS tracks (
        id INTEGER PRIMARY KEY,
        external_id TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        artists TEXT NOT NULL,
        artist_text TEXT NOT NULL,
        album TEXT,
        isrc TEXT
    );

    CREATE VIRTUAL TABLE IF NOT EXISTS tracks_fts USING fts5(
        title, artist_text,
        content='tracks',
        content_rowid='id'
    );

    CREATE TABLE IF NOT EXISTS playlists (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT ''
    );

    CREATE TABLE IF NOT EXISTS playlist_items (
        playlist_id INTEGER NOT NULL REFERENCES playlists(id),
        track_id INTEGER NOT NULL REFERENCES tracks(id),
        position INTEGER NOT NULL,
        PRIMARY KEY (playlist_id, track_id)
    );";

/// FTS5 query matching any token of `query`. Each token is quoted so FTS
/// operators in titles ("AND", "NEAR", "-") are taken literally.
pub fn fts_query(query: &str) -> Option<String> {
    let tokens: Vec<String> = QUERY_TOKEN
        .find_iter(query)
        .map(|m| format!("\"{}\"", m.as_str()))
        .collect();
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" OR "))
    }
}

pub struct SqliteCatalog {
    conn: Connection,
}

impl SqliteCatalog {
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, CatalogError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, CatalogError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn track_count(&self) -> Result<usize, CatalogError> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM tracks", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Bulk-load tracks in batched transactions, then rebuild the FTS index.
    /// Tracks with an already known `external_id` replace the stored row.
    pub fn index_tracks(&mut self, tracks: &[CatalogTrack]) -> Result<usize, CatalogError> {
        let pb = create_progress_bar(tracks.len() as u64, "Indexing tracks");
        let mut written = 0usize;

        for chunk in tracks.chunks(WRITE_BATCH_SIZE) {
            let tx = self.conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached(
                    "INSERT INTO tracks (external_id, title, artists, artist_text, album, isrc)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(external_id) DO UPDATE SET
                        title = excluded.title,
                        artists = excluded.artists,
                        artist_text = excluded.artist_text,
                        album = excluded.album,
                        isrc = excluded.isrc",
                )?;

                for track in chunk {
                    if !track.has_identifier() {
                        pb.inc(1);
                        continue;
                    }
                    let artists = serde_json::to_string(&track.artists)?;
                    stmt.execute(params![
                        track.external_id,
                        track.title,
                        artists,
                        track.artists.join(" "),
                        track.album,
                        track.isrc,
                    ])?;
                    written += 1;
                    pb.inc(1);
                }
            }
            tx.commit()?;
            log_progress("index", pb.position(), tracks.len() as u64, WRITE_BATCH_SIZE as u64);
        }
        pb.finish_with_message(format!("Indexed {} tracks", written));

        self.rebuild_search_index()?;
        info!("Indexed {} of {} tracks", written, tracks.len());
        Ok(written)
    }

    fn rebuild_search_index(&self) -> Result<(), CatalogError> {
        let spinner = create_spinner("Building FTS index");
        self.conn
            .execute("INSERT INTO tracks_fts(tracks_fts) VALUES('rebuild')", [])?;
        spinner.finish_with_message("FTS index built");
        Ok(())
    }

    fn track_row_id(&self, external_id: &str) -> Result<Option<i64>, CatalogError> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM tracks WHERE external_id = ?1",
                [external_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn playlist_row_id(playlist_id: &str) -> Result<i64, CatalogError> {
        playlist_id
            .parse()
            .map_err(|_| CatalogError::not_found("playlist", playlist_id))
    }
}

fn track_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(CatalogTrack, String)> {
    let artists: String = row.get(2)?;
    let track = CatalogTrack {
        external_id: row.get(0)?,
        title: row.get(1)?,
        artists: Vec::new(),
        album: row.get(3)?,
        isrc: row.get(4)?,
    };
    Ok((track, artists))
}

fn with_artists((mut track, artists): (CatalogTrack, String)) -> Result<CatalogTrack, CatalogError> {
    track.artists = serde_json::from_str(&artists)?;
    Ok(track)
}

impl TrackSearch for SqliteCatalog {
    fn search(&self, query: &str) -> Result<SearchResults, CatalogError> {
        let fts = match fts_query(query) {
            Some(fts) => fts,
            None => return Ok(SearchResults::default()),
        };
        debug!("FTS query: {}", fts);

        let mut stmt = self.conn.prepare_cached(
            "SELECT t.external_id, t.title, t.artists, t.album, t.isrc
             FROM tracks_fts fts
             JOIN tracks t ON fts.rowid = t.id
             WHERE tracks_fts MATCH ?1
             ORDER BY fts.rank
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![fts, SEARCH_LIMIT as i64], track_from_row)?;

        let mut tracks = Vec::new();
        for row in rows {
            tracks.push(with_artists(row?)?);
        }
        Ok(SearchResults::from_ranked(tracks))
    }
}

impl PlaylistTarget for SqliteCatalog {
    fn list_playlists(&self) -> Result<Vec<CatalogPlaylist>, CatalogError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, title, description FROM playlists ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(CatalogPlaylist {
                id: row.get::<_, i64>(0)?.to_string(),
                title: row.get(1)?,
                description: row.get(2)?,
                tracks: Vec::new(),
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<CatalogTrack>, CatalogError> {
        let row_id = Self::playlist_row_id(playlist_id)?;
        let mut stmt = self.conn.prepare_cached(
            "SELECT t.external_id, t.title, t.artists, t.album, t.isrc
             FROM playlist_items pi
             JOIN tracks t ON pi.track_id = t.id
             WHERE pi.playlist_id = ?1
             ORDER BY pi.position",
        )?;
        let rows = stmt.query_map([row_id], track_from_row)?;

        let mut tracks = Vec::new();
        for row in rows {
            tracks.push(with_artists(row?)?);
        }
        Ok(tracks)
    }

    fn add_track(&self, playlist_id: &str, track_id: &str) -> Result<AddOutcome, CatalogError> {
        let playlist = Self::playlist_row_id(playlist_id)?;
        let track = self
            .track_row_id(track_id)?
            .ok_or_else(|| CatalogError::not_found("track", track_id))?;

        let result = self.conn.execute(
            "INSERT INTO playlist_items (playlist_id, track_id, position)
             VALUES (?1, ?2, (SELECT COALESCE(MAX(position), -1) + 1
                              FROM playlist_items WHERE playlist_id = ?1))",
            params![playlist, track],
        );
        match result {
            Ok(_) => Ok(AddOutcome::Added),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation
                    && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                Ok(AddOutcome::Conflict)
            }
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(CatalogError::not_found("playlist", playlist_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn create_playlist(&self, name: &str, description: &str) -> Result<CatalogPlaylist, CatalogError> {
        self.conn.execute(
            "INSERT INTO playlists (title, description) VALUES (?1, ?2)",
            params![name, description],
        )?;
        Ok(CatalogPlaylist {
            id: self.conn.last_insert_rowid().to_string(),
            title: name.to_string(),
            description: description.to_string(),
            tracks: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> SqliteCatalog {
        let mut catalog = SqliteCatalog::open_in_memory().unwrap();
        catalog
            .index_tracks(&[
                CatalogTrack::new("t1", "Kids (Remastered 2018)", &["MGMT"]).with_album("Oracular Spectacular"),
                CatalogTrack::new("t2", "Electric Feel", &["MGMT"]),
                CatalogTrack::new("t3", "Under Pressure", &["Queen", "David Bowie"]).with_isrc("GBUM71029604"),
                CatalogTrack::new("", "Unresolved", &["Nobody"]),
            ])
            .unwrap();
        catalog
    }

    #[test]
    fn test_fts_query_quotes_tokens() {
        assert_eq!(fts_query("Kids MGMT").as_deref(), Some("\"Kids\" OR \"MGMT\""));
        assert_eq!(fts_query("AND - NEAR").as_deref(), Some("\"AND\" OR \"NEAR\""));
        assert_eq!(fts_query(" -- "), None);
    }

    #[test]
    fn test_index_skips_unresolved() {
        assert_eq!(catalog().track_count().unwrap(), 3);
    }

    #[test]
    fn test_search_ranks_best_match_first() {
        let catalog = catalog();
        let results = catalog.search("Kids MGMT").unwrap();
        assert_eq!(results.tracks.len(), 2);
        assert_eq!(results.tracks[0].external_id, "t1");
        assert_eq!(results.tracks[0].album.as_deref(), Some("Oracular Spectacular"));
        assert!(catalog.search("Nonexistent Words").unwrap().is_empty());
    }

    #[test]
    fn test_search_round_trips_artists_and_isrc() {
        let results = catalog().search("Under Pressure Queen").unwrap();
        let top = &results.tracks[0];
        assert_eq!(top.artists, vec!["Queen".to_string(), "David Bowie".to_string()]);
        assert_eq!(top.isrc(), "GBUM71029604");
    }

    #[test]
    fn test_playlist_add_and_conflict() {
        let catalog = catalog();
        let playlist = catalog.create_playlist("Road Trip", "desc").unwrap();
        assert_eq!(catalog.list_playlists().unwrap(), vec![playlist.clone()]);

        assert_eq!(catalog.add_track(&playlist.id, "t2").unwrap(), AddOutcome::Added);
        assert_eq!(catalog.add_track(&playlist.id, "t1").unwrap(), AddOutcome::Added);
        assert_eq!(catalog.add_track(&playlist.id, "t2").unwrap(), AddOutcome::Conflict);

        let ids: Vec<String> = catalog
            .playlist_tracks(&playlist.id)
            .unwrap()
            .into_iter()
            .map(|t| t.external_id)
            .collect();
        assert_eq!(ids, vec!["t2".to_string(), "t1".to_string()]);
    }

    #[test]
    fn test_add_unknown_track_is_not_found() {
        let catalog = catalog();
        let playlist = catalog.create_playlist("Mix", "").unwrap();
        let err = catalog.add_track(&playlist.id, "nope").unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { .. }));
        assert!(catalog.playlist_tracks("not-a-number").is_err());
    }

    #[test]
    fn test_reindex_replaces_rows() {
        let mut catalog = catalog();
        catalog
            .index_tracks(&[CatalogTrack::new("t2", "Electric Feel (Live)", &["MGMT"])])
            .unwrap();
        assert_eq!(catalog.track_count().unwrap(), 3);
        let results = catalog.search("Live").unwrap();
        assert_eq!(results.tracks[0].title, "Electric Feel (Live)");
    }
}
