//! Local-library path lookup.
//!
//! Four substring queries, first hit wins. The last two retry the title/artist
//! query with the qualifier removed and both apostrophe glyphs tried in turn.

use log::debug;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::path::Path;

use crate::catalog::{LibraryField, LocalLibrary};
use crate::error::CatalogError;
use crate::normalize::{strip_qualifier, with_apostrophe, ASCII_APOSTROPHE, TYPOGRAPHIC_APOSTROPHE};

/// Which query found the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalTier {
    TitleArtist,
    TitleAlbum,
    TypographicTitleArtist,
    AsciiTitleArtist,
}

/// `%value%` with SQL `LIKE` wildcards in `value` escaped by `\`.
pub fn like_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Resolve a track to a local file path. `Ok(None)` means not found.
///
/// A tier whose album or artist is blank is skipped: `%%` would match every
/// row and turn the query into a title-only match. A blank title finds nothing.
pub fn find_local_path(
    library: &dyn LocalLibrary,
    title: &str,
    album: &str,
    artist: &str,
) -> Result<Option<(String, LocalTier)>, CatalogError> {
    if title.trim().is_empty() {
        return Ok(None);
    }
    let stripped = strip_qualifier(title.trim());
    let attempts = [
        (LocalTier::TitleArtist, title.to_string(), LibraryField::Artist, artist.to_string()),
        (LocalTier::TitleAlbum, title.to_string(), LibraryField::Album, album.to_string()),
        (
            LocalTier::TypographicTitleArtist,
            with_apostrophe(stripped, TYPOGRAPHIC_APOSTROPHE),
            LibraryField::Artist,
            with_apostrophe(artist, TYPOGRAPHIC_APOSTROPHE),
        ),
        (
            LocalTier::AsciiTitleArtist,
            with_apostrophe(stripped, ASCII_APOSTROPHE),
            LibraryField::Artist,
            with_apostrophe(artist, ASCII_APOSTROPHE),
        ),
    ];

    for (tier, title, field, value) in attempts {
        if value.trim().is_empty() || title.trim().is_empty() {
            continue;
        }
        if let Some(path) = library.find_path(&like_pattern(&title), field, &like_pattern(&value))? {
            debug!("Local match for '{}' via {:?}: {}", title, tier, path);
            return Ok(Some((path, tier)));
        }
    }
    Ok(None)
}

// ============================================================================
// SQLite (Navidrome media_file)
// ============================================================================

/// Read-only view of a Navidrome-style `media_file(path, title, album, artist)` table.
pub struct SqliteLibrary {
    conn: Connection,
}

impl SqliteLibrary {
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }
}

impl LocalLibrary for SqliteLibrary {
    fn find_path(
        &self,
        title_pattern: &str,
        field: LibraryField,
        value_pattern: &str,
    ) -> Result<Option<String>, CatalogError> {
        let sql = format!(
            "SELECT path FROM media_file
             WHERE title LIKE ?1 ESCAPE '\\' AND {} LIKE ?2 ESCAPE '\\'
             LIMIT 1",
            field.column()
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let path = stmt
            .query_row([title_pattern, value_pattern], |row| row.get(0))
            .optional()?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library(rows: &[(&str, &str, &str, &str)]) -> SqliteLibrary {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE media_file (
                id INTEGER PRIMARY KEY,
                path TEXT NOT NULL,
                title TEXT NOT NULL,
                album TEXT NOT NULL,
                artist TEXT NOT NULL
            );",
        )
        .unwrap();
        for (path, title, album, artist) in rows {
            conn.execute(
                "INSERT INTO media_file (path, title, album, artist) VALUES (?1, ?2, ?3, ?4)",
                [path, title, album, artist],
            )
            .unwrap();
        }
        SqliteLibrary::from_connection(conn)
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Lover"), "%Lover%");
        assert_eq!(like_pattern("100%_Pure"), "%100\\%\\_Pure%");
    }

    #[test]
    fn test_title_artist_first() {
        let lib = library(&[("/m/kids.flac", "Kids", "Oracular Spectacular", "MGMT")]);
        let found = find_local_path(&lib, "Kids", "Whatever", "MGMT").unwrap();
        assert_eq!(found, Some(("/m/kids.flac".to_string(), LocalTier::TitleArtist)));
    }

    #[test]
    fn test_album_fallback() {
        let lib = library(&[("/m/kids.flac", "Kids", "Oracular Spectacular", "MGMT")]);
        let found = find_local_path(&lib, "Kids", "Oracular", "Management").unwrap();
        assert_eq!(found.map(|(_, tier)| tier), Some(LocalTier::TitleAlbum));
    }

    #[test]
    fn test_deluxe_suffix_resolves_at_tier_3() {
        let lib = library(&[("/music/lover.flac", "Lover", "Lover", "Taylor Swift")]);
        let found = find_local_path(&lib, "Lover (deluxe)", "Lover (Deluxe Edition)", "Taylor Swift").unwrap();
        assert_eq!(
            found,
            Some(("/music/lover.flac".to_string(), LocalTier::TypographicTitleArtist))
        );
    }

    #[test]
    fn test_ascii_apostrophe_tier() {
        let lib = library(&[("/m/wibn.flac", "Wouldn't It Be Nice", "Pet Sounds", "The Beach Boys")]);
        let found = find_local_path(&lib, "Wouldn’t It Be Nice (Mono)", "Pet Sounds (Mono)", "The Beach Boys").unwrap();
        assert_eq!(found.map(|(_, tier)| tier), Some(LocalTier::AsciiTitleArtist));
    }

    #[test]
    fn test_not_found_is_none() {
        let lib = library(&[("/m/a.flac", "A", "B", "C")]);
        assert_eq!(find_local_path(&lib, "Nothing", "Nowhere", "Nobody").unwrap(), None);
    }

    #[test]
    fn test_blank_album_does_not_match_other_artist() {
        let lib = library(&[("/m/ts/lover.flac", "Lover", "Lover", "Taylor Swift")]);
        assert_eq!(find_local_path(&lib, "Lover", "", "Some Other Band").unwrap(), None);
        assert_eq!(find_local_path(&lib, "Lover", "  ", "Some Other Band").unwrap(), None);
    }

    #[test]
    fn test_blank_artist_still_tries_album() {
        let lib = library(&[("/m/ts/lover.flac", "Lover", "Lover", "Taylor Swift")]);
        assert_eq!(find_local_path(&lib, "Lover", "Other Album", "").unwrap(), None);
        let found = find_local_path(&lib, "Lover", "Lover", "").unwrap();
        assert_eq!(found.map(|(_, tier)| tier), Some(LocalTier::TitleAlbum));
    }

    #[test]
    fn test_blank_title_finds_nothing() {
        let lib = library(&[("/m/ts/lover.flac", "Lover", "Lover", "Taylor Swift")]);
        assert_eq!(find_local_path(&lib, " ", "Lover", "Taylor Swift").unwrap(), None);
    }

    #[test]
    fn test_wildcards_do_not_overmatch() {
        let lib = library(&[("/m/x.flac", "100 Pure", "X", "Y")]);
        assert_eq!(find_local_path(&lib, "100%", "Z", "Y").unwrap(), None);
    }
}
