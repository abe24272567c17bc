//! Core data models for playlist reconciliation.
//!
//! Catalog snapshots (tracks, playlists, search results), match outcomes, the
//! slimmed missing-track record, and run statistics.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Catalog Models
// ============================================================================

/// A track as fetched from one catalog. Never mutated after construction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogTrack {
    /// Catalog-specific identifier; empty when the provider could not resolve a track.
    #[serde(default)]
    pub external_id: String,
    pub title: String,
    /// Credited artists, primary first.
    #[serde(default)]
    pub artists: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isrc: Option<String>,
}

impl CatalogTrack {
    pub fn new(external_id: impl Into<String>, title: impl Into<String>, artists: &[&str]) -> Self {
        Self {
            external_id: external_id.into(),
            title: title.into(),
            artists: artists.iter().map(|a| a.to_string()).collect(),
            album: None,
            isrc: None,
        }
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_isrc(mut self, isrc: impl Into<String>) -> Self {
        self.isrc = Some(isrc.into().trim().to_uppercase());
        self
    }

    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(String::as_str)
    }

    pub fn second_artist(&self) -> Option<&str> {
        self.artists.get(1).map(String::as_str)
    }

    /// ISRC or the empty string.
    pub fn isrc(&self) -> &str {
        self.isrc.as_deref().map(str::trim).unwrap_or("")
    }

    /// Tracks without a usable identifier are skipped before reconciliation.
    pub fn has_identifier(&self) -> bool {
        !self.external_id.trim().is_empty()
    }

    /// Free-text lookup query: `"<title> <primary artist>"`.
    pub fn search_query(&self) -> String {
        match self.primary_artist() {
            Some(artist) => format!("{} {}", self.title, artist),
            None => self.title.clone(),
        }
    }
}

impl fmt::Display for CatalogTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.primary_artist() {
            Some(artist) => write!(f, "{} - {}", artist, self.title),
            None => write!(f, "{}", self.title),
        }
    }
}

/// Playlist snapshot. Playlists are matched across catalogs by title, never by id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPlaylist {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tracks: Vec<CatalogTrack>,
}

/// Ranked search response. `tracks[0]` stands in for the top hit when the catalog
/// does not designate one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchResults {
    pub top_hit: Option<CatalogTrack>,
    pub tracks: Vec<CatalogTrack>,
}

impl SearchResults {
    pub fn from_ranked(tracks: Vec<CatalogTrack>) -> Self {
        Self {
            top_hit: None,
            tracks,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn top_hit(&self) -> Option<MatchCandidate<'_>> {
        self.top_hit
            .as_ref()
            .or_else(|| self.tracks.first())
            .map(|track| MatchCandidate { rank: 0, track })
    }

    /// Candidates in the catalog's own relevance order.
    pub fn candidates(&self) -> impl Iterator<Item = MatchCandidate<'_>> {
        self.tracks
            .iter()
            .enumerate()
            .map(|(rank, track)| MatchCandidate { rank, track })
    }
}

/// A search result with its catalog rank (0 = top hit).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchCandidate<'a> {
    pub rank: usize,
    pub track: &'a CatalogTrack,
}

// ============================================================================
// Match Outcomes
// ============================================================================

/// Identifier rules, highest confidence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityRule {
    /// Full ISRC equality
    ExactIsrc,
    /// Registrant prefix (first 4 characters) equality
    IsrcPrefix,
}

/// Text-based fallback tiers, highest confidence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicTier {
    /// Top hit's normalized title and primary artist
    TopHitTitleArtist,
    /// Qualifier-stripped title and primary artist
    StrippedTitleArtist,
    /// As above with the source's plural `s` dropped
    SingularTitleArtist,
    /// Exact title, primary artist equals the source's second artist
    SwappedArtist,
}

impl HeuristicTier {
    /// 1-based tier number used in logs and reports.
    pub fn number(self) -> usize {
        match self {
            HeuristicTier::TopHitTitleArtist => 1,
            HeuristicTier::StrippedTitleArtist => 2,
            HeuristicTier::SingularTitleArtist => 3,
            HeuristicTier::SwappedArtist => 4,
        }
    }
}

/// Which rule linked a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "rule", rename_all = "snake_case")]
pub enum MatchRule {
    Identity(IdentityRule),
    Heuristic(HeuristicTier),
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchRule::Identity(IdentityRule::ExactIsrc) => write!(f, "exact ISRC"),
            MatchRule::Identity(IdentityRule::IsrcPrefix) => write!(f, "ISRC prefix"),
            MatchRule::Heuristic(tier) => write!(f, "heuristic tier {}", tier.number()),
        }
    }
}

/// Why a track ended up missing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MissReason {
    /// Search returned nothing
    NoCandidates,
    /// Candidates returned but no rule accepted any
    NoMatch,
    /// The lookup adapter failed; the message is kept for the log
    LookupFailed(String),
}

/// Exactly one outcome per source track per pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched { track: CatalogTrack, rule: MatchRule },
    AlreadyPresent,
    Missing(MissReason),
}

impl MatchOutcome {
    pub fn is_linked(&self) -> bool {
        !matches!(self, MatchOutcome::Missing(_))
    }
}

// ============================================================================
// Missing Records
// ============================================================================

/// Slimmed projection of a track for human review. Never read back by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingRecord {
    pub name: String,
    pub album: String,
    pub artists: Vec<String>,
}

impl MissingRecord {
    /// "A", "A and B", "A, B and C".
    pub fn artist_credit(&self) -> String {
        match self.artists.as_slice() {
            [] => String::new(),
            [only] => only.clone(),
            [init @ .., last] => format!("{} and {}", init.join(", "), last),
        }
    }
}

impl From<&CatalogTrack> for MissingRecord {
    fn from(track: &CatalogTrack) -> Self {
        Self {
            name: track.title.clone(),
            album: track.album.clone().unwrap_or_default(),
            artists: track.artists.clone(),
        }
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Per-run counters, serialized next to the missing reports with `--stats`.
#[derive(Default, Debug, Clone, Serialize)]
pub struct ReconcileStats {
    // Playlists
    pub playlists_seen: usize,
    pub playlists_created: usize,
    pub playlists_failed: usize,

    // Boundary
    pub skipped_unresolved: usize,

    // Outcomes
    pub already_present: usize,
    pub identity_exact: usize,
    pub identity_prefix: usize,
    pub heuristic_tier_1: usize,
    pub heuristic_tier_2: usize,
    pub heuristic_tier_3: usize,
    pub heuristic_tier_4: usize,
    pub missing_no_candidates: usize,
    pub missing_no_match: usize,
    pub missing_lookup_failed: usize,

    // Target mutations answered with "already there"
    pub add_conflicts: usize,

    // Sink failures (reported, not fatal)
    pub sink_failures: usize,

    // Totals
    pub total_tracks: usize,
    pub total_linked: usize,
    pub total_missing: usize,

    pub elapsed_seconds: f64,
}

impl ReconcileStats {
    pub fn record(&mut self, outcome: &MatchOutcome) {
        self.total_tracks += 1;
        match outcome {
            MatchOutcome::AlreadyPresent => self.already_present += 1,
            MatchOutcome::Matched { rule, .. } => match rule {
                MatchRule::Identity(IdentityRule::ExactIsrc) => self.identity_exact += 1,
                MatchRule::Identity(IdentityRule::IsrcPrefix) => self.identity_prefix += 1,
                MatchRule::Heuristic(HeuristicTier::TopHitTitleArtist) => self.heuristic_tier_1 += 1,
                MatchRule::Heuristic(HeuristicTier::StrippedTitleArtist) => self.heuristic_tier_2 += 1,
                MatchRule::Heuristic(HeuristicTier::SingularTitleArtist) => self.heuristic_tier_3 += 1,
                MatchRule::Heuristic(HeuristicTier::SwappedArtist) => self.heuristic_tier_4 += 1,
            },
            MatchOutcome::Missing(reason) => match reason {
                MissReason::NoCandidates => self.missing_no_candidates += 1,
                MissReason::NoMatch => self.missing_no_match += 1,
                MissReason::LookupFailed(_) => self.missing_lookup_failed += 1,
            },
        }
        if outcome.is_linked() {
            self.total_linked += 1;
        } else {
            self.total_missing += 1;
        }
    }

    /// Linked (present or newly added) tracks as a percentage.
    pub fn match_rate(&self) -> f64 {
        if self.total_tracks == 0 {
            0.0
        } else {
            100.0 * self.total_linked as f64 / self.total_tracks as f64
        }
    }

    pub fn log_summary(&self) {
        log::info!(
            "Reconciled {} tracks across {} playlists: {} linked ({:.1}%), {} missing, {} skipped",
            self.total_tracks,
            self.playlists_seen,
            self.total_linked,
            self.match_rate(),
            self.total_missing,
            self.skipped_unresolved
        );
        if let Ok(json) = serde_json::to_string_pretty(self) {
            log::debug!("[STATS]\n{}", json);
        }
    }

    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
