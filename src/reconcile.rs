//! Reconciliation orchestrator.
//!
//! Drives each source track through
//! `CheckPresent → Lookup → MatchIdentity → MatchHeuristic → {Linked | Missing}`
//! and each source playlist through "find or create the target playlist".
//! Processing is strictly sequential: one playlist, then one track, at a time.

use std::time::Instant;

use log::{debug, error, info, warn};
use rustc_hash::FxHashSet;

use crate::catalog::{AddOutcome, MissingSink, PlaylistTarget, TrackSearch};
use crate::error::{ReconcileError, Result};
use crate::matching::{nearest_candidate, resolve};
use crate::models::{CatalogPlaylist, CatalogTrack, MatchOutcome, MissReason, MissingRecord, ReconcileStats};
use crate::normalize::{match_keys, normalize_name};
use crate::progress::{create_progress_bar, log_progress};

/// Log-only progress line every N tracks.
const PROGRESS_INTERVAL: u64 = 25;

// ============================================================================
// Target State
// ============================================================================

/// Titles and identifiers already in a target playlist.
///
/// Title keys come from [`match_keys`], so a lookup here agrees with
/// `titles_match`, plural fallback included.
#[derive(Debug, Default)]
pub struct PresenceIndex {
    titles: FxHashSet<String>,
    isrcs: FxHashSet<String>,
}

impl PresenceIndex {
    pub fn from_tracks(tracks: &[CatalogTrack]) -> Self {
        let mut index = Self::default();
        for track in tracks {
            index.insert(track);
        }
        index
    }

    pub fn insert(&mut self, track: &CatalogTrack) {
        self.titles.extend(match_keys(&track.title));
        if !track.isrc().is_empty() {
            self.isrcs.insert(track.isrc().to_ascii_uppercase());
        }
    }

    pub fn contains(&self, track: &CatalogTrack) -> bool {
        if !track.isrc().is_empty() && self.isrcs.contains(&track.isrc().to_ascii_uppercase()) {
            return true;
        }
        match_keys(&track.title).iter().any(|key| self.titles.contains(key))
    }
}

/// Target playlist plus its presence index, kept in step as tracks are linked.
#[derive(Debug)]
pub struct TargetPlaylist {
    playlist: CatalogPlaylist,
    present: PresenceIndex,
}

impl TargetPlaylist {
    pub fn new(playlist: CatalogPlaylist) -> Self {
        let present = PresenceIndex::from_tracks(&playlist.tracks);
        Self { playlist, present }
    }

    pub fn id(&self) -> &str {
        &self.playlist.id
    }

    pub fn contains(&self, track: &CatalogTrack) -> bool {
        self.present.contains(track)
    }

    fn push(&mut self, track: CatalogTrack) {
        self.present.insert(&track);
        self.playlist.tracks.push(track);
    }

    pub fn into_playlist(self) -> CatalogPlaylist {
        self.playlist
    }
}

// ============================================================================
// Reports
// ============================================================================

/// Outcome counts for one completed playlist.
#[derive(Debug, Clone, Default)]
pub struct PlaylistReport {
    pub source_title: String,
    /// Target playlist with every linked track appended.
    pub target: CatalogPlaylist,
    pub created: bool,
    pub already_present: usize,
    pub added: usize,
    pub missing: usize,
    pub skipped: usize,
    pub sink_failed: bool,
}

#[derive(Debug)]
pub struct PlaylistFailure {
    pub source_title: String,
    pub error: ReconcileError,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub completed: Vec<PlaylistReport>,
    pub failed: Vec<PlaylistFailure>,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

// ============================================================================
// Reconciler
// ============================================================================

pub struct Reconciler<'a> {
    search: &'a dyn TrackSearch,
    target: &'a dyn PlaylistTarget,
    sink: &'a dyn MissingSink,
    stats: ReconcileStats,
}

impl<'a> Reconciler<'a> {
    pub fn new(search: &'a dyn TrackSearch, target: &'a dyn PlaylistTarget, sink: &'a dyn MissingSink) -> Self {
        Self {
            search,
            target,
            sink,
            stats: ReconcileStats::default(),
        }
    }

    pub fn stats(&self) -> &ReconcileStats {
        &self.stats
    }

    pub fn into_stats(self) -> ReconcileStats {
        self.stats
    }

    /// Reconcile every source playlist. Only a failure to list the target's
    /// playlists stops the run; per-playlist failures land in the report.
    pub fn reconcile_all(&mut self, sources: &[CatalogPlaylist]) -> Result<RunReport> {
        let start = Instant::now();
        let mut existing = self.target.list_playlists().map_err(ReconcileError::ListPlaylists)?;
        info!(
            "Found {} source playlists and {} target playlists",
            sources.len(),
            existing.len()
        );

        let mut report = RunReport::default();
        for source in sources {
            self.stats.playlists_seen += 1;
            let created_before = self.stats.playlists_created;
            let result = self
                .ensure_target_playlist(source, &mut existing)
                .and_then(|target| self.reconcile_playlist(source, target));
            match result {
                Ok(mut playlist_report) => {
                    playlist_report.created = self.stats.playlists_created > created_before;
                    report.completed.push(playlist_report);
                }
                Err(err) => {
                    error!("Playlist '{}' aborted: {}", source.title, err);
                    self.stats.playlists_failed += 1;
                    report.failed.push(PlaylistFailure {
                        source_title: source.title.clone(),
                        error: err,
                    });
                }
            }
        }

        self.stats.elapsed_seconds = start.elapsed().as_secs_f64();
        Ok(report)
    }

    /// Find the target playlist with the same name, or create it.
    ///
    /// A created playlist is added to `existing` so a repeated source name
    /// reuses it instead of creating a second one.
    pub fn ensure_target_playlist(
        &mut self,
        source: &CatalogPlaylist,
        existing: &mut Vec<CatalogPlaylist>,
    ) -> Result<CatalogPlaylist> {
        let name = normalize_name(&source.title);
        if let Some(found) = existing.iter().find(|p| normalize_name(&p.title) == name) {
            debug!("Playlist '{}' found in target as {}", source.title, found.id);
            return Ok(found.clone());
        }

        info!("Playlist '{}' not found in target, creating it", source.title);
        let created = self
            .target
            .create_playlist(&source.title, &source.description)
            .map_err(|e| ReconcileError::CreatePlaylist {
                name: source.title.clone(),
                source: e,
            })?;
        self.stats.playlists_created += 1;
        existing.push(created.clone());
        Ok(created)
    }

    /// Reconcile one source playlist into `target`.
    ///
    /// Tracks without an identifier are skipped and counted. A failed "add"
    /// aborts the playlist; tracks linked before it stay linked and the
    /// missing tracks gathered so far are still handed to the sink.
    pub fn reconcile_playlist(&mut self, source: &CatalogPlaylist, target: CatalogPlaylist) -> Result<PlaylistReport> {
        let tracks = self
            .target
            .playlist_tracks(&target.id)
            .map_err(|e| ReconcileError::TargetRead {
                playlist_id: target.id.clone(),
                source: e,
            })?;
        let mut target = TargetPlaylist::new(CatalogPlaylist { tracks, ..target });

        info!("Reconciling playlist '{}' ({} tracks)", source.title, source.tracks.len());
        let mut report = PlaylistReport {
            source_title: source.title.clone(),
            ..Default::default()
        };
        let mut missing: Vec<MissingRecord> = Vec::new();
        let mut aborted = None;

        let total = source.tracks.len() as u64;
        let pb = create_progress_bar(total, &source.title);
        for (i, track) in source.tracks.iter().enumerate() {
            pb.inc(1);
            log_progress(&source.title, i as u64 + 1, total, PROGRESS_INTERVAL);

            if !track.has_identifier() {
                debug!("Skipping '{}': no source identifier", track);
                self.stats.skipped_unresolved += 1;
                report.skipped += 1;
                continue;
            }

            let outcome = match self.reconcile_track(&mut target, track) {
                Ok(outcome) => outcome,
                Err(err) => {
                    aborted = Some(err);
                    break;
                }
            };
            self.stats.record(&outcome);
            match outcome {
                MatchOutcome::AlreadyPresent => report.already_present += 1,
                MatchOutcome::Matched { .. } => report.added += 1,
                MatchOutcome::Missing(_) => {
                    report.missing += 1;
                    missing.push(MissingRecord::from(track));
                }
            }
        }
        pb.finish_and_clear();

        report.sink_failed = !self.flush_missing(&source.title, &missing);
        if let Some(err) = aborted {
            return Err(err);
        }

        info!(
            "Finished playlist '{}': {} present, {} added, {} missing, {} skipped",
            source.title, report.already_present, report.added, report.missing, report.skipped
        );
        report.target = target.into_playlist();
        Ok(report)
    }

    /// Run one source track through the state machine.
    ///
    /// Only a failed "add" is an error. Lookup failures become
    /// `Missing(LookupFailed)` and are not retried.
    pub fn reconcile_track(&mut self, target: &mut TargetPlaylist, source: &CatalogTrack) -> Result<MatchOutcome> {
        if target.contains(source) {
            debug!("'{}' already present", source);
            return Ok(MatchOutcome::AlreadyPresent);
        }

        let query = source.search_query();
        let results = match self.search.search(&query) {
            Ok(results) => results,
            Err(err) => {
                warn!("Lookup failed for '{}': {}", query, err);
                return Ok(MatchOutcome::Missing(MissReason::LookupFailed(err.to_string())));
            }
        };
        if results.is_empty() {
            debug!("'{}' missing: no candidates for '{}'", source, query);
            return Ok(MatchOutcome::Missing(MissReason::NoCandidates));
        }

        let verdict = resolve(source, &results);
        let (candidate, rule) = match (verdict.candidate(), verdict.rule()) {
            (Some(candidate), Some(rule)) => (candidate, rule),
            _ => {
                if let Some((nearest, score)) = nearest_candidate(source, &results) {
                    debug!(
                        "'{}' missing: {} candidates, nearest '{}' (rank {}, {:.2})",
                        source,
                        results.tracks.len(),
                        nearest.track,
                        nearest.rank,
                        score
                    );
                }
                return Ok(MatchOutcome::Missing(MissReason::NoMatch));
            }
        };

        let track_id = &candidate.track.external_id;
        match self.target.add_track(target.id(), track_id) {
            Ok(AddOutcome::Added) => {}
            Ok(AddOutcome::Conflict) => {
                debug!("Track {} already in playlist {}", track_id, target.id());
                self.stats.add_conflicts += 1;
            }
            Err(err) => {
                return Err(ReconcileError::Mutation {
                    playlist_id: target.id().to_string(),
                    track_id: track_id.clone(),
                    source: err,
                })
            }
        }

        debug!("'{}' linked to {} via {} (rank {})", source, track_id, rule, candidate.rank);
        let track = candidate.track.clone();
        target.push(track.clone());
        Ok(MatchOutcome::Matched { track, rule })
    }

    /// Hand a playlist's missing tracks to the sink. Returns false when the
    /// sink failed; the failure is logged and counted.
    fn flush_missing(&mut self, label: &str, missing: &[MissingRecord]) -> bool {
        if missing.is_empty() {
            return true;
        }
        info!("Recording {} missing tracks for '{}'", missing.len(), label);
        for record in missing {
            debug!("Missing: '{}' by {}", record.name, record.artist_credit());
        }
        match self.sink.record_missing(missing, label) {
            Ok(()) => true,
            Err(e) => {
                let err = ReconcileError::Sink {
                    label: label.to_string(),
                    source: e,
                };
                error!("{}", err);
                self.stats.sink_failures += 1;
                false
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use crate::models::{HeuristicTier, IdentityRule, MatchRule, SearchResults};
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    /// In-memory target catalog: search answers come from a fixed table.
    #[derive(Default)]
    struct FakeCatalog {
        answers: HashMap<String, Vec<CatalogTrack>>,
        failing_queries: Vec<String>,
        playlists: RefCell<Vec<CatalogPlaylist>>,
        add_calls: Cell<usize>,
        fail_adds: Cell<bool>,
    }

    impl FakeCatalog {
        fn answer(mut self, query: &str, tracks: Vec<CatalogTrack>) -> Self {
            self.answers.insert(query.to_string(), tracks);
            self
        }

        fn with_playlist(self, id: &str, title: &str, tracks: Vec<CatalogTrack>) -> Self {
            self.playlists.borrow_mut().push(CatalogPlaylist {
                id: id.into(),
                title: title.into(),
                description: String::new(),
                tracks,
            });
            self
        }

        fn find_track(&self, id: &str) -> Option<CatalogTrack> {
            self.answers.values().flatten().find(|t| t.external_id == id).cloned()
        }
    }

    impl TrackSearch for FakeCatalog {
        fn search(&self, query: &str) -> std::result::Result<SearchResults, CatalogError> {
            if self.failing_queries.iter().any(|q| q == query) {
                return Err(CatalogError::Unavailable("search down".into()));
            }
            Ok(SearchResults::from_ranked(self.answers.get(query).cloned().unwrap_or_default()))
        }
    }

    impl PlaylistTarget for FakeCatalog {
        fn list_playlists(&self) -> std::result::Result<Vec<CatalogPlaylist>, CatalogError> {
            Ok(self
                .playlists
                .borrow()
                .iter()
                .map(|p| CatalogPlaylist {
                    tracks: Vec::new(),
                    ..p.clone()
                })
                .collect())
        }

        fn playlist_tracks(&self, playlist_id: &str) -> std::result::Result<Vec<CatalogTrack>, CatalogError> {
            self.playlists
                .borrow()
                .iter()
                .find(|p| p.id == playlist_id)
                .map(|p| p.tracks.clone())
                .ok_or_else(|| CatalogError::not_found("playlist", playlist_id))
        }

        fn add_track(&self, playlist_id: &str, track_id: &str) -> std::result::Result<AddOutcome, CatalogError> {
            self.add_calls.set(self.add_calls.get() + 1);
            if self.fail_adds.get() {
                return Err(CatalogError::Unavailable("write rejected".into()));
            }
            let track = self
                .find_track(track_id)
                .ok_or_else(|| CatalogError::not_found("track", track_id))?;
            let mut playlists = self.playlists.borrow_mut();
            let playlist = playlists
                .iter_mut()
                .find(|p| p.id == playlist_id)
                .ok_or_else(|| CatalogError::not_found("playlist", playlist_id))?;
            if playlist.tracks.iter().any(|t| t.external_id == track_id) {
                return Ok(AddOutcome::Conflict);
            }
            playlist.tracks.push(track);
            Ok(AddOutcome::Added)
        }

        fn create_playlist(&self, name: &str, description: &str) -> std::result::Result<CatalogPlaylist, CatalogError> {
            let mut playlists = self.playlists.borrow_mut();
            let created = CatalogPlaylist {
                id: format!("p{}", playlists.len() + 1),
                title: name.into(),
                description: description.into(),
                tracks: Vec::new(),
            };
            playlists.push(created.clone());
            Ok(created)
        }
    }

    #[derive(Default)]
    struct FakeSink {
        calls: RefCell<Vec<(String, Vec<MissingRecord>)>>,
        fail: bool,
    }

    impl MissingSink for FakeSink {
        fn record_missing(&self, records: &[MissingRecord], label: &str) -> std::result::Result<(), CatalogError> {
            if self.fail {
                return Err(CatalogError::Unavailable("disk full".into()));
            }
            self.calls.borrow_mut().push((label.to_string(), records.to_vec()));
            Ok(())
        }
    }

    fn source_playlist(title: &str, tracks: Vec<CatalogTrack>) -> CatalogPlaylist {
        CatalogPlaylist {
            id: "src".into(),
            title: title.into(),
            description: "from source".into(),
            tracks,
        }
    }

    fn kids_catalog() -> FakeCatalog {
        FakeCatalog::default()
            .answer("Kids MGMT", vec![CatalogTrack::new("t-kids", "Kids (Remastered 2018)", &["MGMT"])])
            .answer(
                "Hey Jude The Beatles",
                vec![CatalogTrack::new("t-jude", "Hey Jude", &["The Beatles"]).with_isrc("GBAYE0601690")],
            )
    }

    #[test]
    fn test_heuristic_link_and_identity_link() {
        let catalog = kids_catalog().with_playlist("p1", "Road Trip", vec![]);
        let sink = FakeSink::default();
        let mut reconciler = Reconciler::new(&catalog, &catalog, &sink);

        let source = source_playlist(
            "Road Trip",
            vec![
                CatalogTrack::new("s1", "Kids", &["MGMT"]),
                CatalogTrack::new("s2", "Hey Jude", &["The Beatles"]).with_isrc("gbaye0601690"),
            ],
        );
        let report = reconciler.reconcile_all(&[source]).unwrap();

        assert!(!report.has_failures());
        assert_eq!(report.completed[0].added, 2);
        assert!(!report.completed[0].created);
        let stats = reconciler.stats();
        assert_eq!(stats.heuristic_tier_2, 1);
        assert_eq!(stats.identity_exact, 1);
        assert!(sink.calls.borrow().is_empty());
        assert_eq!(report.completed[0].target.tracks.len(), 2);
    }

    #[test]
    fn test_second_run_makes_no_add_calls() {
        let catalog = kids_catalog();
        let sink = FakeSink::default();
        let source = source_playlist("Road Trip", vec![CatalogTrack::new("s1", "Kids", &["MGMT"])]);

        Reconciler::new(&catalog, &catalog, &sink).reconcile_all(&[source.clone()]).unwrap();
        assert_eq!(catalog.add_calls.get(), 1);
        assert_eq!(catalog.playlists.borrow().len(), 1);

        let mut second = Reconciler::new(&catalog, &catalog, &sink);
        let report = second.reconcile_all(&[source]).unwrap();
        assert_eq!(catalog.add_calls.get(), 1);
        assert_eq!(catalog.playlists.borrow().len(), 1);
        assert_eq!(report.completed[0].already_present, 1);
        assert_eq!(second.stats().playlists_created, 0);
    }

    #[test]
    fn test_zero_candidates_sends_one_sink_entry() {
        let catalog = FakeCatalog::default().with_playlist("p1", "Obscure", vec![]);
        let sink = FakeSink::default();
        let mut reconciler = Reconciler::new(&catalog, &catalog, &sink);

        let source = source_playlist(
            "Obscure",
            vec![CatalogTrack::new("s1", "Unreleased Demo", &["Nobody"]).with_album("Tapes")],
        );
        let report = reconciler.reconcile_all(&[source]).unwrap();

        assert_eq!(report.completed[0].missing, 1);
        assert_eq!(reconciler.stats().missing_no_candidates, 1);
        let calls = sink.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "Obscure");
        assert_eq!(
            calls[0].1,
            vec![MissingRecord {
                name: "Unreleased Demo".into(),
                album: "Tapes".into(),
                artists: vec!["Nobody".into()],
            }]
        );
        assert_eq!(catalog.add_calls.get(), 0);
    }

    #[test]
    fn test_lookup_failure_is_missing_and_playlist_continues() {
        let mut catalog = kids_catalog().with_playlist("p1", "Mix", vec![]);
        catalog.failing_queries.push("Broken Artist".into());
        let sink = FakeSink::default();
        let mut reconciler = Reconciler::new(&catalog, &catalog, &sink);

        let source = source_playlist(
            "Mix",
            vec![
                CatalogTrack::new("s1", "Broken", &["Artist"]),
                CatalogTrack::new("s2", "Kids", &["MGMT"]),
            ],
        );
        let report = reconciler.reconcile_all(&[source]).unwrap();

        assert_eq!(report.completed[0].missing, 1);
        assert_eq!(report.completed[0].added, 1);
        assert_eq!(reconciler.stats().missing_lookup_failed, 1);
    }

    #[test]
    fn test_mutation_failure_aborts_playlist_only() {
        let catalog = kids_catalog();
        catalog.fail_adds.set(true);
        let sink = FakeSink::default();
        let mut reconciler = Reconciler::new(&catalog, &catalog, &sink);

        let first = source_playlist(
            "First",
            vec![
                CatalogTrack::new("s0", "Nothing Here", &["Nobody"]),
                CatalogTrack::new("s1", "Kids", &["MGMT"]),
                CatalogTrack::new("s2", "Hey Jude", &["The Beatles"]),
            ],
        );
        let second = source_playlist("Second", vec![]);
        let report = reconciler.reconcile_all(&[first, second]).unwrap();

        assert!(report.has_failures());
        assert_eq!(report.failed[0].source_title, "First");
        assert!(matches!(report.failed[0].error, ReconcileError::Mutation { .. }));
        assert_eq!(report.completed.len(), 1);
        // Aborted at the first add: the third track is never looked up.
        assert_eq!(catalog.add_calls.get(), 1);
        assert_eq!(reconciler.stats().playlists_failed, 1);
        // Missing tracks gathered before the abort still reach the sink.
        assert_eq!(sink.calls.borrow().len(), 1);
    }

    #[test]
    fn test_unresolved_tracks_skipped_at_boundary() {
        let catalog = kids_catalog().with_playlist("p1", "Mix", vec![]);
        let sink = FakeSink::default();
        let mut reconciler = Reconciler::new(&catalog, &catalog, &sink);

        let source = source_playlist(
            "Mix",
            vec![
                CatalogTrack::new("", "Local File", &["Me"]),
                CatalogTrack::new("s1", "Kids", &["MGMT"]),
            ],
        );
        let report = reconciler.reconcile_all(&[source]).unwrap();

        assert_eq!(report.completed[0].skipped, 1);
        assert_eq!(reconciler.stats().skipped_unresolved, 1);
        assert_eq!(reconciler.stats().total_tracks, 1);
        assert!(sink.calls.borrow().is_empty());
    }

    #[test]
    fn test_missing_playlist_is_created_once() {
        let catalog = kids_catalog();
        let sink = FakeSink::default();
        let mut reconciler = Reconciler::new(&catalog, &catalog, &sink);

        let report = reconciler
            .reconcile_all(&[
                source_playlist("Road Trip", vec![CatalogTrack::new("s1", "Kids", &["MGMT"])]),
                source_playlist("road trip ", vec![]),
            ])
            .unwrap();

        assert_eq!(reconciler.stats().playlists_created, 1);
        assert!(report.completed[0].created);
        assert!(!report.completed[1].created);
        let playlists = catalog.playlists.borrow();
        assert_eq!(playlists.len(), 1);
        assert_eq!(playlists[0].description, "from source");
    }

    #[test]
    fn test_bracketed_playlist_names_stay_distinct() {
        let catalog = FakeCatalog::default().with_playlist("p1", "Mix (2020)", vec![]);
        let sink = FakeSink::default();
        let mut reconciler = Reconciler::new(&catalog, &catalog, &sink);
        reconciler
            .reconcile_all(&[source_playlist("Mix (2021)", vec![])])
            .unwrap();
        assert_eq!(reconciler.stats().playlists_created, 1);
    }

    #[test]
    fn test_duplicate_source_track_short_circuits() {
        let catalog = kids_catalog().with_playlist("p1", "Mix", vec![]);
        let sink = FakeSink::default();
        let mut reconciler = Reconciler::new(&catalog, &catalog, &sink);

        let kids = CatalogTrack::new("s1", "Kids", &["MGMT"]);
        let report = reconciler
            .reconcile_all(&[source_playlist("Mix", vec![kids.clone(), kids])])
            .unwrap();

        assert_eq!(report.completed[0].added, 1);
        assert_eq!(report.completed[0].already_present, 1);
        assert_eq!(catalog.add_calls.get(), 1);
    }

    #[test]
    fn test_conflict_counts_as_linked() {
        let existing = CatalogTrack::new("t-kids", "Something Else", &["MGMT"]);
        let catalog = kids_catalog().with_playlist("p1", "Mix", vec![existing]);
        let sink = FakeSink::default();
        let mut reconciler = Reconciler::new(&catalog, &catalog, &sink);

        let report = reconciler
            .reconcile_all(&[source_playlist("Mix", vec![CatalogTrack::new("s1", "Kids", &["MGMT"])])])
            .unwrap();

        assert_eq!(report.completed[0].added, 1);
        assert_eq!(reconciler.stats().add_conflicts, 1);
        assert_eq!(reconciler.stats().total_linked, 1);
    }

    #[test]
    fn test_sink_failure_is_not_fatal() {
        let catalog = FakeCatalog::default().with_playlist("p1", "Mix", vec![]);
        let sink = FakeSink {
            fail: true,
            ..Default::default()
        };
        let mut reconciler = Reconciler::new(&catalog, &catalog, &sink);

        let report = reconciler
            .reconcile_all(&[source_playlist("Mix", vec![CatalogTrack::new("s1", "Gone", &["X"])])])
            .unwrap();

        assert!(!report.has_failures());
        assert!(report.completed[0].sink_failed);
        assert_eq!(reconciler.stats().sink_failures, 1);
    }

    #[test]
    fn test_presence_index_plural_and_isrc() {
        let index = PresenceIndex::from_tracks(&[
            CatalogTrack::new("a", "Daydream (Single Edit)", &["Band"]),
            CatalogTrack::new("b", "Other", &["Band"]).with_isrc("USRC17607839"),
        ]);
        assert!(index.contains(&CatalogTrack::new("x", "Daydreams", &["Band"])));
        assert!(index.contains(&CatalogTrack::new("y", "Renamed", &["Band"]).with_isrc("usrc17607839")));
        assert!(!index.contains(&CatalogTrack::new("z", "Nightmare", &["Band"])));
    }

    #[test]
    fn test_outcome_rules_recorded() {
        let catalog = kids_catalog().with_playlist("p1", "Mix", vec![]);
        let sink = FakeSink::default();
        let mut reconciler = Reconciler::new(&catalog, &catalog, &sink);
        let mut target = TargetPlaylist::new(CatalogPlaylist {
            id: "p1".into(),
            ..Default::default()
        });

        let outcome = reconciler
            .reconcile_track(&mut target, &CatalogTrack::new("s", "Kids", &["MGMT"]))
            .unwrap();
        match outcome {
            MatchOutcome::Matched { track, rule } => {
                assert_eq!(track.external_id, "t-kids");
                assert_eq!(rule, MatchRule::Heuristic(HeuristicTier::StrippedTitleArtist));
            }
            other => panic!("expected a match, got {:?}", other),
        }

        let source = CatalogTrack::new("s", "Hey Jude", &["The Beatles"]).with_isrc("GBAYE0601690");
        let outcome = reconciler.reconcile_track(&mut target, &source).unwrap();
        assert!(matches!(
            outcome,
            MatchOutcome::Matched {
                rule: MatchRule::Identity(IdentityRule::ExactIsrc),
                ..
            }
        ));
    }
}
