//! Text-based fallback matching over title and artist.
//!
//! Only consulted once identity matching has found nothing. Tiers are tried in
//! order; the first tier looks at the top hit alone, the rest walk every
//! candidate in catalog order. Each tier reads a single candidate's own fields.

use crate::models::{CatalogTrack, HeuristicTier, MatchCandidate, SearchResults};
use crate::normalize::{eq_fold, names_equal, normalize_stripped, singular};

/// Tiers in priority order, highest confidence first.
pub const HEURISTIC_TIERS: [HeuristicTier; 4] = [
    HeuristicTier::TopHitTitleArtist,
    HeuristicTier::StrippedTitleArtist,
    HeuristicTier::SingularTitleArtist,
    HeuristicTier::SwappedArtist,
];

/// Which candidates a tier is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierScope {
    TopHit,
    EachCandidate,
}

fn same_primary_artist(source: &CatalogTrack, candidate: &CatalogTrack) -> bool {
    match (source.primary_artist(), candidate.primary_artist()) {
        (Some(a), Some(b)) => eq_fold(a, b),
        _ => false,
    }
}

impl HeuristicTier {
    pub fn scope(self) -> TierScope {
        match self {
            HeuristicTier::TopHitTitleArtist => TierScope::TopHit,
            _ => TierScope::EachCandidate,
        }
    }

    pub fn applies(self, source: &CatalogTrack, candidate: &CatalogTrack) -> bool {
        match self {
            HeuristicTier::TopHitTitleArtist => {
                names_equal(&candidate.title, &source.title) && same_primary_artist(source, candidate)
            }
            HeuristicTier::StrippedTitleArtist => {
                normalize_stripped(&candidate.title) == normalize_stripped(&source.title)
                    && same_primary_artist(source, candidate)
            }
            HeuristicTier::SingularTitleArtist => match singular(source.title.trim()) {
                Some(title) if !title.is_empty() => {
                    normalize_stripped(&candidate.title) == normalize_stripped(title)
                        && same_primary_artist(source, candidate)
                }
                _ => false,
            },
            HeuristicTier::SwappedArtist => match (source.second_artist(), candidate.primary_artist()) {
                (Some(second), Some(primary)) => {
                    eq_fold(&candidate.title, &source.title) && eq_fold(primary, second)
                }
                _ => false,
            },
        }
    }
}

/// First tier that accepts a candidate, and the candidate it accepted.
pub fn match_by_heuristic<'a>(
    source: &CatalogTrack,
    results: &'a SearchResults,
) -> Option<(MatchCandidate<'a>, HeuristicTier)> {
    for tier in HEURISTIC_TIERS {
        let hit = match tier.scope() {
            TierScope::TopHit => results
                .top_hit()
                .filter(|top| tier.applies(source, top.track)),
            TierScope::EachCandidate => results
                .candidates()
                .find(|candidate| tier.applies(source, candidate.track)),
        };
        if let Some(candidate) = hit {
            return Some((candidate, tier));
        }
    }
    None
}
