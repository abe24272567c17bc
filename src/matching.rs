//! Combined matcher: identity rules first, then the heuristic tiers.

use crate::heuristic::match_by_heuristic;
use crate::identity::match_by_identity;
use crate::models::{CatalogTrack, HeuristicTier, IdentityRule, MatchCandidate, MatchRule, SearchResults};
use crate::normalize::normalize;

/// Tagged result of running every rule over one set of candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict<'a> {
    Identity(MatchCandidate<'a>, IdentityRule),
    Heuristic(MatchCandidate<'a>, HeuristicTier),
    None,
}

impl<'a> Verdict<'a> {
    pub fn candidate(&self) -> Option<MatchCandidate<'a>> {
        match *self {
            Verdict::Identity(candidate, _) | Verdict::Heuristic(candidate, _) => Some(candidate),
            Verdict::None => None,
        }
    }

    pub fn rule(&self) -> Option<MatchRule> {
        match *self {
            Verdict::Identity(_, rule) => Some(MatchRule::Identity(rule)),
            Verdict::Heuristic(_, tier) => Some(MatchRule::Heuristic(tier)),
            Verdict::None => None,
        }
    }
}

/// Heuristic tiers are only consulted when no identity rule accepts a candidate.
pub fn resolve<'a>(source: &CatalogTrack, results: &'a SearchResults) -> Verdict<'a> {
    if let Some((candidate, rule)) = match_by_identity(source, results) {
        return Verdict::Identity(candidate, rule);
    }
    match match_by_heuristic(source, results) {
        Some((candidate, tier)) => Verdict::Heuristic(candidate, tier),
        None => Verdict::None,
    }
}

/// Closest candidate by Jaro-Winkler similarity of normalized titles.
///
/// Diagnostic only: logged next to unmatched tracks, never used to link.
pub fn nearest_candidate<'a>(
    source: &CatalogTrack,
    results: &'a SearchResults,
) -> Option<(MatchCandidate<'a>, f64)> {
    let title = normalize(&source.title);
    results
        .candidates()
        .map(|candidate| {
            let score = strsim::jaro_winkler(&title, &normalize(&candidate.track.title));
            (candidate, score)
        })
        .max_by(|a, b| a.1.total_cmp(&b.1).then_with(|| b.0.rank.cmp(&a.0.rank)))
}
