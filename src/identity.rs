//! Identifier-based matching on ISRC codes.
//!
//! Rules run per candidate in catalog order and the first candidate that
//! satisfies either rule wins. Empty or short identifiers simply make a rule
//! not apply.

use crate::models::{CatalogTrack, IdentityRule, MatchCandidate, SearchResults};

/// Country code + registrant: "GB" + "UM7" → first 4 characters compared.
pub const ISRC_PREFIX_LEN: usize = 4;

/// Identity rules in priority order.
pub const IDENTITY_RULES: [IdentityRule; 2] = [IdentityRule::ExactIsrc, IdentityRule::IsrcPrefix];

/// Full identifier equality, case-insensitive. Empty identifiers never match.
pub fn exact_isrc(source: &str, candidate: &str) -> bool {
    let (source, candidate) = (source.trim(), candidate.trim());
    !source.is_empty() && !candidate.is_empty() && source.eq_ignore_ascii_case(candidate)
}

/// Registrant prefix equality. Both identifiers must be at least
/// [`ISRC_PREFIX_LEN`] characters long.
pub fn isrc_prefix(source: &str, candidate: &str) -> bool {
    match (prefix(source), prefix(candidate)) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

fn prefix(isrc: &str) -> Option<&str> {
    let isrc = isrc.trim();
    let (end, _) = isrc.char_indices().nth(ISRC_PREFIX_LEN - 1)?;
    let end = end + isrc[end..].chars().next()?.len_utf8();
    Some(&isrc[..end])
}

impl IdentityRule {
    pub fn applies(self, source: &CatalogTrack, candidate: &CatalogTrack) -> bool {
        match self {
            IdentityRule::ExactIsrc => exact_isrc(source.isrc(), candidate.isrc()),
            IdentityRule::IsrcPrefix => isrc_prefix(source.isrc(), candidate.isrc()),
        }
    }
}

/// First candidate accepted by any identity rule, with the rule that accepted it.
pub fn match_by_identity<'a>(
    source: &CatalogTrack,
    results: &'a SearchResults,
) -> Option<(MatchCandidate<'a>, IdentityRule)> {
    if source.isrc().is_empty() {
        return None;
    }
    results.candidates().find_map(|candidate| {
        IDENTITY_RULES
            .iter()
            .find(|rule| rule.applies(source, candidate.track))
            .map(|&rule| (candidate, rule))
    })
}
