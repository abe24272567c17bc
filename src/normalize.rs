//! Title and artist normalization for cross-catalog comparison.
//!
//! Everything here is comparison-only: normalized strings are never stored or
//! displayed. Rules are applied in a fixed order:
//!
//! 1. trim surrounding whitespace, compare case-insensitively
//! 2. truncate at the first `" ("` or `" ["` qualifier
//! 3. fold `’` and `'` to one apostrophe glyph (both glyphs are tried)
//! 4. a title ending in `s` also compares without that `s`

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// APOSTROPHES
// ============================================================================

pub const ASCII_APOSTROPHE: char = '\'';
pub const TYPOGRAPHIC_APOSTROPHE: char = '\u{2019}';

/// Canonical forms tried, in order, when two titles are compared.
pub const APOSTROPHE_FORMS: [char; 2] = [ASCII_APOSTROPHE, TYPOGRAPHIC_APOSTROPHE];

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Start of a trailing qualifier: "Song (Remastered)", "Song [Live]".
pub static QUALIFIER_START: Lazy<Regex> = Lazy::new(|| Regex::new(r" [\(\[]").unwrap());

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Drop everything from the first `" ("` or `" ["` onwards.
///
/// "Kids (Remastered 2018)" → "Kids", "Lover [Live] (2019)" → "Lover".
/// A title that *starts* with a bracket is left untouched.
pub fn strip_qualifier(title: &str) -> &str {
    match QUALIFIER_START.find(title) {
        Some(m) => &title[..m.start()],
        None => title,
    }
}

/// Replace both apostrophe glyphs with `glyph`.
pub fn with_apostrophe(s: &str, glyph: char) -> String {
    s.chars()
        .map(|c| {
            if c == ASCII_APOSTROPHE || c == TYPOGRAPHIC_APOSTROPHE {
                glyph
            } else {
                c
            }
        })
        .collect()
}

/// Case-fold after NFC composition so "é" and "e\u{301}" agree.
fn fold(s: &str) -> String {
    s.nfc().collect::<String>().to_lowercase()
}

/// Steps 1–2: trimmed, qualifier-free, lowercase.
pub fn normalize_stripped(s: &str) -> String {
    fold(strip_qualifier(s.trim()).trim())
}

/// Steps 1–3 with the ASCII apostrophe as the canonical glyph.
pub fn normalize(s: &str) -> String {
    with_apostrophe(&normalize_stripped(s), ASCII_APOSTROPHE)
}

/// Steps 1 and 3 only. Used for playlist names, where a bracketed suffix is part
/// of the identity ("Mix (2020)" and "Mix (2021)" are different playlists).
pub fn normalize_name(s: &str) -> String {
    with_apostrophe(&fold(s.trim()), ASCII_APOSTROPHE)
}

/// Title without its trailing literal `s`, if it has one.
pub fn singular(title: &str) -> Option<&str> {
    title.strip_suffix('s')
}

/// Case-insensitive equality with no other normalization (artists, exact titles).
pub fn eq_fold(a: &str, b: &str) -> bool {
    a == b || fold(a) == fold(b)
}

/// Steps 1 and 3: case-insensitive equality under either apostrophe glyph,
/// qualifiers kept.
pub fn names_equal(a: &str, b: &str) -> bool {
    let (a, b) = (fold(a.trim()), fold(b.trim()));
    APOSTROPHE_FORMS
        .iter()
        .any(|&glyph| with_apostrophe(&a, glyph) == with_apostrophe(&b, glyph))
}

/// Full comparison (steps 1–4). The plural fallback applies to either side.
pub fn titles_match(a: &str, b: &str) -> bool {
    let (a, b) = (normalize_stripped(a), normalize_stripped(b));
    APOSTROPHE_FORMS.iter().any(|&glyph| {
        let (a, b) = (with_apostrophe(&a, glyph), with_apostrophe(&b, glyph));
        a == b || singular(&a) == Some(b.as_str()) || singular(&b) == Some(a.as_str())
    })
}

/// Keys under which a title is found by [`titles_match`]-style lookups: the
/// normalized title plus its singular form.
pub fn match_keys(title: &str) -> Vec<String> {
    let norm = normalize(title);
    let mut keys = Vec::with_capacity(2);
    if let Some(s) = singular(&norm) {
        if !s.is_empty() {
            keys.push(s.to_string());
        }
    }
    keys.push(norm);
    keys
}

// ============================================================================
// TESTS
// ============================================================================
