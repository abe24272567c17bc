//! Output path safety checks.
//!
//! Reports and snapshots are written next to the playlist exports they were
//! derived from. These checks keep them from landing where the next run would
//! read them back as input, and keep playlist titles from escaping their
//! directory.

use anyhow::{bail, Result};
use std::path::{Component, Path};

/// Longest file stem produced from a playlist title.
const MAX_STEM_LEN: usize = 200;

/// Turn a playlist title into a single safe file stem.
///
/// Path separators, control characters and characters reserved on common
/// filesystems become `_`; leading dots are dropped so a title can never name
/// a hidden file or a parent directory.
pub fn sanitize_file_stem(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').trim();
    if cleaned.is_empty() {
        return "untitled".to_string();
    }
    cleaned.chars().take(MAX_STEM_LEN).collect()
}

/// Validates that `output` may receive generated files.
///
/// Checks:
/// - `output` is not one of the `sources` directories, nor nested inside one
/// - `output` contains no `..` component
pub fn validate_output_dir(output: &Path, sources: &[&Path]) -> Result<()> {
    if output.components().any(|c| matches!(c, Component::ParentDir)) {
        bail!(
            "Safety check failed: output directory '{}' must not contain '..'",
            output.display()
        );
    }

    for source in sources {
        if output == *source {
            bail!(
                "Safety check failed: output '{}' cannot be the same as source '{}'",
                output.display(),
                source.display()
            );
        }
        if output.starts_with(source) {
            bail!(
                "Safety check failed: output '{}' is inside source directory '{}'",
                output.display(),
                source.display()
            );
        }
    }

    Ok(())
}
