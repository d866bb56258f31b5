//! Human-facing helpers for patch results: unified diffs of applied changes
//! and near-miss hints for anchors that could not be found.

use crate::engine::{InsertionSpec, SourceDocument};
use similar::TextDiff;
use std::fmt;
use std::path::Path;

/// Minimum similarity for a line to be offered as a near miss.
pub const NEAR_MISS_THRESHOLD: f64 = 0.6;

/// Unified diff between the original and patched text of `file`.
pub fn unified_diff(file: &Path, original: &str, patched: &str) -> String {
    let original_header = format!("{} (original)", file.display());
    let patched_header = format!("{} (patched)", file.display());
    let diff = TextDiff::from_lines(original, patched)
        .unified_diff()
        .context_radius(2)
        .header(&original_header, &patched_header)
        .to_string();
    diff
}

/// A document line that closely resembles a marker that was not found.
#[derive(Debug, Clone, PartialEq)]
pub struct NearMiss {
    pub marker: String,
    /// 1-based line number
    pub line: usize,
    pub text: String,
    pub similarity: f64,
}

impl fmt::Display for NearMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "closest match for {:?} is line {}: {:?} ({:.0}% similar)",
            self.marker,
            self.line,
            self.text,
            self.similarity * 100.0
        )
    }
}

/// Best near miss over every anchor marker of `spec`.
pub fn near_miss(document: &SourceDocument, spec: &InsertionSpec) -> Option<NearMiss> {
    spec.anchors
        .iter()
        .filter_map(|strategy| strategy.primary_marker())
        .filter_map(|marker| closest_line(document, marker))
        .max_by(|a, b| a.similarity.total_cmp(&b.similarity))
}

/// Line most similar to the first visible line of `marker`.
pub fn closest_line(document: &SourceDocument, marker: &str) -> Option<NearMiss> {
    let needle = marker.lines().map(str::trim).find(|l| !l.is_empty())?;

    (0..document.line_count())
        .filter_map(|idx| {
            let text = document.line_text(idx)?.trim();
            if text.is_empty() {
                return None;
            }
            Some((idx, text, strsim::normalized_levenshtein(needle, text)))
        })
        .filter(|(_, _, score)| *score >= NEAR_MISS_THRESHOLD)
        .max_by(|a, b| a.2.total_cmp(&b.2))
        .map(|(idx, text, similarity)| NearMiss {
            marker: marker.to_string(),
            line: idx + 1,
            text: text.to_string(),
            similarity,
        })
}
