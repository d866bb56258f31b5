//! Literal anchor search.
//!
//! All searches are plain substring scans over the document text. They
//! return byte offsets of the match start and never panic: a lower bound
//! past the end of the text, a bound that is not a char boundary, or an
//! empty marker all yield `None`.

use crate::engine::document::SourceDocument;
use std::ops::Range;

/// First occurrence of `marker` at or after byte offset `from`.
pub fn locate(document: &SourceDocument, marker: &str, from: usize) -> Option<usize> {
    if marker.is_empty() {
        return None;
    }
    let haystack = document.text().get(from..)?;
    haystack.find(marker).map(|idx| from + idx)
}

/// Last occurrence of `marker` in the document.
pub fn locate_last(document: &SourceDocument, marker: &str) -> Option<usize> {
    if marker.is_empty() {
        return None;
    }
    document.text().rfind(marker)
}

/// First occurrence of `marker` past the first occurrence of `bound`.
///
/// With no bound this is a search from the start of the document. When the
/// bound itself is missing, nothing is found.
pub fn locate_after(
    document: &SourceDocument,
    marker: &str,
    bound: Option<&str>,
) -> Option<usize> {
    let from = match bound {
        Some(bound) => locate(document, bound, 0)? + bound.len(),
        None => 0,
    };
    locate(document, marker, from)
}

/// Line indices covered by a match, ignoring line terminators at its edges.
///
/// A marker such as `"\nuse "` starts on the terminator of the previous line;
/// the line that "contains" it is the one holding its visible text.
pub fn matched_lines(document: &SourceDocument, span: Range<usize>) -> Option<(usize, usize)> {
    let bytes = document.text().as_bytes();
    let mut start = span.start;
    let mut end = span.end;
    while start < end && matches!(bytes[start], b'\n' | b'\r') {
        start += 1;
    }
    while end > start && matches!(bytes[end - 1], b'\n' | b'\r') {
        end -= 1;
    }
    if start == end {
        // marker made only of terminators
        let line = document.line_index_at(span.start)?;
        return Some((line, line));
    }
    Some((
        document.line_index_at(start)?,
        document.line_index_at(end - 1)?,
    ))
}
