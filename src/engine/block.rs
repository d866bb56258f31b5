//! Delimiter balance scanning.
//!
//! Matching is lexical: delimiters inside string literals and comments are
//! counted like any other. Callers pick headers whose blocks do not contain
//! unbalanced delimiters in literals.

use crate::engine::document::SourceDocument;
use crate::engine::spec::Delimiter;

/// Offset of the next opening `delimiter` at or after `from`.
pub fn find_open(document: &SourceDocument, from: usize, delimiter: Delimiter) -> Option<usize> {
    let bytes = document.text().as_bytes();
    let tail = bytes.get(from..)?;
    tail.iter()
        .position(|&b| b == delimiter.open())
        .map(|idx| from + idx)
}

/// Offset of the delimiter closing the block opened at `open`.
///
/// Returns `None` when `open` does not point at an opening delimiter or the
/// text ends before the depth returns to zero.
pub fn find_matching_close(
    document: &SourceDocument,
    open: usize,
    delimiter: Delimiter,
) -> Option<usize> {
    let bytes = document.text().as_bytes();
    if bytes.get(open) != Some(&delimiter.open()) {
        return None;
    }

    let mut depth = 0usize;
    for (idx, &b) in bytes.iter().enumerate().skip(open) {
        if b == delimiter.open() {
            depth += 1;
        } else if b == delimiter.close() {
            depth -= 1;
            if depth == 0 {
                return Some(idx);
            }
        }
    }
    None
}

/// Opening and closing offsets of the first block opened at or after `from`.
pub fn find_block(
    document: &SourceDocument,
    from: usize,
    delimiter: Delimiter,
) -> Option<(usize, usize)> {
    let open = find_open(document, from, delimiter)?;
    let close = find_matching_close(document, open, delimiter)?;
    Some((open, close))
}
