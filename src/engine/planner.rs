//! Insertion planning: turns an [`InsertionSpec`] into a single insertion
//! point by walking its anchor strategies in order.

use crate::engine::anchor::{locate, locate_after, locate_last, matched_lines};
use crate::engine::block::find_block;
use crate::engine::document::SourceDocument;
use crate::engine::guard::is_applied;
use crate::engine::indent::{infer_prefix, is_blank, nested_prefix};
use crate::engine::splice::{InsertionPoint, Placement};
use crate::engine::spec::{AnchorStrategy, Delimiter, InsertionSpec};

/// Result of planning one spec against one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// The identity key is already in the document
    AlreadyPresent,
    /// No strategy resolved
    AnchorNotFound,
    /// Strategy at index `strategy` resolved to `point`
    Insert { strategy: usize, point: InsertionPoint },
}

/// Plan `spec` against `document`.
///
/// Strategies are tried strictly in the order given; the first one that
/// resolves wins and the rest are not consulted.
pub fn plan(document: &SourceDocument, spec: &InsertionSpec) -> Plan {
    if is_applied(document, &spec.identity) {
        return Plan::AlreadyPresent;
    }

    spec.anchors
        .iter()
        .enumerate()
        .find_map(|(idx, strategy)| {
            resolve(document, strategy).map(|point| Plan::Insert {
                strategy: idx,
                point,
            })
        })
        .unwrap_or(Plan::AnchorNotFound)
}

/// Resolve a single strategy, or `None` when its anchors are missing.
pub fn resolve(document: &SourceDocument, strategy: &AnchorStrategy) -> Option<InsertionPoint> {
    match strategy {
        AnchorStrategy::LiteralAfter {
            marker,
            from,
            through,
        } => {
            let start = locate_after(document, marker, from.as_deref())?;
            after_match(document, start, marker, through.as_deref())
        }
        AnchorStrategy::LastLiteralAfter { marker, through } => {
            let start = locate_last(document, marker)?;
            after_match(document, start, marker, through.as_deref())
        }
        AnchorStrategy::LiteralBefore { marker, from } => {
            let start = locate_after(document, marker, from.as_deref())?;
            let (first, _) = matched_lines(document, start..start + marker.len())?;
            let line = document.line(first)?;
            Some(InsertionPoint {
                offset: line.start,
                prefix: infer_prefix(document, first),
                placement: Placement::LineStart,
            })
        }
        AnchorStrategy::BlockBodyStart { header, delimiter } => {
            let block = Block::locate(document, header, *delimiter)?;
            Some(block.body_start(document, *delimiter))
        }
        AnchorStrategy::BlockBodyEnd { header, delimiter } => {
            let block = Block::locate(document, header, *delimiter)?;
            Some(block.body_end(document))
        }
        AnchorStrategy::EndOfDocument => Some(InsertionPoint {
            offset: document.len(),
            prefix: String::new(),
            placement: Placement::EndOfText,
        }),
    }
}

/// Point after the line ending the match at `start`, or after the line
/// holding the first `through` at or past it.
fn after_match(
    document: &SourceDocument,
    start: usize,
    marker: &str,
    through: Option<&str>,
) -> Option<InsertionPoint> {
    let span = match through {
        Some(terminator) => {
            let at = locate(document, terminator, start)?;
            at..at + terminator.len()
        }
        None => start..start + marker.len(),
    };
    let (_, last) = matched_lines(document, span)?;
    after_line(document, last)
}

fn after_line(document: &SourceDocument, index: usize) -> Option<InsertionPoint> {
    let line = document.line(index)?;
    let prefix = infer_prefix(document, index);
    Some(if line.has_terminator() {
        InsertionPoint {
            offset: line.next,
            prefix,
            placement: Placement::LineStart,
        }
    } else {
        InsertionPoint {
            offset: document.len(),
            prefix,
            placement: Placement::EndOfText,
        }
    })
}

/// A balanced block located from a header marker.
struct Block {
    open: usize,
    close: usize,
    open_line: usize,
    close_line: usize,
}

impl Block {
    /// The opening delimiter is searched from the start of the header match,
    /// so headers may end with the delimiter themselves.
    fn locate(document: &SourceDocument, header: &str, delimiter: Delimiter) -> Option<Self> {
        let header_at = locate(document, header, 0)?;
        let (open, close) = find_block(document, header_at, delimiter)?;
        Some(Self {
            open,
            close,
            open_line: document.line_index_at(open)?,
            close_line: document.line_index_at(close)?,
        })
    }

    /// Lines strictly between the opening and closing lines.
    fn body_lines(&self) -> std::ops::Range<usize> {
        (self.open_line + 1)..self.close_line.max(self.open_line + 1)
    }

    fn body_start(&self, document: &SourceDocument, delimiter: Delimiter) -> InsertionPoint {
        let text = document.text();
        let open_line = document.lines()[self.open_line];
        let rest = &text[self.open + 1..open_line.end];

        if is_blank(rest) && self.close_line > self.open_line {
            let first_body = self
                .body_lines()
                .find(|&idx| document.line_text(idx).is_some_and(|l| !is_blank(l)));
            let prefix = match first_body {
                Some(idx) => infer_prefix(document, idx),
                None if !is_blank(self.before_close(document)) => {
                    infer_prefix(document, self.close_line)
                }
                None => nested_prefix(document, self.open_line),
            };
            return InsertionPoint {
                offset: open_line.next,
                prefix,
                placement: Placement::LineStart,
            };
        }

        let prefix = nested_prefix(document, self.open_line);
        let empty_inline = rest.trim_start().as_bytes().first() == Some(&delimiter.close());
        let resume = if empty_inline {
            infer_prefix(document, self.open_line)
        } else {
            prefix.clone()
        };
        InsertionPoint {
            offset: self.open + 1,
            prefix,
            placement: Placement::MidLine { resume },
        }
    }

    fn body_end(&self, document: &SourceDocument) -> InsertionPoint {
        let close_line = document.lines()[self.close_line];

        if is_blank(self.before_close(document)) && self.close_line > self.open_line {
            let last_body = self
                .body_lines()
                .rev()
                .find(|&idx| document.line_text(idx).is_some_and(|l| !is_blank(l)));
            let prefix = match last_body {
                Some(idx) => infer_prefix(document, idx),
                None => nested_prefix(document, self.close_line),
            };
            return InsertionPoint {
                offset: close_line.start,
                prefix,
                placement: Placement::LineStart,
            };
        }

        let (prefix, resume) = if self.close_line == self.open_line {
            (
                nested_prefix(document, self.open_line),
                infer_prefix(document, self.open_line),
            )
        } else {
            (
                infer_prefix(document, self.close_line),
                infer_prefix(document, self.open_line),
            )
        };
        InsertionPoint {
            offset: self.close,
            prefix,
            placement: Placement::MidLine { resume },
        }
    }

    /// Text on the closing line ahead of the closing delimiter.
    fn before_close<'a>(&self, document: &'a SourceDocument) -> &'a str {
        let line = document.lines()[self.close_line];
        let start = if self.close_line == self.open_line {
            self.open + 1
        } else {
            line.start
        };
        &document.text()[start..self.close]
    }
}
