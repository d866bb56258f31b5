use crate::engine::document::{LineEnding, SourceDocument};

/// Where and how a fragment lands in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionPoint {
    /// Byte offset of the insertion
    pub offset: usize,
    /// Whitespace put in front of every non-empty fragment line
    pub prefix: String,
    pub placement: Placement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// `offset` is the start of a line; the fragment goes in as whole lines
    /// ahead of it.
    LineStart,
    /// `offset` is the end of the text; a terminator is added first when the
    /// text does not already end with one. Leading empty fragment lines act
    /// as separators and are dropped where the text already ends in blank
    /// lines.
    EndOfText,
    /// `offset` sits inside a line. The fragment is broken out onto its own
    /// lines and the rest of the original line continues after `resume`.
    MidLine { resume: String },
}

/// Fragment lines with `prefix` applied, joined by `line_ending`.
///
/// Empty lines stay empty so no trailing whitespace is introduced.
pub fn render_fragment(fragment: &[String], prefix: &str, line_ending: LineEnding) -> String {
    fragment
        .iter()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join(line_ending.as_str())
}

/// New document with `fragment` inserted at `point`.
///
/// The document's own line terminator is used for every inserted break.
pub fn splice(
    document: &SourceDocument,
    point: &InsertionPoint,
    fragment: &[String],
) -> SourceDocument {
    let text = document.text();
    let eol = document.line_ending().as_str();
    let rendered = render_fragment(fragment, &point.prefix, document.line_ending());
    let offset = point.offset.min(text.len());

    let mut out = String::with_capacity(text.len() + rendered.len() + 2 * eol.len());
    match &point.placement {
        Placement::LineStart => {
            out.push_str(&text[..offset]);
            out.push_str(&rendered);
            out.push_str(eol);
            out.push_str(&text[offset..]);
        }
        Placement::EndOfText => {
            let separators = fragment.iter().take_while(|line| line.is_empty()).count();
            let skip = separators.min(trailing_blank_lines(text));
            let rendered = render_fragment(&fragment[skip..], &point.prefix, document.line_ending());

            out.push_str(text);
            if !text.is_empty() && !text.ends_with('\n') {
                out.push_str(eol);
            }
            out.push_str(&rendered);
            out.push_str(eol);
        }
        Placement::MidLine { resume } => {
            let (head, tail) = text.split_at(offset);
            out.push_str(head.trim_end_matches([' ', '\t']));
            out.push_str(eol);
            out.push_str(&rendered);
            out.push_str(eol);
            out.push_str(resume);
            out.push_str(tail.trim_start_matches([' ', '\t']));
        }
    }

    SourceDocument::new(out)
}

/// Number of whitespace-only lines ending a terminated text.
fn trailing_blank_lines(text: &str) -> usize {
    let Some(mut rest) = text.strip_suffix('\n') else {
        return 0;
    };
    let mut count = 0;
    while let Some(newline) = rest.rfind('\n') {
        if !rest[newline + 1..].trim().is_empty() {
            break;
        }
        count += 1;
        rest = &rest[..newline];
    }
    count
}
