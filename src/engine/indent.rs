use crate::engine::document::SourceDocument;

/// Indent unit used when no tab-indented line is found.
pub const DEFAULT_INDENT: &str = "    ";

/// Leading run of spaces and tabs.
pub fn leading_whitespace(line: &str) -> &str {
    let trimmed = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - trimmed.len()]
}

/// Indentation of the line at `line_index`, or `""` past the end.
pub fn infer_prefix(document: &SourceDocument, line_index: usize) -> String {
    document
        .line_text(line_index)
        .map(|line| leading_whitespace(line).to_string())
        .unwrap_or_default()
}

/// One level of indentation in the document's own style.
///
/// Decided by the first indented line: a leading tab means tabs, anything
/// else means four spaces.
pub fn indent_unit(document: &SourceDocument) -> &'static str {
    let first_indented = (0..document.line_count())
        .filter_map(|idx| document.line_text(idx))
        .find(|line| line.starts_with([' ', '\t']) && !line.trim().is_empty());

    match first_indented {
        Some(line) if line.starts_with('\t') => "\t",
        _ => DEFAULT_INDENT,
    }
}

/// Indentation of `line_index` plus one unit.
pub fn nested_prefix(document: &SourceDocument, line_index: usize) -> String {
    let mut prefix = infer_prefix(document, line_index);
    prefix.push_str(indent_unit(document));
    prefix
}

pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}
