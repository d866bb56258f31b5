use std::fmt;

/// Line terminator convention of a document.
///
/// Detected from the first terminator in the text; documents without any
/// terminator default to `\n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn detect(text: &str) -> Self {
        match text.find('\n') {
            Some(idx) if idx > 0 && text.as_bytes()[idx - 1] == b'\r' => LineEnding::CrLf,
            _ => LineEnding::Lf,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Byte offsets of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    /// Offset of the first byte of the line
    pub start: usize,
    /// Offset just past the line content, excluding its terminator
    pub end: usize,
    /// Offset of the first byte of the following line (or text length)
    pub next: usize,
}

impl Line {
    pub fn has_terminator(&self) -> bool {
        self.next > self.end
    }
}

/// Immutable view of a file's text with a derived line index.
///
/// The line ranges `start..next` tile the text exactly, so the original
/// text can always be rebuilt from the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    text: String,
    lines: Vec<Line>,
    line_ending: LineEnding,
}

impl SourceDocument {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let lines = index_lines(&text);
        let line_ending = LineEnding::detect(&text);
        Self {
            text,
            lines,
            line_ending,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Line metadata by index.
    pub fn line(&self, index: usize) -> Option<Line> {
        self.lines.get(index).copied()
    }

    /// Content of the line at `index`, without its terminator.
    pub fn line_text(&self, index: usize) -> Option<&str> {
        self.lines
            .get(index)
            .map(|line| &self.text[line.start..line.end])
    }

    /// Index of the line containing byte `offset`.
    ///
    /// Offsets pointing at a terminator belong to the line it ends. An offset
    /// equal to the text length maps to the last line.
    pub fn line_index_at(&self, offset: usize) -> Option<usize> {
        if self.lines.is_empty() || offset > self.text.len() {
            return None;
        }
        let idx = self.lines.partition_point(|line| line.next <= offset);
        Some(idx.min(self.lines.len() - 1))
    }

    pub fn ends_with_terminator(&self) -> bool {
        self.text.ends_with('\n')
    }
}

impl fmt::Display for SourceDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<String> for SourceDocument {
    fn from(text: String) -> Self {
        SourceDocument::new(text)
    }
}

impl From<&str> for SourceDocument {
    fn from(text: &str) -> Self {
        SourceDocument::new(text)
    }
}

fn index_lines(text: &str) -> Vec<Line> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;

    while start < bytes.len() {
        match bytes[start..].iter().position(|&b| b == b'\n') {
            Some(rel) => {
                let newline = start + rel;
                let end = if newline > start && bytes[newline - 1] == b'\r' {
                    newline - 1
                } else {
                    newline
                };
                lines.push(Line {
                    start,
                    end,
                    next: newline + 1,
                });
                start = newline + 1;
            }
            None => {
                lines.push(Line {
                    start,
                    end: bytes.len(),
                    next: bytes.len(),
                });
                start = bytes.len();
            }
        }
    }

    lines
}
