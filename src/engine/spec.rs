use serde::{Deserialize, Deserializer};
use std::fmt;

/// Everything the engine needs to weave one fragment into a document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InsertionSpec {
    /// Lines to insert, without indentation
    #[serde(deserialize_with = "deserialize_fragment")]
    pub fragment: Vec<String>,
    /// Detects whether the fragment was already applied
    pub identity: Identity,
    /// Tried in order until one resolves
    pub anchors: Vec<AnchorStrategy>,
}

impl InsertionSpec {
    /// Build a spec from a (possibly multi-line) fragment.
    pub fn new(fragment: &str, identity: impl Into<Identity>) -> Self {
        Self {
            fragment: split_fragment(fragment),
            identity: identity.into(),
            anchors: Vec::new(),
        }
    }

    /// Append a fallback strategy.
    pub fn anchor(mut self, strategy: AnchorStrategy) -> Self {
        self.anchors.push(strategy);
        self
    }

    /// Identity derived from the fragment text itself.
    pub fn self_identified(fragment: &str) -> Self {
        Self::new(fragment, fragment.trim())
    }
}

/// Logical identity of a fragment.
///
/// Matching is plain substring containment against the whole document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Identity {
    Contains(String),
    ContainsAll(Vec<String>),
}

impl Identity {
    pub fn keys(&self) -> &[String] {
        match self {
            Identity::Contains(key) => std::slice::from_ref(key),
            Identity::ContainsAll(keys) => keys,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys().iter().all(|key| key.is_empty())
    }
}

impl From<&str> for Identity {
    fn from(key: &str) -> Self {
        Identity::Contains(key.to_string())
    }
}

impl From<String> for Identity {
    fn from(key: String) -> Self {
        Identity::Contains(key)
    }
}

impl From<Vec<String>> for Identity {
    fn from(keys: Vec<String>) -> Self {
        Identity::ContainsAll(keys)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Contains(key) => write!(f, "{key:?}"),
            Identity::ContainsAll(keys) => write!(f, "all of {keys:?}"),
        }
    }
}

/// Nesting delimiter pair used by block strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Delimiter {
    #[default]
    Brace,
    Bracket,
    Paren,
}

impl Delimiter {
    pub fn open(self) -> u8 {
        match self {
            Delimiter::Brace => b'{',
            Delimiter::Bracket => b'[',
            Delimiter::Paren => b'(',
        }
    }

    pub fn close(self) -> u8 {
        match self {
            Delimiter::Brace => b'}',
            Delimiter::Bracket => b']',
            Delimiter::Paren => b')',
        }
    }
}

/// How to find the insertion point.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AnchorStrategy {
    /// Insert after the line containing `marker`
    LiteralAfter {
        marker: String,
        /// Only search past the first occurrence of this marker
        #[serde(default)]
        from: Option<String>,
        /// Insert after the line holding the first `through` at or past the
        /// match instead, e.g. the `;` ending a multi-line statement
        #[serde(default)]
        through: Option<String>,
    },
    /// Insert before the line containing `marker`
    LiteralBefore {
        marker: String,
        #[serde(default)]
        from: Option<String>,
    },
    /// Insert after the line containing the last occurrence of `marker`
    LastLiteralAfter {
        marker: String,
        #[serde(default)]
        through: Option<String>,
    },
    /// Insert as the first line inside the block opened at or after `header`
    BlockBodyStart {
        header: String,
        #[serde(default)]
        delimiter: Delimiter,
    },
    /// Insert as the last line inside the block opened at or after `header`
    BlockBodyEnd {
        header: String,
        #[serde(default)]
        delimiter: Delimiter,
    },
    /// Append at the end of the document
    EndOfDocument,
}

impl AnchorStrategy {
    pub fn literal_after(marker: impl Into<String>) -> Self {
        AnchorStrategy::LiteralAfter {
            marker: marker.into(),
            from: None,
            through: None,
        }
    }

    pub fn literal_before(marker: impl Into<String>) -> Self {
        AnchorStrategy::LiteralBefore {
            marker: marker.into(),
            from: None,
        }
    }

    pub fn last_literal_after(marker: impl Into<String>) -> Self {
        AnchorStrategy::LastLiteralAfter {
            marker: marker.into(),
            through: None,
        }
    }

    pub fn block_body_start(header: impl Into<String>) -> Self {
        AnchorStrategy::BlockBodyStart {
            header: header.into(),
            delimiter: Delimiter::Brace,
        }
    }

    pub fn block_body_end(header: impl Into<String>) -> Self {
        AnchorStrategy::BlockBodyEnd {
            header: header.into(),
            delimiter: Delimiter::Brace,
        }
    }

    /// Restrict a literal strategy to matches past `bound`.
    ///
    /// Other strategies are returned unchanged.
    pub fn scoped_from(self, bound: impl Into<String>) -> Self {
        match self {
            AnchorStrategy::LiteralAfter { marker, through, .. } => AnchorStrategy::LiteralAfter {
                marker,
                from: Some(bound.into()),
                through,
            },
            AnchorStrategy::LiteralBefore { marker, .. } => AnchorStrategy::LiteralBefore {
                marker,
                from: Some(bound.into()),
            },
            other => other,
        }
    }

    /// Extend an after-literal strategy to the end of the statement closed
    /// by `terminator`.
    ///
    /// Other strategies are returned unchanged.
    pub fn through(self, terminator: impl Into<String>) -> Self {
        match self {
            AnchorStrategy::LiteralAfter { marker, from, .. } => AnchorStrategy::LiteralAfter {
                marker,
                from,
                through: Some(terminator.into()),
            },
            AnchorStrategy::LastLiteralAfter { marker, .. } => AnchorStrategy::LastLiteralAfter {
                marker,
                through: Some(terminator.into()),
            },
            other => other,
        }
    }

    /// Switch a block strategy to another delimiter pair.
    pub fn delimited_by(self, delimiter: Delimiter) -> Self {
        match self {
            AnchorStrategy::BlockBodyStart { header, .. } => {
                AnchorStrategy::BlockBodyStart { header, delimiter }
            }
            AnchorStrategy::BlockBodyEnd { header, .. } => {
                AnchorStrategy::BlockBodyEnd { header, delimiter }
            }
            other => other,
        }
    }

    /// The text the strategy searches for first, if any.
    pub fn primary_marker(&self) -> Option<&str> {
        match self {
            AnchorStrategy::LiteralAfter { marker, .. }
            | AnchorStrategy::LiteralBefore { marker, .. }
            | AnchorStrategy::LastLiteralAfter { marker, .. } => Some(marker),
            AnchorStrategy::BlockBodyStart { header, .. }
            | AnchorStrategy::BlockBodyEnd { header, .. } => Some(header),
            AnchorStrategy::EndOfDocument => None,
        }
    }
}

impl fmt::Display for AnchorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnchorStrategy::LiteralAfter { marker, .. } => write!(f, "after {marker:?}"),
            AnchorStrategy::LiteralBefore { marker, .. } => write!(f, "before {marker:?}"),
            AnchorStrategy::LastLiteralAfter { marker, .. } => write!(f, "after last {marker:?}"),
            AnchorStrategy::BlockBodyStart { header, .. } => {
                write!(f, "start of block {header:?}")
            }
            AnchorStrategy::BlockBodyEnd { header, .. } => write!(f, "end of block {header:?}"),
            AnchorStrategy::EndOfDocument => write!(f, "end of document"),
        }
    }
}

fn split_fragment(text: &str) -> Vec<String> {
    let text = text.strip_suffix('\n').unwrap_or(text);
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

fn deserialize_fragment<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Lines(Vec<String>),
    }

    Ok(match Repr::deserialize(deserializer)? {
        Repr::Text(text) => split_fragment(&text),
        Repr::Lines(lines) => lines,
    })
}
