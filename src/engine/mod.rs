//! The pure patching engine.
//!
//! Nothing in this module touches the filesystem: a [`SourceDocument`] and an
//! [`InsertionSpec`] go in, an [`InsertionOutcome`] comes out.

pub mod anchor;
pub mod block;
pub mod document;
pub mod guard;
pub mod indent;
pub mod planner;
pub mod splice;
pub mod spec;

pub use document::{Line, LineEnding, SourceDocument};
pub use planner::{plan, Plan};
pub use splice::{splice, InsertionPoint, Placement};
pub use spec::{AnchorStrategy, Delimiter, Identity, InsertionSpec};

/// Result of weaving one spec into one document.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "InsertionOutcome should be checked for applied/already-present/not-found"]
pub enum InsertionOutcome {
    /// The fragment was inserted; carries the complete new text
    Applied(String),
    /// The identity key was already present; nothing changed
    AlreadyPresent,
    /// No anchor strategy resolved; nothing changed
    AnchorNotFound,
}

impl InsertionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, InsertionOutcome::Applied(_))
    }

    /// The resulting text: new text when applied, `original` otherwise.
    pub fn text_or<'a>(&'a self, original: &'a str) -> &'a str {
        match self {
            InsertionOutcome::Applied(text) => text,
            _ => original,
        }
    }
}

/// Weave `spec` into `document`.
pub fn apply(document: &SourceDocument, spec: &InsertionSpec) -> InsertionOutcome {
    realize(document, spec, plan(document, spec))
}

/// Carry out a plan previously computed for `document` and `spec`.
pub fn realize(document: &SourceDocument, spec: &InsertionSpec, plan: Plan) -> InsertionOutcome {
    match plan {
        Plan::AlreadyPresent => InsertionOutcome::AlreadyPresent,
        Plan::AnchorNotFound => InsertionOutcome::AnchorNotFound,
        Plan::Insert { point, .. } => {
            InsertionOutcome::Applied(splice(document, &point, &spec.fragment).into_text())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_spec() -> InsertionSpec {
        InsertionSpec::new("doThing();", "doThing();")
            .anchor(AnchorStrategy::block_body_end("function run()"))
    }

    #[test]
    fn test_applied_then_already_present() {
        let doc = SourceDocument::new("function run() {\n}\n");
        let first = apply(&doc, &run_spec());
        assert_eq!(
            first,
            InsertionOutcome::Applied("function run() {\n    doThing();\n}\n".to_string())
        );

        let patched = SourceDocument::new(first.text_or(doc.text()));
        assert_eq!(apply(&patched, &run_spec()), InsertionOutcome::AlreadyPresent);
    }

    #[test]
    fn test_missing_header_is_not_found() {
        let doc = SourceDocument::new("function walk() {\n}\n");
        let outcome = apply(&doc, &run_spec());
        assert_eq!(outcome, InsertionOutcome::AnchorNotFound);
        assert_eq!(outcome.text_or(doc.text()), doc.text());
    }
}
