use crate::engine::document::SourceDocument;
use crate::engine::spec::Identity;

/// Whether the fragment identified by `identity` is already in `document`.
///
/// Literal substring containment; for [`Identity::ContainsAll`] every key
/// must be present. A coincidental match counts as applied. An identity with
/// no non-empty key is never considered applied.
pub fn is_applied(document: &SourceDocument, identity: &Identity) -> bool {
    if identity.is_empty() {
        return false;
    }
    identity
        .keys()
        .iter()
        .filter(|key| !key.is_empty())
        .all(|key| document.text().contains(key.as_str()))
}
