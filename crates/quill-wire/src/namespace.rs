//! Namespace helpers. A full namespace is `{root}.{collection}`.

/// Join a database root and a collection name.
pub fn full_name(root: &str, collection: &str) -> String {
    format!("{root}.{collection}")
}

/// Strip the root prefix from a full namespace.
///
/// Names outside the root come back unchanged.
pub fn strip_root<'a>(root: &str, full: &'a str) -> &'a str {
    match full.strip_prefix(root).and_then(|rest| rest.strip_prefix('.')) {
        Some(local) => local,
        None => full,
    }
}
