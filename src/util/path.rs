//! Slash-delimited node paths.
//!
//! Paths are relative to the archive root (`camera/color/0`). The root is
//! the empty path. Leading, trailing and repeated separators carry no
//! meaning, so `"/camera//color/"` and `"camera/color"` name the same group.

/// Path separator.
pub const SEPARATOR: char = '/';

/// Split a path into its non-empty components.
pub fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR).filter(|c| !c.is_empty())
}

/// Canonical form of a path: components joined by a single separator,
/// no leading or trailing separator.
pub fn normalize(path: &str) -> String {
    components(path).collect::<Vec<_>>().join("/")
}

/// Join a child key onto a parent path.
pub fn join(parent: &str, key: &str) -> String {
    let parent = normalize(parent);
    let key = normalize(key);
    match (parent.is_empty(), key.is_empty()) {
        (true, _) => key,
        (_, true) => parent,
        _ => format!("{parent}/{key}"),
    }
}

/// Group display form: canonical path with a trailing separator.
pub fn as_group(path: &str) -> String {
    let mut p = normalize(path);
    p.push(SEPARATOR);
    p
}

/// Last component of a path (empty for the root).
pub fn basename(path: &str) -> &str {
    components(path).last().unwrap_or("")
}
