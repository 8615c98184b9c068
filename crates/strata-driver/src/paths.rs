//! Virtual-path handling for the flat namespace.
//!
//! Resolution is an identity mapping: every virtual path is the name of an
//! object in the single root bucket. The only structure in the namespace
//! comes from naming conventions -- shard objects live at `<path>/<index>`,
//! and directory semantics fall out of prefix matching over object names.

/// The namespace root. The only path allowed to end with a slash.
pub const ROOT: &str = "/";

/// Name of the sentinel object written at driver startup so existence
/// checks on the root namespace succeed before any content exists.
pub(crate) const ROOT_SENTINEL: &str = ".";

/// Returns `true` for paths this driver accepts: the root, or an absolute
/// path with non-empty segments and no trailing slash.
pub(crate) fn is_valid(path: &str) -> bool {
    if path == ROOT {
        return true;
    }
    path.starts_with('/') && !path.ends_with('/') && !path.contains("//")
}

/// Backing name of shard `index` of the logical file at `path`.
pub(crate) fn shard_name(path: &str, index: u64) -> String {
    format!("{path}/{index}")
}

/// If `name` lies under `parent`, return the direct child of `parent` on
/// the way to `name` (as a full path). `None` otherwise, and `None` for
/// `parent` itself.
pub(crate) fn child_of<'a>(parent: &str, name: &'a str) -> Option<&'a str> {
    let rest = if parent == ROOT {
        name.strip_prefix('/')?
    } else {
        name.strip_prefix(parent)?.strip_prefix('/')?
    };
    if rest.is_empty() {
        return None;
    }
    match rest.find('/') {
        Some(i) => Some(&name[..name.len() - rest.len() + i]),
        None => Some(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_valid() {
        assert!(is_valid(ROOT));
    }

    #[test]
    fn ordinary_paths() {
        assert!(is_valid("/a"));
        assert!(is_valid("/docker/registry/v2/blobs/sha256"));
    }

    #[test]
    fn rejected_paths() {
        assert!(!is_valid(""));
        assert!(!is_valid("relative/path"));
        assert!(!is_valid("/trailing/"));
        assert!(!is_valid("/double//slash"));
    }

    #[test]
    fn shard_names_are_path_slash_index() {
        assert_eq!(shard_name("/a/b", 0), "/a/b/0");
        assert_eq!(shard_name("/a/b", 12), "/a/b/12");
    }

    #[test]
    fn child_of_direct_child() {
        assert_eq!(child_of("/a", "/a/b"), Some("/a/b"));
    }

    #[test]
    fn child_of_deep_descendant_truncates() {
        assert_eq!(child_of("/a", "/a/b/c/d"), Some("/a/b"));
    }

    #[test]
    fn child_of_root() {
        assert_eq!(child_of(ROOT, "/top/nested"), Some("/top"));
        assert_eq!(child_of(ROOT, "/top"), Some("/top"));
    }

    #[test]
    fn child_of_unrelated_or_self() {
        assert_eq!(child_of("/a", "/ab/c"), None);
        assert_eq!(child_of("/a", "/b/c"), None);
        assert_eq!(child_of("/a", "/a"), None);
    }

    #[test]
    fn sentinel_is_not_a_child_of_root() {
        assert_eq!(child_of(ROOT, ROOT_SENTINEL), None);
    }
}
