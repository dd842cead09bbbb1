//! Virtual path canonicalization.
//!
//! ProjFS hands callbacks Windows-style relative paths (`dir\file.txt`);
//! everything exchanged with the cache, the object store, and the host uses
//! the canonical form: forward slashes with a leading `/`. The empty
//! relative path is the root `/`.

/// Canonicalize a ProjFS relative path or a host-supplied path.
pub fn canonical_virtual_path(path: &str) -> String {
    let normalized: String = path.replace('\\', "/");
    if normalized.is_empty() {
        return "/".to_string();
    }
    if normalized.starts_with('/') {
        normalized
    } else {
        format!("/{}", normalized)
    }
}

/// Convert a canonical virtual path back into a Windows-style relative path.
pub fn to_windows_relative(virtual_path: &str) -> String {
    virtual_path.trim_start_matches('/').replace('/', "\\")
}

/// Split a canonical virtual path into parent and leaf.
///
/// Returns `None` for the root.
pub fn split_parent_leaf(virtual_path: &str) -> Option<(&str, &str)> {
    if virtual_path == "/" {
        return None;
    }
    let idx: usize = virtual_path.rfind('/')?;
    let parent: &str = if idx == 0 { "/" } else { &virtual_path[..idx] };
    Some((parent, &virtual_path[idx + 1..]))
}

/// Whether a canonical path names a direct child of the root.
pub fn is_single_segment(virtual_path: &str) -> bool {
    virtual_path.len() > 1
        && virtual_path.starts_with('/')
        && !virtual_path[1..].contains('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_windows_relative() {
        assert_eq!(canonical_virtual_path(""), "/");
        assert_eq!(canonical_virtual_path("chats"), "/chats");
        assert_eq!(canonical_virtual_path("chats\\msg1"), "/chats/msg1");
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        assert_eq!(canonical_virtual_path("/chats/msg1"), "/chats/msg1");
        assert_eq!(canonical_virtual_path("/"), "/");
    }

    #[test]
    fn test_to_windows_relative() {
        assert_eq!(to_windows_relative("/chats/msg1"), "chats\\msg1");
        assert_eq!(to_windows_relative("/chats"), "chats");
        assert_eq!(to_windows_relative("/"), "");
    }

    #[test]
    fn test_split_parent_leaf() {
        assert_eq!(split_parent_leaf("/chats/msg1"), Some(("/chats", "msg1")));
        assert_eq!(split_parent_leaf("/chats"), Some(("/", "chats")));
        assert_eq!(split_parent_leaf("/a/b/c"), Some(("/a/b", "c")));
        assert_eq!(split_parent_leaf("/"), None);
    }

    #[test]
    fn test_is_single_segment() {
        assert!(is_single_segment("/chats"));
        assert!(!is_single_segment("/"));
        assert!(!is_single_segment("/chats/msg1"));
    }
}
