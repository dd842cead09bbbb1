//! Data model exchanged with the host and held in the cache.

use serde::{Deserialize, Serialize};

/// Metadata for one projected file or directory.
///
/// Host-supplied records may omit any field; missing fields default to
/// empty/zero/false.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileInfo {
    /// Entry name (no path separators).
    pub name: String,
    /// Content hash, possibly empty.
    pub hash: String,
    /// Size in bytes.
    pub size: u64,
    /// Whether the entry is a directory.
    pub is_directory: bool,
    /// Host-authored hint that the content is directly readable from the
    /// object store. Advisory only; dispatch is by path prefix.
    pub is_blob_or_clob: bool,
    /// Unix-style mode bits.
    pub mode: u32,
}

impl FileInfo {
    /// Build info for a file entry.
    pub fn file(name: impl Into<String>, hash: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            hash: hash.into(),
            size,
            ..Default::default()
        }
    }

    /// Build info for a directory entry. Directories synthesized by the
    /// engine always report size 0.
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: true,
            ..Default::default()
        }
    }
}

/// An ordered directory listing. Order is the host's order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    pub entries: Vec<FileInfo>,
}

impl DirectoryListing {
    /// Build a listing, dropping duplicate names (first occurrence wins).
    pub fn new(entries: Vec<FileInfo>) -> Self {
        let mut seen: std::collections::HashSet<String> = std::collections::HashSet::new();
        let entries: Vec<FileInfo> = entries
            .into_iter()
            .filter(|e| seen.insert(e.name.clone()))
            .collect();
        Self { entries }
    }

    /// Find an entry by name.
    pub fn find(&self, name: &str) -> Option<&FileInfo> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// Cached file content plus an optional content hash.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileContent {
    pub data: Vec<u8>,
    pub hash: Option<String>,
}

impl FileContent {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, hash: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_info_defaults_from_partial_json() {
        let info: FileInfo = serde_json::from_str(r#"{"name":"chats","isDirectory":true}"#).unwrap();
        assert_eq!(info.name, "chats");
        assert!(info.is_directory);
        assert_eq!(info.size, 0);
        assert_eq!(info.hash, "");
        assert!(!info.is_blob_or_clob);
        assert_eq!(info.mode, 0);
    }

    #[test]
    fn test_listing_drops_duplicate_names() {
        let listing: DirectoryListing = DirectoryListing::new(vec![
            FileInfo::file("a.txt", "h1", 1),
            FileInfo::file("b.txt", "h2", 2),
            FileInfo::file("a.txt", "h3", 3),
        ]);

        assert_eq!(listing.entries.len(), 2);
        assert_eq!(listing.find("a.txt").unwrap().hash, "h1");
    }

    #[test]
    fn test_listing_preserves_order() {
        let listing: DirectoryListing = DirectoryListing::new(vec![
            FileInfo::file("zebra", "", 0),
            FileInfo::directory("apple"),
        ]);

        let names: Vec<&str> = listing.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["zebra", "apple"]);
    }
}
