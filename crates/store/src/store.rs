//! On-disk object store reader.
//!
//! Objects are raw files named by their 64-hex-digit content hash under
//! `<instance>/objects`. The store resolves virtual paths rooted at
//! `/objects` and synthesizes a small per-object subtree of derived views.
//! All I/O failures collapse to "absent" at the public boundary.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use dashmap::DashMap;
use regex::Regex;

use crate::types::{ObjectKind, ObjectMetadata};

/// Synthesized entries of a per-hash object directory, in listing order.
pub const VIRTUAL_OBJECT_FILES: [&str; 4] = ["raw.txt", "pretty.html", "json.txt", "type.txt"];

/// Top-level mountpoints. Only `objects` is backed by this store; the rest
/// are supplied by the host.
const ROOT_ENTRIES: [&str; 5] = ["objects", "chats", "debug", "invites", "types"];

/// Bytes examined for type detection.
const TYPE_DETECT_PREFIX_LEN: usize = 100;

/// Microdata type marker, e.g. `itemtype="//refin.io/Person"`.
static TYPE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"itemtype="//refin\.io/([^"]+)""#).unwrap());

/// Synchronous reader for a content-addressed instance directory.
pub struct ObjectStore {
    objects_path: PathBuf,
    /// Memoized textual type tags, keyed by hash.
    type_cache: DashMap<String, String>,
}

impl ObjectStore {
    /// Open (and if necessary lay out) an instance directory.
    ///
    /// Creates the `objects/`, `vheads/`, and `rmaps/` subdirectories when
    /// they are missing. This is the only operation that surfaces an error.
    pub fn new(instance_path: impl AsRef<Path>) -> std::io::Result<Self> {
        let instance: &Path = instance_path.as_ref();
        let objects_path: PathBuf = instance.join("objects");

        fs::create_dir_all(&objects_path)?;
        fs::create_dir_all(instance.join("vheads"))?;
        fs::create_dir_all(instance.join("rmaps"))?;

        Ok(Self {
            objects_path,
            type_cache: DashMap::new(),
        })
    }

    /// Whether a virtual path falls under the `/objects` subtree.
    pub fn is_object_path(virtual_path: &str) -> bool {
        virtual_path.starts_with("/objects/")
    }

    /// Extract the 64-hex-digit hash from `/objects/<hash>[/...]`.
    pub fn extract_hash(virtual_path: &str) -> Option<&str> {
        let rest: &str = virtual_path.strip_prefix("/objects/")?;
        let hash: &str = match rest.find('/') {
            Some(idx) => &rest[..idx],
            None => rest,
        };
        is_hash(hash).then_some(hash)
    }

    /// Read the full bytes of an object.
    pub fn read_object(&self, hash: &str) -> Option<Vec<u8>> {
        let path: PathBuf = self.objects_path.join(hash);
        match fs::read(&path) {
            Ok(data) => Some(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::debug!("object read failed for {}: {}", hash, e);
                None
            }
        }
    }

    /// List all object hashes present on disk.
    pub fn list_objects(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.objects_path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("objects directory unreadable: {}", e);
                return Vec::new();
            }
        };

        entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect()
    }

    /// List the entry names of a virtual directory.
    ///
    /// Unknown paths yield an empty listing.
    pub fn list_directory(&self, virtual_path: &str) -> Vec<String> {
        if virtual_path == "/" || virtual_path.is_empty() {
            return ROOT_ENTRIES.iter().map(|s| s.to_string()).collect();
        }

        if virtual_path == "/objects" || virtual_path == "/objects/" {
            return self.list_objects();
        }

        if let Some(rest) = virtual_path.strip_prefix("/objects/") {
            if is_hash(rest) {
                return VIRTUAL_OBJECT_FILES.iter().map(|s| s.to_string()).collect();
            }
        }

        Vec::new()
    }

    /// Textual type tag of an object, memoized per hash.
    ///
    /// Objects that cannot be read report `BLOB` without poisoning the memo,
    /// so an object appearing later is still classified correctly.
    pub fn object_type(&self, hash: &str) -> String {
        if let Some(cached) = self.type_cache.get(hash) {
            return cached.clone();
        }

        match self.read_prefix(hash) {
            Some(prefix) => {
                let tag: String = detect_type(&prefix);
                self.type_cache.insert(hash.to_string(), tag.clone());
                tag
            }
            None => ObjectKind::Blob.as_str().to_string(),
        }
    }

    /// Metadata for an object on disk.
    pub fn object_metadata(&self, hash: &str) -> ObjectMetadata {
        let path: PathBuf = self.objects_path.join(hash);
        match fs::metadata(&path) {
            Ok(meta) => {
                let kind: ObjectKind = classify(&self.object_type(hash));
                ObjectMetadata::file(meta.len(), kind)
            }
            Err(_) => ObjectMetadata::absent(),
        }
    }

    /// Metadata for any store-resolvable virtual path.
    pub fn virtual_path_metadata(&self, virtual_path: &str) -> ObjectMetadata {
        if virtual_path == "/"
            || (virtual_path.starts_with('/') && ROOT_ENTRIES.contains(&&virtual_path[1..]))
        {
            return ObjectMetadata::directory();
        }

        let Some(hash) = Self::extract_hash(virtual_path) else {
            return ObjectMetadata::absent();
        };

        let object: ObjectMetadata = self.object_metadata(hash);
        if !object.exists {
            return ObjectMetadata::absent();
        }

        let rest: &str = &virtual_path["/objects/".len() + hash.len()..];
        match rest {
            // The hash itself projects as a directory of derived views.
            "" => ObjectMetadata::directory(),
            _ => {
                let leaf: &str = &rest[1..];
                if rest.starts_with('/') && VIRTUAL_OBJECT_FILES.contains(&leaf) {
                    // Size is the raw object size for all views; reads are
                    // sliced against the actual rendered content.
                    ObjectMetadata::file(object.size, ObjectKind::File)
                } else {
                    ObjectMetadata::absent()
                }
            }
        }
    }

    /// Render the bytes served for a `/objects/<hash>/<view>` path.
    pub fn read_virtual_path(&self, virtual_path: &str) -> Option<Vec<u8>> {
        if !Self::is_object_path(virtual_path) {
            return None;
        }
        let hash: &str = Self::extract_hash(virtual_path)?;

        if virtual_path.ends_with("/raw.txt") {
            return self.read_object(hash);
        }
        if virtual_path.ends_with("/type.txt") {
            if !self.object_metadata(hash).exists {
                return None;
            }
            return Some(self.object_type(hash).into_bytes());
        }
        if virtual_path.ends_with("/pretty.html") {
            let content: Vec<u8> = self.read_object(hash)?;
            let mut rendered: Vec<u8> = b"<html><body><pre>".to_vec();
            rendered.extend_from_slice(&content);
            rendered.extend_from_slice(b"</pre></body></html>");
            return Some(rendered);
        }
        if virtual_path.ends_with("/json.txt") {
            if !self.object_metadata(hash).exists {
                return None;
            }
            let envelope = serde_json::json!({
                "hash": hash,
                "type": self.object_type(hash),
            });
            return Some(envelope.to_string().into_bytes());
        }

        None
    }

    /// First bytes of an object, for type detection.
    fn read_prefix(&self, hash: &str) -> Option<Vec<u8>> {
        let path: PathBuf = self.objects_path.join(hash);
        let file = fs::File::open(&path).ok()?;

        let mut prefix: Vec<u8> = Vec::with_capacity(TYPE_DETECT_PREFIX_LEN);
        file.take(TYPE_DETECT_PREFIX_LEN as u64)
            .read_to_end(&mut prefix)
            .ok()?;
        Some(prefix)
    }
}

/// Whether a string is a 64-character lowercase-or-uppercase hex hash.
fn is_hash(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Detect an object's textual type tag from its leading bytes.
fn detect_type(prefix: &[u8]) -> String {
    let text: std::borrow::Cow<'_, str> = String::from_utf8_lossy(prefix);

    if let Some(captures) = TYPE_PATTERN.captures(&text) {
        return captures[1].to_string();
    }

    if text.contains("<div") || text.contains("itemscope") {
        ObjectKind::Clob.as_str().to_string()
    } else {
        ObjectKind::Blob.as_str().to_string()
    }
}

/// Map a textual type tag onto the coarse kind enum.
///
/// Custom microdata types are character data and classify as CLOB.
fn classify(tag: &str) -> ObjectKind {
    match tag {
        "BLOB" => ObjectKind::Blob,
        _ => ObjectKind::Clob,
    }
}
