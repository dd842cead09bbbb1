//! Synchronous reader for the casfs content-addressed object store.
//!
//! An instance directory holds raw objects under `objects/` named by their
//! content hash, plus the `vheads/` and `rmaps/` bookkeeping directories.
//! This crate resolves virtual `/objects/...` paths to bytes and metadata
//! and synthesizes the derived per-object views (`raw.txt`, `pretty.html`,
//! `json.txt`, `type.txt`).
//!
//! The reader is deliberately infallible past construction: any I/O failure
//! reads as "absent" so that filesystem callbacks never see an error from
//! this layer.

mod store;
mod types;

pub use store::{ObjectStore, VIRTUAL_OBJECT_FILES};
pub use types::{ObjectKind, ObjectMetadata};
