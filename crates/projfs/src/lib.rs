//! Windows ProjFS provider projecting a content-addressed object store.
//!
//! A host application registers asynchronous callbacks for metadata,
//! directory listings, and file contents; this crate translates ProjFS
//! kernel callbacks into those host calls, caches the results, and serves
//! them back to the operating system. The `/objects` subtree is answered
//! synchronously from the on-disk store; everything else flows through the
//! cache and the host bridge. The projection is read-only: every mutating
//! operation is denied at the notification boundary.
//!
//! # Architecture
//!
//! ```text
//! ProjFS kernel -> callbacks (Windows glue) -> ProjfsProvider engine
//!                                                |-- ContentCache (TTL)
//!                                                |-- ObjectStore (/objects)
//!                                                |-- EnumerationTable
//!                                                `-- HostBridge -> host callbacks
//! ```
//!
//! The engine and all of its state machines are platform-neutral; only the
//! thin callback and lifecycle layers touch ProjFS handles, so the crate
//! builds and tests everywhere while virtualization itself requires
//! Windows.

mod bridge;
mod cache;
mod enumeration;
mod error;
mod notification;
mod options;
mod path;
mod pending;
mod provider;
mod stats;
mod types;
mod util;

pub use bridge::{HostBridge, HostCallbacks};
pub use cache::{CacheStats, ContentCache, MAX_CACHED_CONTENT_BYTES};
pub use enumeration::{EnumerationId, EnumerationState, EnumerationTable, MAX_CALLS_PER_ENUM};
pub use error::ProviderError;
pub use notification::{notification_response, NotificationKind, NotificationResponse};
pub use options::ProviderOptions;
pub use path::{canonical_virtual_path, split_parent_leaf, to_windows_relative};
pub use pending::{
    completion_outcome, CommandId, Completion, PendingFileRequest, PendingRequestTable,
};
pub use provider::{metadata_from_info, DirEntrySink, FillResult, ProjfsProvider, ReadOutcome};
pub use stats::{ProviderStats, StatsSnapshot};
pub use types::{DirectoryListing, FileContent, FileInfo};

#[cfg(windows)]
pub use provider::SendableContext;

// Store types appear throughout the provider surface; re-export them so
// hosts depend on one crate.
pub use casfs_store::{ObjectKind, ObjectMetadata, ObjectStore};
