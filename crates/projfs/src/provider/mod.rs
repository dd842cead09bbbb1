//! The provider: engine state machines plus the Windows callback and
//! lifecycle glue.
//!
//! `engine` is platform-neutral and carries the behavior; the remaining
//! modules exist only on Windows and translate between ProjFS handles and
//! the engine's types.

mod engine;

#[cfg(windows)]
mod callbacks;
#[cfg(windows)]
mod sendable;
#[cfg(windows)]
mod virtualize;

pub use engine::{metadata_from_info, DirEntrySink, FillResult, ProjfsProvider, ReadOutcome};

#[cfg(windows)]
pub use sendable::SendableContext;
