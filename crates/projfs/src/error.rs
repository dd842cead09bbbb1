//! Error types for the ProjFS provider.
//!
//! Only fatal conditions surface here (startup, teardown, construction).
//! Recoverable conditions — absent paths, host call failures, enumeration
//! timeouts — never become errors; they follow the silent-retry dispositions
//! of the callback state machines.

use thiserror::Error;

/// Errors that can occur during provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A ProjFS API call failed.
    #[error("ProjFS API error in {operation}: HRESULT 0x{hresult:08X}")]
    ProjFsApi {
        /// Operation that failed.
        operation: &'static str,
        /// HRESULT error code.
        hresult: i32,
    },

    /// The virtualization root path is unusable.
    #[error("invalid virtualization root path: {0}")]
    InvalidRootPath(String),

    /// Virtualization already started.
    #[error("virtualization already started")]
    AlreadyStarted,

    /// Virtualization not started.
    #[error("virtualization not started")]
    NotStarted,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Path conversion error (UTF-16 <-> UTF-8).
    #[error("path conversion error: {0}")]
    PathConversion(String),
}
