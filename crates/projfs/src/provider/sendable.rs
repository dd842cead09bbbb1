//! Sendable wrapper for the ProjFS virtualization context.
//!
//! `PrjWriteFileData` and `PrjCompleteCommand` are documented as callable
//! from any thread, so the context handle may be carried inside parked
//! requests and completed from host threads.

use windows::Win32::Storage::ProjectedFileSystem::PRJ_NAMESPACE_VIRTUALIZATION_CONTEXT;

/// ProjFS context handle that is Send + Sync.
///
/// # Safety
/// The handle stays valid for the lifetime of virtualization; `stop`
/// drains nothing, so callers must not complete commands after it.
#[derive(Clone, Copy, Debug)]
pub struct SendableContext(PRJ_NAMESPACE_VIRTUALIZATION_CONTEXT);

unsafe impl Send for SendableContext {}
unsafe impl Sync for SendableContext {}

impl SendableContext {
    pub fn new(context: PRJ_NAMESPACE_VIRTUALIZATION_CONTEXT) -> Self {
        Self(context)
    }

    /// A null context, for requests constructed outside a live callback.
    pub fn null() -> Self {
        Self(PRJ_NAMESPACE_VIRTUALIZATION_CONTEXT::default())
    }

    pub fn inner(&self) -> PRJ_NAMESPACE_VIRTUALIZATION_CONTEXT {
        self.0
    }
}
