//! Virtualization lifecycle: start, stop, tombstone invalidation, and
//! out-of-band command completion.

use std::ffi::c_void;
use std::path::Path;
use std::sync::atomic::Ordering;

use windows::core::{GUID, HRESULT, PCWSTR};
use windows::Win32::Foundation::{ERROR_FILE_NOT_FOUND, ERROR_REPARSE_POINT_ENCOUNTERED, S_OK};
use windows::Win32::Storage::ProjectedFileSystem::{
    PrjCompleteCommand, PrjDeleteFile, PrjMarkDirectoryAsPlaceholder, PrjStartVirtualizing,
    PrjStopVirtualizing, PRJ_CALLBACKS, PRJ_NAMESPACE_VIRTUALIZATION_CONTEXT,
    PRJ_NOTIFICATION_MAPPING, PRJ_NOTIFY_FILE_HANDLE_CLOSED_FILE_DELETED,
    PRJ_NOTIFY_FILE_HANDLE_CLOSED_FILE_MODIFIED, PRJ_NOTIFY_FILE_OVERWRITTEN,
    PRJ_NOTIFY_FILE_RENAMED, PRJ_NOTIFY_HARDLINK_CREATED, PRJ_NOTIFY_NEW_FILE_CREATED,
    PRJ_NOTIFY_PRE_DELETE, PRJ_NOTIFY_PRE_RENAME, PRJ_NOTIFY_PRE_SET_HARDLINK, PRJ_NOTIFY_TYPES,
    PRJ_STARTVIRTUALIZING_FLAGS, PRJ_STARTVIRTUALIZING_OPTIONS, PRJ_UPDATE_ALLOW_DIRTY_METADATA,
    PRJ_UPDATE_ALLOW_TOMBSTONE,
};

use crate::error::ProviderError;
use crate::path::{canonical_virtual_path, to_windows_relative};
use crate::pending::{CommandId, PendingFileRequest};
use crate::provider::callbacks::{build_callbacks, write_file_data_aligned};
use crate::provider::engine::ProjfsProvider;
use crate::provider::sendable::SendableContext;
use crate::util::wstr::string_to_wide;

impl ProjfsProvider {
    /// Start projecting into `virtual_root`.
    ///
    /// Ensures the root exists, clears stale virtualization markers left
    /// by a crashed predecessor, marks the root as a placeholder under a
    /// freshly generated instance identifier, registers callbacks and the
    /// write-interception notification mapping, and starts the host
    /// bridge's drain worker. Any failure tears the bridge down and
    /// surfaces the originating status.
    ///
    /// ProjFS keeps the provider's address as its instance context, so the
    /// instance must stay pinned (not moved or dropped) until `stop`.
    pub fn start(&self, virtual_root: impl AsRef<Path>) -> Result<(), ProviderError> {
        if self.is_running() {
            return Err(ProviderError::AlreadyStarted);
        }

        let result: Result<(), ProviderError> = self.start_inner(virtual_root.as_ref());
        if result.is_err() {
            self.bridge.stop();
        }
        result
    }

    fn start_inner(&self, root: &Path) -> Result<(), ProviderError> {
        std::fs::create_dir_all(root)?;

        // A crashed predecessor leaves the root marked with its own
        // instance identifier; Windows then ignores our callbacks. Delete
        // the marker so the fresh identifier takes.
        let projfs_dir = root.join(".projfs");
        let _ = std::fs::remove_file(projfs_dir.join("placeholder"));
        let _ = std::fs::remove_dir(&projfs_dir);

        let root_str: &str = root
            .to_str()
            .ok_or_else(|| ProviderError::InvalidRootPath(root.display().to_string()))?;
        let root_wide: Vec<u16> = string_to_wide(root_str);

        let instance_id: GUID = GUID::new().map_err(|e| ProviderError::ProjFsApi {
            operation: "CoCreateGuid",
            hresult: e.code().0,
        })?;

        unsafe {
            if let Err(e) = PrjMarkDirectoryAsPlaceholder(
                PCWSTR::from_raw(root_wide.as_ptr()),
                PCWSTR::null(),
                None,
                &instance_id,
            ) {
                // An existing reparse point means the root was already a
                // virtualization root; the fresh identifier still applies.
                if e.code() != HRESULT::from(ERROR_REPARSE_POINT_ENCOUNTERED) {
                    return Err(ProviderError::ProjFsApi {
                        operation: "PrjMarkDirectoryAsPlaceholder",
                        hresult: e.code().0,
                    });
                }
            }
        }

        let callbacks: PRJ_CALLBACKS = build_callbacks();

        // Intercept every mutating operation under the whole root; the
        // notification callback denies them.
        let notification_bits: u32 = PRJ_NOTIFY_NEW_FILE_CREATED.0
            | PRJ_NOTIFY_FILE_OVERWRITTEN.0
            | PRJ_NOTIFY_PRE_DELETE.0
            | PRJ_NOTIFY_PRE_RENAME.0
            | PRJ_NOTIFY_PRE_SET_HARDLINK.0
            | PRJ_NOTIFY_FILE_RENAMED.0
            | PRJ_NOTIFY_HARDLINK_CREATED.0
            | PRJ_NOTIFY_FILE_HANDLE_CLOSED_FILE_MODIFIED.0
            | PRJ_NOTIFY_FILE_HANDLE_CLOSED_FILE_DELETED.0;

        let notification_root: Vec<u16> = string_to_wide("");
        let mut notification_mappings: [PRJ_NOTIFICATION_MAPPING; 1] = [PRJ_NOTIFICATION_MAPPING {
            NotificationBitMask: PRJ_NOTIFY_TYPES(notification_bits),
            NotificationRoot: PCWSTR::from_raw(notification_root.as_ptr()),
        }];

        let start_options = PRJ_STARTVIRTUALIZING_OPTIONS {
            Flags: PRJ_STARTVIRTUALIZING_FLAGS(0),
            PoolThreadCount: self.options.pool_thread_count,
            ConcurrentThreadCount: self.options.concurrent_thread_count,
            NotificationMappings: notification_mappings.as_mut_ptr(),
            NotificationMappingsCount: notification_mappings.len() as u32,
        };

        let started: Result<PRJ_NAMESPACE_VIRTUALIZATION_CONTEXT, windows::core::Error> = unsafe {
            PrjStartVirtualizing(
                PCWSTR::from_raw(root_wide.as_ptr()),
                &callbacks,
                Some(self as *const ProjfsProvider as *const c_void),
                Some(&start_options),
            )
        };

        match started {
            Ok(context) => {
                *self.context.write() = Some(SendableContext::new(context));
                self.running.store(true, Ordering::SeqCst);
                self.bridge.start();
                tracing::info!("virtualization started at {}", root.display());
                Ok(())
            }
            Err(e) => Err(ProviderError::ProjFsApi {
                operation: "PrjStartVirtualizing",
                hresult: e.code().0,
            }),
        }
    }

    /// Stop virtualization and the host bridge.
    ///
    /// Does not interrupt in-flight callbacks; callers drain before
    /// teardown.
    pub fn stop(&self) -> Result<(), ProviderError> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(ProviderError::NotStarted);
        }

        if let Some(context) = self.context.write().take() {
            unsafe {
                PrjStopVirtualizing(context.inner());
            }
            tracing::info!("virtualization stopped");
        }

        self.bridge.stop();
        Ok(())
    }

    /// Clear the tombstone Windows remembers for a deleted projected file
    /// so it can reappear. Not-found means there was nothing to clear and
    /// reads as success; on success the cached state for the path is also
    /// dropped.
    pub fn invalidate_tombstone(&self, virtual_path: &str) -> bool {
        if !self.is_running() {
            tracing::warn!("cannot invalidate tombstone while stopped");
            return false;
        }
        let Some(context) = *self.context.read() else {
            return false;
        };

        let canonical: String = canonical_virtual_path(virtual_path);
        let windows_path: String = to_windows_relative(&canonical);
        let path_wide: Vec<u16> = string_to_wide(&windows_path);

        let result = unsafe {
            PrjDeleteFile(
                context.inner(),
                PCWSTR::from_raw(path_wide.as_ptr()),
                PRJ_UPDATE_ALLOW_DIRTY_METADATA | PRJ_UPDATE_ALLOW_TOMBSTONE,
                None,
            )
        };

        match result {
            Ok(()) => {
                self.invalidate_cached_path(&canonical);
                true
            }
            Err(e) if e.code() == HRESULT::from(ERROR_FILE_NOT_FOUND) => true,
            Err(e) => {
                tracing::warn!(
                    "tombstone invalidation failed for {}: 0x{:08X}",
                    canonical,
                    e.code().0
                );
                false
            }
        }
    }

    /// Write the data (if any) and complete a parked command with success.
    pub(crate) fn finish_command(
        &self,
        request: &PendingFileRequest,
        command_id: CommandId,
        data: Option<Vec<u8>>,
    ) {
        let status: HRESULT = match data {
            Some(bytes) => match write_file_data_aligned(
                request.context.inner(),
                &request.data_stream_id,
                &bytes,
                request.byte_offset,
            ) {
                Ok(()) => S_OK,
                Err(hr) => hr,
            },
            None => S_OK,
        };

        unsafe {
            if let Err(e) = PrjCompleteCommand(request.context.inner(), command_id, status, None) {
                tracing::warn!("PrjCompleteCommand({}) failed: {:?}", command_id, e);
            }
        }
    }

    /// Complete a parked command with file-not-found.
    pub(crate) fn fail_command(&self, request: &PendingFileRequest, command_id: CommandId) {
        unsafe {
            if let Err(e) = PrjCompleteCommand(
                request.context.inner(),
                command_id,
                HRESULT::from(ERROR_FILE_NOT_FOUND),
                None,
            ) {
                tracing::warn!("PrjCompleteCommand({}) failed: {:?}", command_id, e);
            }
        }
    }
}

// ProjFS holds the provider's address while virtualization runs; never let
// the instance go away still projecting.
impl Drop for ProjfsProvider {
    fn drop(&mut self) {
        if self.is_running() {
            let _ = self.stop();
        }
    }
}
