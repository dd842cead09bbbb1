//! ProjFS callback implementations.
//!
//! These are the raw `extern "system"` functions registered with the
//! ProjFS driver. Each converts kernel arguments into canonical virtual
//! paths and delegates to the engine; the helpers below do the buffer and
//! placeholder writes.

use std::ffi::c_void;

use windows::core::{GUID, HRESULT, PCWSTR};
use windows::Win32::Foundation::{
    ERROR_ACCESS_DENIED, ERROR_FILE_NOT_FOUND, ERROR_INSUFFICIENT_BUFFER, ERROR_IO_PENDING,
    E_FAIL, E_OUTOFMEMORY, S_OK,
};
use windows::Win32::Storage::FileSystem::{FILE_ATTRIBUTE_DIRECTORY, FILE_ATTRIBUTE_NORMAL};
use windows::Win32::Storage::ProjectedFileSystem::{
    PrjAllocateAlignedBuffer, PrjFillDirEntryBuffer, PrjFreeAlignedBuffer, PrjWriteFileData,
    PrjWritePlaceholderInfo, PRJ_CALLBACKS, PRJ_CALLBACK_DATA,
    PRJ_CB_DATA_FLAG_ENUM_RESTART_SCAN, PRJ_DIR_ENTRY_BUFFER_HANDLE, PRJ_FILE_BASIC_INFO,
    PRJ_NAMESPACE_VIRTUALIZATION_CONTEXT, PRJ_NOTIFICATION,
    PRJ_NOTIFICATION_FILE_HANDLE_CLOSED_FILE_DELETED,
    PRJ_NOTIFICATION_FILE_HANDLE_CLOSED_FILE_MODIFIED,
    PRJ_NOTIFICATION_FILE_HANDLE_CLOSED_NO_MODIFICATION, PRJ_NOTIFICATION_FILE_OPENED,
    PRJ_NOTIFICATION_FILE_OVERWRITTEN, PRJ_NOTIFICATION_FILE_PRE_CONVERT_TO_FULL,
    PRJ_NOTIFICATION_FILE_RENAMED, PRJ_NOTIFICATION_HARDLINK_CREATED,
    PRJ_NOTIFICATION_NEW_FILE_CREATED, PRJ_NOTIFICATION_PARAMETERS, PRJ_NOTIFICATION_PRE_DELETE,
    PRJ_NOTIFICATION_PRE_RENAME, PRJ_NOTIFICATION_PRE_SET_HARDLINK, PRJ_PLACEHOLDER_INFO,
};

use casfs_store::ObjectMetadata;

use crate::enumeration::EnumerationId;
use crate::notification::{notification_response, NotificationKind, NotificationResponse};
use crate::path::canonical_virtual_path;
use crate::pending::PendingFileRequest;
use crate::provider::engine::{DirEntrySink, FillResult, ProjfsProvider, ReadOutcome};
use crate::provider::sendable::SendableContext;
use crate::util::filetime::filetime_now;
use crate::util::wstr::{pcwstr_to_string, string_to_wide};

/// Recover the provider from the instance context.
///
/// The provider registers its own address at start and stays pinned until
/// virtualization stops, so the pointer is valid for every dispatch.
unsafe fn provider_of<'a>(callback_data: *const PRJ_CALLBACK_DATA) -> &'a ProjfsProvider {
    &*((*callback_data).InstanceContext as *const ProjfsProvider)
}

unsafe fn virtual_path_of(callback_data: *const PRJ_CALLBACK_DATA) -> Result<String, HRESULT> {
    match pcwstr_to_string((*callback_data).FilePathName) {
        Ok(relative) => Ok(canonical_virtual_path(&relative)),
        Err(_) => Err(E_FAIL),
    }
}

// ============================================================================
// Callback implementations
// ============================================================================

/// Start directory enumeration callback.
pub unsafe extern "system" fn start_dir_enum_cb(
    callback_data: *const PRJ_CALLBACK_DATA,
    enumeration_id: *const GUID,
) -> HRESULT {
    let provider: &ProjfsProvider = provider_of(callback_data);

    let virtual_path: String = match virtual_path_of(callback_data) {
        Ok(p) => p,
        Err(hr) => return hr,
    };
    tracing::debug!("StartDirectoryEnumeration: {}", virtual_path);

    provider.start_enumeration(EnumerationId::from(&*enumeration_id));
    S_OK
}

/// Get directory enumeration callback.
pub unsafe extern "system" fn get_dir_enum_cb(
    callback_data: *const PRJ_CALLBACK_DATA,
    enumeration_id: *const GUID,
    search_expression: PCWSTR,
    dir_entry_buffer_handle: PRJ_DIR_ENTRY_BUFFER_HANDLE,
) -> HRESULT {
    let provider: &ProjfsProvider = provider_of(callback_data);

    let virtual_path: String = match virtual_path_of(callback_data) {
        Ok(p) => p,
        Err(hr) => return hr,
    };

    let restart: bool = ((*callback_data).Flags.0 & PRJ_CB_DATA_FLAG_ENUM_RESTART_SCAN.0) != 0;
    let filter: Option<String> = if search_expression.is_null() {
        None
    } else {
        pcwstr_to_string(search_expression).ok()
    };

    let mut sink = BufferSink {
        handle: dir_entry_buffer_handle,
    };
    provider.enumeration_batch(
        EnumerationId::from(&*enumeration_id),
        &virtual_path,
        restart,
        filter.as_deref(),
        &mut sink,
    );

    S_OK
}

/// End directory enumeration callback.
pub unsafe extern "system" fn end_dir_enum_cb(
    callback_data: *const PRJ_CALLBACK_DATA,
    enumeration_id: *const GUID,
) -> HRESULT {
    let provider: &ProjfsProvider = provider_of(callback_data);
    provider.end_enumeration(EnumerationId::from(&*enumeration_id));
    S_OK
}

/// Get placeholder info callback.
pub unsafe extern "system" fn get_placeholder_info_cb(
    callback_data: *const PRJ_CALLBACK_DATA,
) -> HRESULT {
    let provider: &ProjfsProvider = provider_of(callback_data);

    let virtual_path: String = match virtual_path_of(callback_data) {
        Ok(p) => p,
        Err(hr) => return hr,
    };
    tracing::debug!("GetPlaceholderInfo: {}", virtual_path);

    match provider.resolve_placeholder(&virtual_path) {
        Some(metadata) => write_placeholder_info(
            (*callback_data).NamespaceVirtualizationContext,
            (*callback_data).FilePathName,
            &metadata,
        ),
        None => HRESULT::from(ERROR_FILE_NOT_FOUND),
    }
}

/// Get file data callback. Never blocks: misses park the command and
/// answer io-pending.
pub unsafe extern "system" fn get_file_data_cb(
    callback_data: *const PRJ_CALLBACK_DATA,
    byte_offset: u64,
    length: u32,
) -> HRESULT {
    let provider: &ProjfsProvider = provider_of(callback_data);

    let virtual_path: String = match virtual_path_of(callback_data) {
        Ok(p) => p,
        Err(hr) => return hr,
    };
    tracing::debug!(
        "GetFileData: {} offset={} length={}",
        virtual_path,
        byte_offset,
        length
    );

    match provider.read_file_data(&virtual_path, byte_offset, length) {
        ReadOutcome::Content(data) => {
            if data.is_empty() {
                return S_OK;
            }
            match write_file_data_aligned(
                (*callback_data).NamespaceVirtualizationContext,
                &(*callback_data).DataStreamId,
                &data,
                byte_offset,
            ) {
                Ok(()) => S_OK,
                Err(hr) => hr,
            }
        }
        ReadOutcome::Pending => {
            let request = PendingFileRequest {
                virtual_path,
                byte_offset,
                length,
                context: SendableContext::new((*callback_data).NamespaceVirtualizationContext),
                data_stream_id: (*callback_data).DataStreamId,
            };
            provider.park_file_request((*callback_data).CommandId, request);
            HRESULT::from(ERROR_IO_PENDING)
        }
    }
}

/// Query file name callback. Case-insensitive matching is unsupported, so
/// every probe reads as not-found.
pub unsafe extern "system" fn query_file_name_cb(
    _callback_data: *const PRJ_CALLBACK_DATA,
) -> HRESULT {
    HRESULT::from(ERROR_FILE_NOT_FOUND)
}

/// Notification callback: the read-only policy table.
pub unsafe extern "system" fn notification_cb(
    callback_data: *const PRJ_CALLBACK_DATA,
    _is_directory: windows::Win32::Foundation::BOOLEAN,
    notification: PRJ_NOTIFICATION,
    destination_file_name: PCWSTR,
    _operation_parameters: *mut PRJ_NOTIFICATION_PARAMETERS,
) -> HRESULT {
    let provider: &ProjfsProvider = provider_of(callback_data);

    let virtual_path: String = virtual_path_of(callback_data).unwrap_or_default();
    let kind: NotificationKind = notification_kind(notification);

    match notification_response(kind) {
        NotificationResponse::Allow => S_OK,
        NotificationResponse::Deny => {
            provider
                .bridge
                .emit_debug(&format!("blocked {} for {}", kind.as_str(), virtual_path));
            HRESULT::from(ERROR_ACCESS_DENIED)
        }
        NotificationResponse::LogAndAllow => {
            if kind == NotificationKind::FileRenamed && !destination_file_name.is_null() {
                let destination: String =
                    pcwstr_to_string(destination_file_name).unwrap_or_default();
                tracing::debug!("{}: {} -> {}", kind.as_str(), virtual_path, destination);
            } else {
                tracing::debug!("{}: {}", kind.as_str(), virtual_path);
            }
            S_OK
        }
    }
}

fn notification_kind(notification: PRJ_NOTIFICATION) -> NotificationKind {
    match notification {
        PRJ_NOTIFICATION_FILE_OPENED => NotificationKind::FileOpened,
        PRJ_NOTIFICATION_NEW_FILE_CREATED => NotificationKind::NewFileCreated,
        PRJ_NOTIFICATION_FILE_OVERWRITTEN => NotificationKind::FileOverwritten,
        PRJ_NOTIFICATION_PRE_DELETE => NotificationKind::PreDelete,
        PRJ_NOTIFICATION_PRE_RENAME => NotificationKind::PreRename,
        PRJ_NOTIFICATION_PRE_SET_HARDLINK => NotificationKind::PreSetHardlink,
        PRJ_NOTIFICATION_FILE_RENAMED => NotificationKind::FileRenamed,
        PRJ_NOTIFICATION_HARDLINK_CREATED => NotificationKind::HardlinkCreated,
        PRJ_NOTIFICATION_FILE_HANDLE_CLOSED_NO_MODIFICATION => {
            NotificationKind::FileHandleClosedNoModification
        }
        PRJ_NOTIFICATION_FILE_HANDLE_CLOSED_FILE_MODIFIED => {
            NotificationKind::FileHandleClosedFileModified
        }
        PRJ_NOTIFICATION_FILE_HANDLE_CLOSED_FILE_DELETED => {
            NotificationKind::FileHandleClosedFileDeleted
        }
        PRJ_NOTIFICATION_FILE_PRE_CONVERT_TO_FULL => NotificationKind::FilePreConvertToFull,
        _ => NotificationKind::Unknown,
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Sink that fills the kernel's dir-entry buffer.
struct BufferSink {
    handle: PRJ_DIR_ENTRY_BUFFER_HANDLE,
}

impl DirEntrySink for BufferSink {
    fn fill(&mut self, name: &str, metadata: &ObjectMetadata) -> FillResult {
        let name_wide: Vec<u16> = string_to_wide(name);
        let basic_info: PRJ_FILE_BASIC_INFO = file_basic_info(metadata);

        unsafe {
            match PrjFillDirEntryBuffer(
                PCWSTR::from_raw(name_wide.as_ptr()),
                Some(&basic_info),
                self.handle,
            ) {
                Ok(()) => FillResult::Filled,
                Err(e) if e.code() == HRESULT::from(ERROR_INSUFFICIENT_BUFFER) => {
                    FillResult::BufferFull
                }
                Err(_) => FillResult::Failed,
            }
        }
    }
}

/// Basic info for placeholders and enumeration entries. All four
/// timestamps carry the current system time.
fn file_basic_info(metadata: &ObjectMetadata) -> PRJ_FILE_BASIC_INFO {
    let now: i64 = filetime_now();

    PRJ_FILE_BASIC_INFO {
        IsDirectory: windows::Win32::Foundation::BOOLEAN(metadata.is_directory as u8),
        FileSize: if metadata.is_directory {
            0
        } else {
            metadata.size as i64
        },
        CreationTime: now,
        LastAccessTime: now,
        LastWriteTime: now,
        ChangeTime: now,
        FileAttributes: if metadata.is_directory {
            FILE_ATTRIBUTE_DIRECTORY.0
        } else {
            FILE_ATTRIBUTE_NORMAL.0
        },
    }
}

/// Write placeholder info for a resolved path.
fn write_placeholder_info(
    context: PRJ_NAMESPACE_VIRTUALIZATION_CONTEXT,
    file_path_name: PCWSTR,
    metadata: &ObjectMetadata,
) -> HRESULT {
    let placeholder_info = PRJ_PLACEHOLDER_INFO {
        FileBasicInfo: file_basic_info(metadata),
        ..Default::default()
    };

    unsafe {
        match PrjWritePlaceholderInfo(
            context,
            file_path_name,
            &placeholder_info,
            std::mem::size_of::<PRJ_PLACEHOLDER_INFO>() as u32,
        ) {
            Ok(()) => S_OK,
            Err(e) => e.code(),
        }
    }
}

/// Copy data into a ProjFS-aligned buffer and hand it to the kernel.
pub(crate) fn write_file_data_aligned(
    context: PRJ_NAMESPACE_VIRTUALIZATION_CONTEXT,
    data_stream_id: &GUID,
    data: &[u8],
    byte_offset: u64,
) -> Result<(), HRESULT> {
    unsafe {
        let aligned_buffer: *mut c_void = PrjAllocateAlignedBuffer(context, data.len());
        if aligned_buffer.is_null() {
            return Err(E_OUTOFMEMORY);
        }

        std::ptr::copy_nonoverlapping(data.as_ptr(), aligned_buffer as *mut u8, data.len());

        let result = PrjWriteFileData(
            context,
            data_stream_id,
            aligned_buffer,
            byte_offset,
            data.len() as u32,
        );

        PrjFreeAlignedBuffer(aligned_buffer);

        result.map_err(|e| e.code())
    }
}

/// Build the callbacks structure registered with ProjFS.
pub fn build_callbacks() -> PRJ_CALLBACKS {
    PRJ_CALLBACKS {
        StartDirectoryEnumerationCallback: Some(start_dir_enum_cb),
        EndDirectoryEnumerationCallback: Some(end_dir_enum_cb),
        GetDirectoryEnumerationCallback: Some(get_dir_enum_cb),
        GetPlaceholderInfoCallback: Some(get_placeholder_info_cb),
        GetFileDataCallback: Some(get_file_data_cb),
        QueryFileNameCallback: Some(query_file_name_cb),
        NotificationCallback: Some(notification_cb),
        CancelCommandCallback: None,
    }
}
