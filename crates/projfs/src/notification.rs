//! Notification policy for the read-only projection.
//!
//! The filesystem is read-only: every mutating operation is denied before
//! it happens. Post-operation notifications cannot be vetoed anymore and
//! are logged and allowed. Anything unrecognized is denied.

/// Filesystem operation notifications delivered by ProjFS.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    FileOpened,
    NewFileCreated,
    FileOverwritten,
    PreDelete,
    PreRename,
    PreSetHardlink,
    FileRenamed,
    HardlinkCreated,
    FileHandleClosedNoModification,
    FileHandleClosedFileModified,
    FileHandleClosedFileDeleted,
    FilePreConvertToFull,
    Unknown,
}

impl NotificationKind {
    /// Name used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::FileOpened => "FILE_OPENED",
            NotificationKind::NewFileCreated => "NEW_FILE_CREATED",
            NotificationKind::FileOverwritten => "FILE_OVERWRITTEN",
            NotificationKind::PreDelete => "PRE_DELETE",
            NotificationKind::PreRename => "PRE_RENAME",
            NotificationKind::PreSetHardlink => "PRE_SET_HARDLINK",
            NotificationKind::FileRenamed => "FILE_RENAMED",
            NotificationKind::HardlinkCreated => "HARDLINK_CREATED",
            NotificationKind::FileHandleClosedNoModification => "FILE_CLOSED_NO_MOD",
            NotificationKind::FileHandleClosedFileModified => "FILE_CLOSED_MODIFIED",
            NotificationKind::FileHandleClosedFileDeleted => "FILE_CLOSED_DELETED",
            NotificationKind::FilePreConvertToFull => "PRE_CONVERT_TO_FULL",
            NotificationKind::Unknown => "UNKNOWN",
        }
    }
}

/// How the notification callback answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationResponse {
    /// Informational, return success.
    Allow,
    /// Mutating pre-operation, return access-denied.
    Deny,
    /// Post-operation that cannot be vetoed: log it, return success.
    LogAndAllow,
}

/// The response table.
pub fn notification_response(kind: NotificationKind) -> NotificationResponse {
    use NotificationKind::*;

    match kind {
        FileOpened | FileHandleClosedNoModification | FilePreConvertToFull => {
            NotificationResponse::Allow
        }
        NewFileCreated | FileOverwritten | PreDelete | PreRename | PreSetHardlink => {
            NotificationResponse::Deny
        }
        FileRenamed
        | HardlinkCreated
        | FileHandleClosedFileModified
        | FileHandleClosedFileDeleted => NotificationResponse::LogAndAllow,
        Unknown => NotificationResponse::Deny,
    }
}
