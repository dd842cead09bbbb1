//! Parked `GetFileData` requests awaiting host content.
//!
//! A cache-miss read returns `ERROR_IO_PENDING` to the kernel and records
//! the request here, keyed by the ProjFS command identifier. Once the host
//! has delivered the bytes it calls `complete_pending_file_requests`, which
//! drains every request recorded for that path and completes the parked
//! commands out-of-band.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::path::canonical_virtual_path;

/// ProjFS command identifier.
pub type CommandId = i32;

/// One parked read. The virtualization context handle and data-stream
/// identifier are stored verbatim for the later out-of-band completion.
#[derive(Clone, Debug)]
pub struct PendingFileRequest {
    pub virtual_path: String,
    pub byte_offset: u64,
    pub length: u32,
    #[cfg(windows)]
    pub context: crate::provider::SendableContext,
    #[cfg(windows)]
    pub data_stream_id: windows::core::GUID,
}

/// What a parked command should be completed with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion {
    /// Write these bytes, then complete with success.
    Data(Vec<u8>),
    /// The requested range starts at or past the end: complete with
    /// success and no data.
    EmptyRange,
    /// No content is available: complete with file-not-found.
    Missing,
}

/// Slice `[offset, offset + length)` out of `data`, clamped to its end.
pub fn slice_range(data: &[u8], offset: u64, length: u32) -> Vec<u8> {
    let start: usize = offset as usize;
    if start >= data.len() {
        return Vec::new();
    }
    let end: usize = (offset + length as u64).min(data.len() as u64) as usize;
    data[start..end].to_vec()
}

/// Compute the completion for a parked request given the resolved bytes.
pub fn completion_outcome(content: Option<&[u8]>, request: &PendingFileRequest) -> Completion {
    match content {
        Some(data) if !data.is_empty() => {
            if request.byte_offset >= data.len() as u64 {
                Completion::EmptyRange
            } else {
                Completion::Data(slice_range(data, request.byte_offset, request.length))
            }
        }
        _ => Completion::Missing,
    }
}

/// All parked reads, keyed by command identifier.
#[derive(Default)]
pub struct PendingRequestTable {
    requests: Mutex<HashMap<CommandId, PendingFileRequest>>,
}

impl PendingRequestTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a parked read.
    pub fn insert(&self, command_id: CommandId, request: PendingFileRequest) {
        tracing::debug!(
            "parked file request {} for {} (offset={}, length={})",
            command_id,
            request.virtual_path,
            request.byte_offset,
            request.length
        );
        self.requests.lock().insert(command_id, request);
    }

    /// Remove and return every request whose path matches, comparing in
    /// canonical form.
    pub fn drain_matching(&self, virtual_path: &str) -> Vec<(CommandId, PendingFileRequest)> {
        let canonical: String = canonical_virtual_path(virtual_path);
        let mut requests = self.requests.lock();

        let matching: Vec<CommandId> = requests
            .iter()
            .filter(|(_, r)| canonical_virtual_path(&r.virtual_path) == canonical)
            .map(|(id, _)| *id)
            .collect();

        matching
            .into_iter()
            .filter_map(|id| requests.remove(&id).map(|r| (id, r)))
            .collect()
    }

    /// Whether any parked request targets the given path.
    pub fn has_path(&self, virtual_path: &str) -> bool {
        let canonical: String = canonical_virtual_path(virtual_path);
        self.requests
            .lock()
            .values()
            .any(|r| canonical_virtual_path(&r.virtual_path) == canonical)
    }

    pub fn len(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(path: &str, offset: u64, length: u32) -> PendingFileRequest {
        PendingFileRequest {
            virtual_path: path.to_string(),
            byte_offset: offset,
            length,
            #[cfg(windows)]
            context: crate::provider::SendableContext::null(),
            #[cfg(windows)]
            data_stream_id: windows::core::GUID::zeroed(),
        }
    }

    #[test]
    fn test_slice_range() {
        let data: &[u8] = b"hello world";
        assert_eq!(slice_range(data, 0, 5), b"hello");
        assert_eq!(slice_range(data, 6, 100), b"world");
        assert_eq!(slice_range(data, 11, 4), b"");
        assert_eq!(slice_range(data, 100, 4), b"");
    }

    #[test]
    fn test_drain_matching_canonicalizes() {
        let table: PendingRequestTable = PendingRequestTable::new();
        table.insert(1, request("/chats/msg1", 0, 4096));
        table.insert(2, request("chats\\msg1", 0, 4096));
        table.insert(3, request("/chats/other", 0, 4096));

        let drained: Vec<(CommandId, PendingFileRequest)> = table.drain_matching("/chats/msg1");
        assert_eq!(drained.len(), 2);
        assert_eq!(table.len(), 1);
        assert!(table.has_path("/chats/other"));
        assert!(!table.has_path("/chats/msg1"));
    }

    #[test]
    fn test_completion_outcome_slices() {
        let req: PendingFileRequest = request("/f", 6, 2);
        assert_eq!(
            completion_outcome(Some(b"hello world"), &req),
            Completion::Data(b"wo".to_vec())
        );
    }

    #[test]
    fn test_completion_outcome_offset_past_end() {
        let req: PendingFileRequest = request("/f", 50, 8);
        assert_eq!(completion_outcome(Some(b"short"), &req), Completion::EmptyRange);
    }

    #[test]
    fn test_completion_outcome_missing() {
        let req: PendingFileRequest = request("/f", 0, 8);
        assert_eq!(completion_outcome(None, &req), Completion::Missing);
        assert_eq!(completion_outcome(Some(b""), &req), Completion::Missing);
    }
}
