use std::collections::HashMap;
use std::path::PathBuf;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

use crate::core::client::storage::StorageError;

/// A bucket as reported by the backend.
///
/// The list-buckets response carries no per-bucket region; the region is a
/// property of the connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketInfo {
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// One entry of an object listing. Non-recursive listings report directory
/// style entries with `is_prefix` set and a size of zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub etag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub is_prefix: bool,
}

/// Full metadata of a stored object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStat {
    pub key: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    /// User metadata; keys are case-sensitive, values flat strings
    pub metadata: HashMap<String, String>,
    pub sse: Option<SseKind>,
    pub version_id: Option<String>,
}

/// Server-side encryption descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SseKind {
    Aes256,
    AwsKms { key_id: Option<String> },
}

/// Byte range for partial object retrieval: a start offset and an optional
/// length. Omitting the length reads to the end of the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub offset: u64,
    pub length: Option<u64>,
}

impl ByteRange {
    pub fn from_offset(offset: u64) -> Self {
        Self { offset, length: None }
    }

    pub fn new(offset: u64, length: u64) -> Self {
        Self { offset, length: Some(length) }
    }

    /// HTTP Range header value; the end bound is inclusive
    pub(crate) fn to_header(self) -> String {
        match self.length {
            Some(length) => format!("bytes={}-{}", self.offset, self.offset + length - 1),
            None => format!("bytes={}-", self.offset),
        }
    }
}

/// Options for uploads
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    /// Defaults to `application/octet-stream` when omitted
    pub content_type: Option<String>,
    pub metadata: HashMap<String, String>,
    pub sse: Option<SseKind>,
}

/// Options for server-side copies
#[derive(Debug, Clone, Default)]
pub struct CopyOptions {
    pub sse: Option<SseKind>,
    /// When set, the destination gets exactly this metadata instead of
    /// inheriting the source's
    pub replace_metadata: Option<HashMap<String, String>>,
    /// Only applied in metadata-replace mode
    pub content_type: Option<String>,
}

/// Upload payload: in-memory bytes, a file on disk, or a sized reader
pub enum PutSource {
    Bytes(Bytes),
    File(PathBuf),
    Reader { reader: Box<dyn AsyncRead + Send + Unpin>, size: u64 },
}

impl std::fmt::Debug for PutSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PutSource::Bytes(data) => f.debug_tuple("Bytes").field(&data.len()).finish(),
            PutSource::File(path) => f.debug_tuple("File").field(path).finish(),
            PutSource::Reader { size, .. } => f.debug_struct("Reader").field("size", size).finish(),
        }
    }
}

impl From<Bytes> for PutSource {
    fn from(data: Bytes) -> Self {
        PutSource::Bytes(data)
    }
}

impl From<Vec<u8>> for PutSource {
    fn from(data: Vec<u8>) -> Self {
        PutSource::Bytes(Bytes::from(data))
    }
}

/// Per-key outcome of a bulk removal. An empty failure list means every key
/// was removed.
#[derive(Debug)]
pub struct RemoveFailure {
    pub key: String,
    pub error: StorageError,
}

/// An incomplete multipart upload as reported by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultipartUploadInfo {
    pub key: String,
    pub upload_id: String,
    pub initiated: Option<DateTime<Utc>>,
}

/// A time-limited grant for a direct browser upload: the form URL and the
/// fields the form must carry. Generated on demand, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresignedPost {
    pub url: String,
    pub fields: HashMap<String, String>,
    pub expires_at: DateTime<Utc>,
}
