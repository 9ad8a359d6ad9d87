pub mod error;
pub mod post_policy;
pub mod s3;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
pub use error::{ErrorKind, StorageError, StorageResult};
use mockall::automock;
pub use s3::AwsS3;
use tokio::io::AsyncRead;

use crate::types::notification::BucketNotificationConfig;
use crate::types::object::{
    BucketInfo, ByteRange, CopyOptions, MultipartUploadInfo, ObjectStat, ObjectSummary, PresignedPost, PutOptions,
};

/// One page of an object listing
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    pub entries: Vec<ObjectSummary>,
    pub next_token: Option<String>,
}

/// Trait defining the raw backend operations behind the facade.
///
/// This is the only seam that performs network I/O. Implementations translate
/// every backend failure through [`StorageError`] exactly once and never
/// retry — retries belong to the backend SDK.
#[automock]
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Create a bucket, optionally in a region other than the connection's
    async fn create_bucket<'a>(&self, name: &str, region: Option<&'a str>) -> StorageResult<()>;

    /// List all buckets visible to the credentials, in backend response order
    async fn list_buckets(&self) -> StorageResult<Vec<BucketInfo>>;

    /// Check whether a bucket exists
    async fn bucket_exists(&self, name: &str) -> StorageResult<bool>;

    /// Remove an empty bucket
    async fn remove_bucket(&self, name: &str) -> StorageResult<()>;

    /// Fetch one listing page; `delimiter` collapses common prefixes
    async fn list_objects_page<'a>(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&'a str>,
        continuation: Option<String>,
    ) -> StorageResult<ObjectPage>;

    /// Open an object (or a byte range of it) for reading
    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        range: Option<ByteRange>,
    ) -> StorageResult<Box<dyn AsyncRead + Send + Unpin>>;

    /// Single-shot upload of an in-memory payload
    async fn put_object(&self, bucket: &str, key: &str, data: Bytes, opts: PutOptions) -> StorageResult<()>;

    /// Chunked multipart upload of `size` bytes from `source`. A failed
    /// upload is aborted best-effort before the error surfaces.
    async fn put_object_multipart(
        &self,
        bucket: &str,
        key: &str,
        source: Box<dyn AsyncRead + Send + Unpin>,
        size: u64,
        part_size: u64,
        opts: PutOptions,
    ) -> StorageResult<()>;

    /// Fetch object metadata without the payload
    async fn stat_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectStat>;

    /// Remove an object. The backend treats a missing key as success; the
    /// facade layers NotFound semantics on top.
    async fn remove_object(&self, bucket: &str, key: &str) -> StorageResult<()>;

    /// Server-side copy
    async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
        opts: CopyOptions,
    ) -> StorageResult<()>;

    /// List incomplete multipart uploads under a key prefix
    async fn list_incomplete_uploads(&self, bucket: &str, prefix: &str) -> StorageResult<Vec<MultipartUploadInfo>>;

    /// Abort one multipart upload
    async fn abort_upload(&self, bucket: &str, key: &str, upload_id: &str) -> StorageResult<()>;

    /// Presigned download URL; `response_overrides` are the signed
    /// `response-*` query parameters
    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expiry: Duration,
        response_overrides: HashMap<String, String>,
    ) -> StorageResult<String>;

    /// Presigned upload URL
    async fn presign_put(&self, bucket: &str, key: &str, expiry: Duration) -> StorageResult<String>;

    /// Presigned POST-policy grant for direct form uploads
    async fn presign_post(&self, bucket: &str, key: &str, expiry: Duration) -> StorageResult<PresignedPost>;

    /// Fetch the bucket policy document; `None` when no policy is set
    async fn get_bucket_policy(&self, bucket: &str) -> StorageResult<Option<String>>;

    /// Replace the bucket policy document
    async fn set_bucket_policy(&self, bucket: &str, policy: &str) -> StorageResult<()>;

    /// Remove the bucket policy document
    async fn delete_bucket_policy(&self, bucket: &str) -> StorageResult<()>;

    /// Fetch the bucket's notification rule set
    async fn get_bucket_notification(&self, bucket: &str) -> StorageResult<BucketNotificationConfig>;

    /// Replace the bucket's notification rule set; the empty config removes
    /// all rules
    async fn set_bucket_notification(&self, bucket: &str, config: &BucketNotificationConfig) -> StorageResult<()>;
}
