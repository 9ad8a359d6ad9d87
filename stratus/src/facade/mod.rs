//! The operations layer: one facade over an injected backend adapter.

pub mod presign;
mod validate;

use std::collections::{BTreeSet, VecDeque};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::core::client::storage::{AwsS3, ErrorKind, StorageClient, StorageError, StorageResult};
use crate::types::notification::BucketNotificationConfig;
use crate::types::object::{
    BucketInfo, ByteRange, CopyOptions, MultipartUploadInfo, ObjectStat, ObjectSummary, PutOptions, PutSource,
    RemoveFailure,
};
use crate::types::params::{OpContext, StorageArgs, TransferConfig};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const REMOVE_CONCURRENCY: usize = 8;

/// Unified object-storage facade.
///
/// Bound to exactly one backend endpoint and credential set for its
/// lifetime. Holds no per-call state, so one instance is safe to share
/// across concurrent callers; cloning shares the underlying session.
#[derive(Clone)]
pub struct ObjectStore {
    client: Arc<dyn StorageClient>,
    transfer: TransferConfig,
}

impl ObjectStore {
    /// Connects to the backend described by `args` with default transfer
    /// tuning
    pub async fn connect(args: StorageArgs) -> StorageResult<Self> {
        Self::connect_with(args, TransferConfig::default()).await
    }

    pub async fn connect_with(args: StorageArgs, transfer: TransferConfig) -> StorageResult<Self> {
        transfer.validate()?;
        let adapter = AwsS3::connect(&args).await?;
        Ok(Self::with_client(Arc::new(adapter), transfer))
    }

    /// Builds a facade over an injected adapter. The transfer tuning is
    /// taken as given.
    pub fn with_client(client: Arc<dyn StorageClient>, transfer: TransferConfig) -> Self {
        Self { client, transfer }
    }

    /// Races `fut` against the context's cancellation token and deadline.
    /// The token is checked first, so a pre-cancelled context never issues
    /// a backend call; losing futures are dropped (releasing their file
    /// handles and streams) before the error is returned.
    async fn guarded<T, F>(&self, ctx: &OpContext, operation: &'static str, fut: F) -> StorageResult<T>
    where
        F: Future<Output = StorageResult<T>>,
    {
        if ctx.is_cancelled() {
            return Err(StorageError::cancelled(operation));
        }
        let work = async move {
            match ctx.deadline {
                Some(deadline) => match tokio::time::timeout(deadline, fut).await {
                    Ok(result) => result,
                    Err(_) => Err(StorageError::new(ErrorKind::Cancelled, operation, "deadline exceeded")),
                },
                None => fut.await,
            }
        };
        match &ctx.cancellation {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(StorageError::cancelled(operation)),
                    result = work => result,
                }
            }
            None => work.await,
        }
    }

    pub async fn create_bucket(&self, name: &str, region: Option<&str>, ctx: &OpContext) -> StorageResult<()> {
        validate::bucket_name("create_bucket", name)?;
        self.guarded(ctx, "create_bucket", self.client.create_bucket(name, region)).await
    }

    pub async fn list_buckets(&self, ctx: &OpContext) -> StorageResult<Vec<BucketInfo>> {
        self.guarded(ctx, "list_buckets", self.client.list_buckets()).await
    }

    pub async fn bucket_exists(&self, name: &str, ctx: &OpContext) -> StorageResult<bool> {
        validate::bucket_name("bucket_exists", name)?;
        self.guarded(ctx, "bucket_exists", self.client.bucket_exists(name)).await
    }

    pub async fn remove_bucket(&self, name: &str, ctx: &OpContext) -> StorageResult<()> {
        validate::bucket_name("remove_bucket", name)?;
        self.guarded(ctx, "remove_bucket", self.client.remove_bucket(name)).await
    }

    /// Lazily lists objects under `prefix`. Pages are fetched one at a time
    /// as the stream is polled; dropping the stream releases the in-flight
    /// request. Non-recursive listings report directory-style entries with
    /// `is_prefix` set.
    pub fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        recursive: bool,
        ctx: &OpContext,
    ) -> BoxStream<'static, StorageResult<ObjectSummary>> {
        struct ListState {
            client: Arc<dyn StorageClient>,
            bucket: String,
            prefix: String,
            delimiter: Option<String>,
            ctx: OpContext,
            buffer: VecDeque<ObjectSummary>,
            token: Option<String>,
            started: bool,
            exhausted: bool,
        }

        let state = ListState {
            client: Arc::clone(&self.client),
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            delimiter: (!recursive).then(|| "/".to_string()),
            ctx: ctx.clone(),
            buffer: VecDeque::new(),
            token: None,
            started: false,
            exhausted: false,
        };

        futures::stream::try_unfold(state, |mut state| async move {
            loop {
                if let Some(entry) = state.buffer.pop_front() {
                    return Ok(Some((entry, state)));
                }
                if state.exhausted {
                    return Ok(None);
                }
                if !state.started {
                    validate::bucket_name("list_objects", &state.bucket)?;
                    state.started = true;
                }
                if state.ctx.is_cancelled() {
                    return Err(StorageError::cancelled("list_objects"));
                }
                let page = state
                    .client
                    .list_objects_page(&state.bucket, &state.prefix, state.delimiter.as_deref(), state.token.take())
                    .await?;
                state.exhausted = page.next_token.is_none();
                state.token = page.next_token;
                state.buffer.extend(page.entries);
            }
        })
        .boxed()
    }

    /// Streams an object (or a byte range of it) into `dest` and returns
    /// the number of bytes written
    pub async fn get_object<W>(
        &self,
        bucket: &str,
        key: &str,
        range: Option<ByteRange>,
        dest: &mut W,
        ctx: &OpContext,
    ) -> StorageResult<u64>
    where
        W: AsyncWrite + Send + Unpin + ?Sized,
    {
        validate::bucket_name("get_object", bucket)?;
        validate::object_key("get_object", key)?;
        if let Some(range) = &range {
            validate::byte_range("get_object", range)?;
        }
        self.guarded(ctx, "get_object", async move {
            let mut reader = self.client.get_object(bucket, key, range).await?;
            tokio::io::copy(&mut reader, dest)
                .await
                .map_err(|e| StorageError::unknown("get_object", format!("object stream failed: {e}")).with_source(e))
        })
        .await
    }

    /// Downloads an object into a local file. The file handle lives inside
    /// the guarded future, so cancellation drops (and closes) it before the
    /// error is surfaced.
    pub async fn get_object_to_file(
        &self,
        bucket: &str,
        key: &str,
        range: Option<ByteRange>,
        path: impl AsRef<Path>,
        ctx: &OpContext,
    ) -> StorageResult<u64> {
        validate::bucket_name("get_object", bucket)?;
        validate::object_key("get_object", key)?;
        if let Some(range) = &range {
            validate::byte_range("get_object", range)?;
        }
        let path = path.as_ref();
        self.guarded(ctx, "get_object", async move {
            let mut file = tokio::fs::File::create(path).await.map_err(|e| {
                StorageError::invalid_argument(
                    "get_object",
                    format!("cannot create destination file {}: {e}", path.display()),
                )
                .with_source(e)
            })?;
            let mut reader = self.client.get_object(bucket, key, range).await?;
            let written = tokio::io::copy(&mut reader, &mut file)
                .await
                .map_err(|e| StorageError::unknown("get_object", format!("object stream failed: {e}")).with_source(e))?;
            file.flush()
                .await
                .map_err(|e| StorageError::unknown("get_object", format!("flushing destination failed: {e}")).with_source(e))?;
            Ok(written)
        })
        .await
    }

    /// Uploads `source` to `bucket`/`key`. Sources larger than the
    /// configured multipart threshold are uploaded in parts; callers cannot
    /// observe the difference.
    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        source: PutSource,
        opts: PutOptions,
        ctx: &OpContext,
    ) -> StorageResult<()> {
        validate::bucket_name("put_object", bucket)?;
        validate::object_key("put_object", key)?;
        validate::metadata("put_object", &opts.metadata)?;
        let mut opts = opts;
        if opts.content_type.is_none() {
            opts.content_type = Some(DEFAULT_CONTENT_TYPE.to_string());
        }
        let threshold = self.transfer.multipart_threshold;
        let part_size = self.transfer.part_size;
        self.guarded(ctx, "put_object", async move {
            match source {
                PutSource::Bytes(data) => {
                    let size = data.len() as u64;
                    if size > threshold {
                        let reader: Box<dyn AsyncRead + Send + Unpin> = Box::new(std::io::Cursor::new(data));
                        self.client.put_object_multipart(bucket, key, reader, size, part_size, opts).await
                    } else {
                        self.client.put_object(bucket, key, data, opts).await
                    }
                }
                PutSource::File(path) => {
                    let file = tokio::fs::File::open(&path).await.map_err(|e| {
                        StorageError::invalid_argument(
                            "put_object",
                            format!("cannot open source file {}: {e}", path.display()),
                        )
                        .with_source(e)
                    })?;
                    let size = file
                        .metadata()
                        .await
                        .map_err(|e| {
                            StorageError::unknown(
                                "put_object",
                                format!("cannot stat source file {}: {e}", path.display()),
                            )
                            .with_source(e)
                        })?
                        .len();
                    if size > threshold {
                        self.client.put_object_multipart(bucket, key, Box::new(file), size, part_size, opts).await
                    } else {
                        let mut data = Vec::with_capacity(size as usize);
                        let mut file = file;
                        file.read_to_end(&mut data).await.map_err(|e| {
                            StorageError::unknown("put_object", format!("reading source file failed: {e}"))
                                .with_source(e)
                        })?;
                        self.client.put_object(bucket, key, Bytes::from(data), opts).await
                    }
                }
                PutSource::Reader { mut reader, size } => {
                    if size > threshold {
                        self.client.put_object_multipart(bucket, key, reader, size, part_size, opts).await
                    } else {
                        let mut data = Vec::with_capacity(size as usize);
                        reader.read_to_end(&mut data).await.map_err(|e| {
                            StorageError::unknown("put_object", format!("reading source failed: {e}")).with_source(e)
                        })?;
                        if data.len() as u64 != size {
                            return Err(StorageError::invalid_argument(
                                "put_object",
                                format!("source declared {size} bytes but provided {}", data.len()),
                            ));
                        }
                        self.client.put_object(bucket, key, Bytes::from(data), opts).await
                    }
                }
            }
        })
        .await
    }

    pub async fn stat_object(&self, bucket: &str, key: &str, ctx: &OpContext) -> StorageResult<ObjectStat> {
        validate::bucket_name("stat_object", bucket)?;
        validate::object_key("stat_object", key)?;
        self.guarded(ctx, "stat_object", self.client.stat_object(bucket, key)).await
    }

    /// Removes one object; a missing key reports NotFound
    pub async fn remove_object(&self, bucket: &str, key: &str, ctx: &OpContext) -> StorageResult<()> {
        validate::bucket_name("remove_object", bucket)?;
        validate::object_key("remove_object", key)?;
        self.guarded(ctx, "remove_object", remove_strict(self.client.as_ref(), bucket, key)).await
    }

    /// Removes a set of objects and reports one outcome per key; an empty
    /// result means every key was removed. Partial failure is not an
    /// overall error.
    pub async fn remove_objects(
        &self,
        bucket: &str,
        keys: &BTreeSet<String>,
        ctx: &OpContext,
    ) -> StorageResult<Vec<RemoveFailure>> {
        validate::bucket_name("remove_objects", bucket)?;
        self.guarded(ctx, "remove_objects", async move {
            let outcomes = futures::stream::iter(keys.iter().map(|key| {
                let client = Arc::clone(&self.client);
                let bucket = bucket.to_string();
                let key = key.clone();
                async move {
                    let outcome = match validate::object_key("remove_object", &key) {
                        Ok(()) => remove_strict(client.as_ref(), &bucket, &key).await,
                        Err(err) => Err(err),
                    };
                    (key, outcome)
                }
            }))
            .buffer_unordered(REMOVE_CONCURRENCY)
            .collect::<Vec<_>>()
            .await;

            let mut failures: Vec<RemoveFailure> = outcomes
                .into_iter()
                .filter_map(|(key, outcome)| outcome.err().map(|error| RemoveFailure { key, error }))
                .collect();
            failures.sort_by(|a, b| a.key.cmp(&b.key));
            Ok(failures)
        })
        .await
    }

    /// Server-side copy. `opts.replace_metadata` switches the destination
    /// to metadata-replace mode instead of inheriting the source's.
    pub async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
        opts: CopyOptions,
        ctx: &OpContext,
    ) -> StorageResult<()> {
        validate::bucket_name("copy_object", src_bucket)?;
        validate::object_key("copy_object", src_key)?;
        validate::bucket_name("copy_object", dst_bucket)?;
        validate::object_key("copy_object", dst_key)?;
        if let Some(metadata) = &opts.replace_metadata {
            validate::metadata("copy_object", metadata)?;
        }
        self.guarded(ctx, "copy_object", self.client.copy_object(src_bucket, src_key, dst_bucket, dst_key, opts)).await
    }

    /// Aborts any incomplete multipart upload for `key`. Idempotent: a key
    /// with no incomplete upload is a no-op.
    pub async fn remove_incomplete_upload(&self, bucket: &str, key: &str, ctx: &OpContext) -> StorageResult<()> {
        validate::bucket_name("remove_incomplete_upload", bucket)?;
        validate::object_key("remove_incomplete_upload", key)?;
        self.guarded(ctx, "remove_incomplete_upload", async move {
            let uploads = self.client.list_incomplete_uploads(bucket, key).await?;
            for upload in uploads.iter().filter(|upload| upload.key == key) {
                self.client.abort_upload(bucket, key, &upload.upload_id).await?;
            }
            Ok(())
        })
        .await
    }

    pub async fn list_incomplete_uploads(
        &self,
        bucket: &str,
        prefix: &str,
        ctx: &OpContext,
    ) -> StorageResult<Vec<MultipartUploadInfo>> {
        validate::bucket_name("list_incomplete_uploads", bucket)?;
        self.guarded(ctx, "list_incomplete_uploads", self.client.list_incomplete_uploads(bucket, prefix)).await
    }

    /// Fetches the bucket policy document; `None` when no policy is set
    pub async fn get_bucket_policy(&self, bucket: &str, ctx: &OpContext) -> StorageResult<Option<String>> {
        validate::bucket_name("get_bucket_policy", bucket)?;
        self.guarded(ctx, "get_bucket_policy", self.client.get_bucket_policy(bucket)).await
    }

    pub async fn set_bucket_policy(&self, bucket: &str, policy: &str, ctx: &OpContext) -> StorageResult<()> {
        validate::bucket_name("set_bucket_policy", bucket)?;
        serde_json::from_str::<serde_json::Value>(policy)
            .map_err(|e| StorageError::invalid_argument("set_bucket_policy", format!("policy is not valid JSON: {e}")))?;
        self.guarded(ctx, "set_bucket_policy", self.client.set_bucket_policy(bucket, policy)).await
    }

    pub async fn delete_bucket_policy(&self, bucket: &str, ctx: &OpContext) -> StorageResult<()> {
        validate::bucket_name("delete_bucket_policy", bucket)?;
        self.guarded(ctx, "delete_bucket_policy", self.client.delete_bucket_policy(bucket)).await
    }

    pub async fn get_bucket_notification(
        &self,
        bucket: &str,
        ctx: &OpContext,
    ) -> StorageResult<BucketNotificationConfig> {
        validate::bucket_name("get_bucket_notification", bucket)?;
        self.guarded(ctx, "get_bucket_notification", self.client.get_bucket_notification(bucket)).await
    }

    pub async fn set_bucket_notification(
        &self,
        bucket: &str,
        config: &BucketNotificationConfig,
        ctx: &OpContext,
    ) -> StorageResult<()> {
        validate::bucket_name("set_bucket_notification", bucket)?;
        for rule in &config.rules {
            if rule.target.arn().is_empty() {
                return Err(StorageError::invalid_argument(
                    "set_bucket_notification",
                    "notification target ARN cannot be empty",
                ));
            }
            if rule.events.is_empty() {
                return Err(StorageError::invalid_argument(
                    "set_bucket_notification",
                    "notification rules must subscribe to at least one event",
                ));
            }
        }
        self.guarded(ctx, "set_bucket_notification", self.client.set_bucket_notification(bucket, config)).await
    }

    /// Clears the bucket's notification rule set
    pub async fn remove_all_bucket_notifications(&self, bucket: &str, ctx: &OpContext) -> StorageResult<()> {
        validate::bucket_name("set_bucket_notification", bucket)?;
        let empty = BucketNotificationConfig::empty();
        self.guarded(ctx, "set_bucket_notification", async move {
            self.client.set_bucket_notification(bucket, &empty).await
        })
        .await
    }
}

/// Shared removal semantics: deleting a missing key is a silent success on
/// the wire, so existence is checked first and absence reported as NotFound.
async fn remove_strict(client: &dyn StorageClient, bucket: &str, key: &str) -> StorageResult<()> {
    match client.stat_object(bucket, key).await {
        Ok(_) => client.remove_object(bucket, key).await,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            Err(StorageError::not_found("remove_object", format!("object {bucket}/{key} does not exist")))
        }
        Err(err) => Err(err),
    }
}
