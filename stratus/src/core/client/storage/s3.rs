use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::Region;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_credential_types::Credentials;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CompletedMultipartUpload, CompletedPart, CreateBucketConfiguration, Event, FilterRule,
    FilterRuleName, LambdaFunctionConfiguration, MetadataDirective, NotificationConfiguration,
    NotificationConfigurationFilter, QueueConfiguration, S3KeyFilter, ServerSideEncryption, TopicConfiguration,
};
use aws_sdk_s3::Client;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncRead, AsyncReadExt};
use url::Url;

use super::error::{ErrorKind, StorageError, StorageResult};
use super::{post_policy, ObjectPage, StorageClient};
use crate::types::notification::{BucketNotificationConfig, EventKind, NotificationRule, NotificationTarget};
use crate::types::object::{
    BucketInfo, ByteRange, CopyOptions, MultipartUploadInfo, ObjectStat, ObjectSummary, PresignedPost, PutOptions,
    SseKind,
};
use crate::types::params::StorageArgs;

const DEFAULT_REGION: &str = "us-east-1";

/// AWS S3 (and S3-compatible) implementation of [`StorageClient`].
///
/// Owns the single backend session; the endpoint and credentials are fixed
/// at construction. Path-style addressing is forced so S3-compatible
/// endpoints (MinIO, localstack) resolve without virtual-host DNS.
#[derive(Clone, Debug)]
pub struct AwsS3 {
    client: Arc<Client>,
    credentials: Option<SharedCredentialsProvider>,
    region: String,
    endpoint: Url,
}

impl AwsS3 {
    /// Builds the backend session described by `args`. Fails fast on
    /// malformed arguments; no degraded client is returned.
    pub async fn connect(args: &StorageArgs) -> StorageResult<Self> {
        args.validate()?;

        let region = args.region.clone().unwrap_or_else(|| DEFAULT_REGION.to_string());
        let region_provider = RegionProviderChain::first_try(Region::new(region.clone())).or_default_provider();
        let loader = aws_config::from_env().region(region_provider).endpoint_url(args.endpoint.as_str());
        let loader = match (&args.access_key, &args.secret_key) {
            (Some(access_key), Some(secret_key)) => loader.credentials_provider(Credentials::from_keys(
                access_key.clone(),
                secret_key.clone(),
                args.session_token.clone(),
            )),
            _ => loader.no_credentials(),
        };
        let sdk_config = loader.load().await;

        let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        s3_config_builder.set_force_path_style(Some(true));
        let client = Client::from_conf(s3_config_builder.build());

        Ok(Self {
            client: Arc::new(client),
            credentials: sdk_config.credentials_provider(),
            region,
            endpoint: args.endpoint.clone(),
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn upload_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        source: &mut (dyn AsyncRead + Send + Unpin),
        size: u64,
        part_size: u64,
    ) -> StorageResult<()> {
        let mut completed = Vec::new();
        let mut part_number: i32 = 1;
        let mut remaining = size;

        while remaining > 0 {
            let chunk_len = remaining.min(part_size) as usize;
            let mut chunk = vec![0u8; chunk_len];
            source.read_exact(&mut chunk).await.map_err(|e| {
                StorageError::unknown("put_object", format!("reading part {part_number} from source failed: {e}"))
                    .with_source(e)
            })?;

            let part = self
                .client
                .upload_part()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .body(ByteStream::from(chunk))
                .send()
                .await
                .map_err(|err| StorageError::from_sdk("put_object", err))?;

            completed.push(CompletedPart::builder().set_e_tag(part.e_tag).part_number(part_number).build());
            tracing::debug!(bucket = %bucket, key = %key, part_number, chunk_len, "uploaded part");

            remaining -= chunk_len as u64;
            part_number += 1;
        }

        self.client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(CompletedMultipartUpload::builder().set_parts(Some(completed)).build())
            .send()
            .await
            .map_err(|err| StorageError::from_sdk("put_object", err))?;

        Ok(())
    }
}

#[async_trait]
impl StorageClient for AwsS3 {
    async fn create_bucket<'a>(&self, name: &str, region: Option<&'a str>) -> StorageResult<()> {
        let region = region.unwrap_or(&self.region);
        let mut request = self.client.create_bucket().bucket(name);
        // us-east-1 is the backend default and must not be sent as a
        // location constraint
        if region != DEFAULT_REGION {
            let constraint = BucketLocationConstraint::from(region);
            request = request
                .create_bucket_configuration(CreateBucketConfiguration::builder().location_constraint(constraint).build());
        }
        request.send().await.map_err(|err| StorageError::from_sdk("create_bucket", err))?;
        tracing::debug!(bucket = %name, region = %region, "created bucket");
        Ok(())
    }

    async fn list_buckets(&self) -> StorageResult<Vec<BucketInfo>> {
        let output = self.client.list_buckets().send().await.map_err(|err| StorageError::from_sdk("list_buckets", err))?;
        let buckets = output
            .buckets
            .unwrap_or_default()
            .into_iter()
            .map(|bucket| BucketInfo {
                name: bucket.name.unwrap_or_default(),
                created_at: bucket.creation_date.and_then(to_chrono),
            })
            .collect();
        Ok(buckets)
    }

    async fn bucket_exists(&self, name: &str) -> StorageResult<bool> {
        match self.client.head_bucket().bucket(name).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                let err = StorageError::from_sdk("bucket_exists", err);
                if err.kind() == ErrorKind::NotFound {
                    Ok(false)
                } else {
                    Err(err)
                }
            }
        }
    }

    async fn remove_bucket(&self, name: &str) -> StorageResult<()> {
        self.client
            .delete_bucket()
            .bucket(name)
            .send()
            .await
            .map_err(|err| StorageError::from_sdk("remove_bucket", err))?;
        tracing::debug!(bucket = %name, "removed bucket");
        Ok(())
    }

    async fn list_objects_page<'a>(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&'a str>,
        continuation: Option<String>,
    ) -> StorageResult<ObjectPage> {
        let mut request = self.client.list_objects_v2().bucket(bucket);
        if !prefix.is_empty() {
            request = request.prefix(prefix);
        }
        if let Some(delimiter) = delimiter {
            request = request.delimiter(delimiter);
        }
        if let Some(token) = continuation {
            request = request.continuation_token(token);
        }

        let output = request.send().await.map_err(|err| StorageError::from_sdk("list_objects", err))?;

        let mut entries = Vec::new();
        for common_prefix in output.common_prefixes.unwrap_or_default() {
            if let Some(prefix) = common_prefix.prefix {
                entries.push(ObjectSummary { key: prefix, size: 0, etag: None, last_modified: None, is_prefix: true });
            }
        }
        for object in output.contents.unwrap_or_default() {
            entries.push(ObjectSummary {
                key: object.key.unwrap_or_default(),
                size: object.size.unwrap_or(0).max(0) as u64,
                etag: object.e_tag,
                last_modified: object.last_modified.and_then(to_chrono),
                is_prefix: false,
            });
        }

        Ok(ObjectPage { entries, next_token: output.next_continuation_token })
    }

    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        range: Option<ByteRange>,
    ) -> StorageResult<Box<dyn AsyncRead + Send + Unpin>> {
        let mut request = self.client.get_object().bucket(bucket).key(key);
        if let Some(range) = range {
            request = request.range(range.to_header());
        }
        let output = request.send().await.map_err(|err| StorageError::from_sdk("get_object", err))?;
        tracing::debug!(bucket = %bucket, key = %key, "opened object for reading");
        Ok(Box::new(output.body.into_async_read()))
    }

    async fn put_object(&self, bucket: &str, key: &str, data: Bytes, opts: PutOptions) -> StorageResult<()> {
        let size = data.len();
        let mut request = self.client.put_object().bucket(bucket).key(key).body(ByteStream::from(data));
        if let Some(content_type) = &opts.content_type {
            request = request.content_type(content_type);
        }
        for (name, value) in &opts.metadata {
            request = request.metadata(name, value);
        }
        match &opts.sse {
            Some(SseKind::Aes256) => request = request.server_side_encryption(ServerSideEncryption::Aes256),
            Some(SseKind::AwsKms { key_id }) => {
                request = request.server_side_encryption(ServerSideEncryption::AwsKms);
                if let Some(key_id) = key_id {
                    request = request.ssekms_key_id(key_id);
                }
            }
            None => {}
        }
        request.send().await.map_err(|err| StorageError::from_sdk("put_object", err))?;
        tracing::debug!(bucket = %bucket, key = %key, size, "put object");
        Ok(())
    }

    async fn put_object_multipart(
        &self,
        bucket: &str,
        key: &str,
        mut source: Box<dyn AsyncRead + Send + Unpin>,
        size: u64,
        part_size: u64,
        opts: PutOptions,
    ) -> StorageResult<()> {
        let mut request = self.client.create_multipart_upload().bucket(bucket).key(key);
        if let Some(content_type) = &opts.content_type {
            request = request.content_type(content_type);
        }
        for (name, value) in &opts.metadata {
            request = request.metadata(name, value);
        }
        match &opts.sse {
            Some(SseKind::Aes256) => request = request.server_side_encryption(ServerSideEncryption::Aes256),
            Some(SseKind::AwsKms { key_id }) => {
                request = request.server_side_encryption(ServerSideEncryption::AwsKms);
                if let Some(key_id) = key_id {
                    request = request.ssekms_key_id(key_id);
                }
            }
            None => {}
        }
        let created = request.send().await.map_err(|err| StorageError::from_sdk("put_object", err))?;
        let upload_id =
            created.upload_id.ok_or_else(|| StorageError::unknown("put_object", "backend returned no upload id"))?;

        tracing::debug!(bucket = %bucket, key = %key, upload_id = %upload_id, size, part_size, "starting multipart upload");

        match self.upload_parts(bucket, key, &upload_id, &mut *source, size, part_size).await {
            Ok(()) => Ok(()),
            Err(err) => {
                // leave no dangling upload behind the failure
                if let Err(abort_err) =
                    self.client.abort_multipart_upload().bucket(bucket).key(key).upload_id(&upload_id).send().await
                {
                    tracing::warn!(bucket = %bucket, key = %key, upload_id = %upload_id, error = ?abort_err, "failed to abort multipart upload");
                }
                Err(err)
            }
        }
    }

    async fn stat_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectStat> {
        let output = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| StorageError::from_sdk("stat_object", err))?;

        Ok(ObjectStat {
            key: key.to_string(),
            size: output.content_length.unwrap_or(0).max(0) as u64,
            content_type: output.content_type,
            etag: output.e_tag,
            last_modified: output.last_modified.and_then(to_chrono),
            metadata: output.metadata.unwrap_or_default(),
            sse: sse_from_head(output.server_side_encryption, output.ssekms_key_id),
            version_id: output.version_id,
        })
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| StorageError::from_sdk("remove_object", err))?;
        tracing::debug!(bucket = %bucket, key = %key, "removed object");
        Ok(())
    }

    async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
        opts: CopyOptions,
    ) -> StorageResult<()> {
        // the copy source is a URL path and must be encoded
        let copy_source = format!("{}/{}", src_bucket, urlencoding::encode(src_key));
        let mut request = self.client.copy_object().copy_source(copy_source).bucket(dst_bucket).key(dst_key);
        if let Some(metadata) = &opts.replace_metadata {
            request = request.metadata_directive(MetadataDirective::Replace);
            for (name, value) in metadata {
                request = request.metadata(name, value);
            }
            if let Some(content_type) = &opts.content_type {
                request = request.content_type(content_type);
            }
        }
        match &opts.sse {
            Some(SseKind::Aes256) => request = request.server_side_encryption(ServerSideEncryption::Aes256),
            Some(SseKind::AwsKms { key_id }) => {
                request = request.server_side_encryption(ServerSideEncryption::AwsKms);
                if let Some(key_id) = key_id {
                    request = request.ssekms_key_id(key_id);
                }
            }
            None => {}
        }
        request.send().await.map_err(|err| StorageError::from_sdk("copy_object", err))?;
        tracing::debug!(src_bucket = %src_bucket, src_key = %src_key, dst_bucket = %dst_bucket, dst_key = %dst_key, "copied object");
        Ok(())
    }

    async fn list_incomplete_uploads(&self, bucket: &str, prefix: &str) -> StorageResult<Vec<MultipartUploadInfo>> {
        let mut uploads = Vec::new();
        let mut key_marker: Option<String> = None;
        let mut upload_id_marker: Option<String> = None;

        loop {
            let mut request = self.client.list_multipart_uploads().bucket(bucket);
            if !prefix.is_empty() {
                request = request.prefix(prefix);
            }
            if let Some(marker) = &key_marker {
                request = request.key_marker(marker);
            }
            if let Some(marker) = &upload_id_marker {
                request = request.upload_id_marker(marker);
            }

            let output =
                request.send().await.map_err(|err| StorageError::from_sdk("list_incomplete_uploads", err))?;

            for upload in output.uploads.unwrap_or_default() {
                uploads.push(MultipartUploadInfo {
                    key: upload.key.unwrap_or_default(),
                    upload_id: upload.upload_id.unwrap_or_default(),
                    initiated: upload.initiated.and_then(to_chrono),
                });
            }

            if output.is_truncated.unwrap_or(false) {
                key_marker = output.next_key_marker;
                upload_id_marker = output.next_upload_id_marker;
            } else {
                return Ok(uploads);
            }
        }
    }

    async fn abort_upload(&self, bucket: &str, key: &str, upload_id: &str) -> StorageResult<()> {
        self.client
            .abort_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(|err| StorageError::from_sdk("remove_incomplete_upload", err))?;
        tracing::debug!(bucket = %bucket, key = %key, upload_id = %upload_id, "aborted multipart upload");
        Ok(())
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expiry: Duration,
        response_overrides: HashMap<String, String>,
    ) -> StorageResult<String> {
        let config = PresigningConfig::expires_in(expiry)
            .map_err(|e| StorageError::invalid_argument("presign_get", e.to_string()))?;
        let mut request = self.client.get_object().bucket(bucket).key(key);
        for (name, value) in response_overrides {
            request = match name.as_str() {
                "response-content-type" => request.response_content_type(value),
                "response-content-disposition" => request.response_content_disposition(value),
                "response-cache-control" => request.response_cache_control(value),
                "response-content-language" => request.response_content_language(value),
                "response-content-encoding" => request.response_content_encoding(value),
                other => {
                    return Err(StorageError::invalid_argument(
                        "presign_get",
                        format!("unsupported response override {other:?}"),
                    ))
                }
            };
        }
        let presigned = request.presigned(config).await.map_err(|err| StorageError::from_sdk("presign_get", err))?;
        Ok(presigned.uri().to_string())
    }

    async fn presign_put(&self, bucket: &str, key: &str, expiry: Duration) -> StorageResult<String> {
        let config = PresigningConfig::expires_in(expiry)
            .map_err(|e| StorageError::invalid_argument("presign_put", e.to_string()))?;
        let presigned = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .presigned(config)
            .await
            .map_err(|err| StorageError::from_sdk("presign_put", err))?;
        Ok(presigned.uri().to_string())
    }

    async fn presign_post(&self, bucket: &str, key: &str, expiry: Duration) -> StorageResult<PresignedPost> {
        let provider = self.credentials.as_ref().ok_or_else(|| {
            StorageError::permission_denied("presign_post", "anonymous clients cannot issue upload grants")
        })?;
        let credentials = provider.provide_credentials().await.map_err(|e| {
            StorageError::permission_denied("presign_post", "could not resolve signing credentials").with_source(e)
        })?;
        post_policy::build_post_policy(&credentials, &self.endpoint, &self.region, bucket, key, Utc::now(), expiry)
    }

    async fn get_bucket_policy(&self, bucket: &str) -> StorageResult<Option<String>> {
        match self.client.get_bucket_policy().bucket(bucket).send().await {
            Ok(output) => Ok(output.policy),
            Err(err) => {
                // an unset policy is an answer, a missing bucket is an error
                let code = err.as_service_error().and_then(|service_err| service_err.meta().code().map(str::to_string));
                if code.as_deref() == Some("NoSuchBucketPolicy") {
                    Ok(None)
                } else {
                    Err(StorageError::from_sdk("get_bucket_policy", err))
                }
            }
        }
    }

    async fn set_bucket_policy(&self, bucket: &str, policy: &str) -> StorageResult<()> {
        self.client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy)
            .send()
            .await
            .map_err(|err| StorageError::from_sdk("set_bucket_policy", err))?;
        tracing::debug!(bucket = %bucket, "set bucket policy");
        Ok(())
    }

    async fn delete_bucket_policy(&self, bucket: &str) -> StorageResult<()> {
        self.client
            .delete_bucket_policy()
            .bucket(bucket)
            .send()
            .await
            .map_err(|err| StorageError::from_sdk("delete_bucket_policy", err))?;
        tracing::debug!(bucket = %bucket, "deleted bucket policy");
        Ok(())
    }

    async fn get_bucket_notification(&self, bucket: &str) -> StorageResult<BucketNotificationConfig> {
        let output = self
            .client
            .get_bucket_notification_configuration()
            .bucket(bucket)
            .send()
            .await
            .map_err(|err| StorageError::from_sdk("get_bucket_notification", err))?;

        let mut rules = Vec::new();
        for config in output.topic_configurations.unwrap_or_default() {
            let (prefix, suffix) = filters_from(config.filter);
            rules.push(NotificationRule {
                id: config.id,
                target: NotificationTarget::Topic(config.topic_arn),
                events: parse_events(&config.events)?,
                prefix,
                suffix,
            });
        }
        for config in output.queue_configurations.unwrap_or_default() {
            let (prefix, suffix) = filters_from(config.filter);
            rules.push(NotificationRule {
                id: config.id,
                target: NotificationTarget::Queue(config.queue_arn),
                events: parse_events(&config.events)?,
                prefix,
                suffix,
            });
        }
        for config in output.lambda_function_configurations.unwrap_or_default() {
            let (prefix, suffix) = filters_from(config.filter);
            rules.push(NotificationRule {
                id: config.id,
                target: NotificationTarget::Lambda(config.lambda_function_arn),
                events: parse_events(&config.events)?,
                prefix,
                suffix,
            });
        }

        Ok(BucketNotificationConfig { rules })
    }

    async fn set_bucket_notification(&self, bucket: &str, config: &BucketNotificationConfig) -> StorageResult<()> {
        let mut topics = Vec::new();
        let mut queues = Vec::new();
        let mut lambdas = Vec::new();

        for rule in &config.rules {
            let events = events_for(rule);
            let filter = filter_for(rule);
            match &rule.target {
                NotificationTarget::Topic(arn) => topics.push(
                    TopicConfiguration::builder()
                        .set_id(rule.id.clone())
                        .topic_arn(arn)
                        .set_events(Some(events))
                        .set_filter(filter)
                        .build()
                        .map_err(|e| StorageError::invalid_argument("set_bucket_notification", e.to_string()))?,
                ),
                NotificationTarget::Queue(arn) => queues.push(
                    QueueConfiguration::builder()
                        .set_id(rule.id.clone())
                        .queue_arn(arn)
                        .set_events(Some(events))
                        .set_filter(filter)
                        .build()
                        .map_err(|e| StorageError::invalid_argument("set_bucket_notification", e.to_string()))?,
                ),
                NotificationTarget::Lambda(arn) => lambdas.push(
                    LambdaFunctionConfiguration::builder()
                        .set_id(rule.id.clone())
                        .lambda_function_arn(arn)
                        .set_events(Some(events))
                        .set_filter(filter)
                        .build()
                        .map_err(|e| StorageError::invalid_argument("set_bucket_notification", e.to_string()))?,
                ),
            }
        }

        let notification_config = NotificationConfiguration::builder()
            .set_topic_configurations(Some(topics))
            .set_queue_configurations(Some(queues))
            .set_lambda_function_configurations(Some(lambdas))
            .build();

        self.client
            .put_bucket_notification_configuration()
            .bucket(bucket)
            .notification_configuration(notification_config)
            .send()
            .await
            .map_err(|err| StorageError::from_sdk("set_bucket_notification", err))?;
        tracing::debug!(bucket = %bucket, rules = config.rules.len(), "set bucket notification configuration");
        Ok(())
    }
}

fn to_chrono(value: aws_smithy_types::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
}

fn sse_from_head(sse: Option<ServerSideEncryption>, key_id: Option<String>) -> Option<SseKind> {
    match sse {
        Some(ServerSideEncryption::Aes256) => Some(SseKind::Aes256),
        Some(ServerSideEncryption::AwsKms) => Some(SseKind::AwsKms { key_id }),
        _ => None,
    }
}

fn events_for(rule: &NotificationRule) -> Vec<Event> {
    rule.events.iter().map(|event| Event::from(event.as_str())).collect()
}

fn parse_events(events: &[Event]) -> StorageResult<Vec<EventKind>> {
    events.iter().map(|event| event.as_str().parse()).collect()
}

fn filter_for(rule: &NotificationRule) -> Option<NotificationConfigurationFilter> {
    if rule.prefix.is_none() && rule.suffix.is_none() {
        return None;
    }
    let mut filter_rules = Vec::new();
    if let Some(prefix) = &rule.prefix {
        filter_rules.push(FilterRule::builder().name(FilterRuleName::Prefix).value(prefix).build());
    }
    if let Some(suffix) = &rule.suffix {
        filter_rules.push(FilterRule::builder().name(FilterRuleName::Suffix).value(suffix).build());
    }
    Some(
        NotificationConfigurationFilter::builder()
            .key(S3KeyFilter::builder().set_filter_rules(Some(filter_rules)).build())
            .build(),
    )
}

fn filters_from(filter: Option<NotificationConfigurationFilter>) -> (Option<String>, Option<String>) {
    let mut prefix = None;
    let mut suffix = None;
    if let Some(key_filter) = filter.and_then(|f| f.key) {
        for rule in key_filter.filter_rules.unwrap_or_default() {
            match rule.name {
                Some(FilterRuleName::Prefix) => prefix = rule.value,
                Some(FilterRuleName::Suffix) => suffix = rule.value,
                _ => {}
            }
        }
    }
    (prefix, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> NotificationRule {
        NotificationRule::new(
            NotificationTarget::Topic("arn:aws:sns:us-east-1:123456789012:events".to_string()),
            vec![EventKind::ObjectCreatedPut, EventKind::ObjectRemovedDelete],
        )
        .with_prefix("images/")
        .with_suffix(".png")
    }

    #[test]
    fn events_map_to_wire_names() {
        let events = events_for(&rule());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].as_str(), "s3:ObjectCreated:Put");
        assert_eq!(events[1].as_str(), "s3:ObjectRemoved:Delete");
    }

    #[test]
    fn wire_events_parse_back() {
        let events = events_for(&rule());
        let kinds = parse_events(&events).expect("known events");
        assert_eq!(kinds, vec![EventKind::ObjectCreatedPut, EventKind::ObjectRemovedDelete]);
    }

    #[test]
    fn filter_round_trips_prefix_and_suffix() {
        let filter = filter_for(&rule());
        let (prefix, suffix) = filters_from(filter);
        assert_eq!(prefix.as_deref(), Some("images/"));
        assert_eq!(suffix.as_deref(), Some(".png"));
    }

    #[test]
    fn rules_without_filters_build_none() {
        let bare = NotificationRule::new(
            NotificationTarget::Queue("arn:aws:sqs:us-east-1:123456789012:q".to_string()),
            vec![EventKind::ObjectCreatedAll],
        );
        assert!(filter_for(&bare).is_none());
    }

    #[test]
    fn sse_descriptor_maps_kms_key() {
        let sse = sse_from_head(Some(ServerSideEncryption::AwsKms), Some("key-1".to_string()));
        assert_eq!(sse, Some(SseKind::AwsKms { key_id: Some("key-1".to_string()) }));
        assert_eq!(sse_from_head(None, None), None);
        assert_eq!(sse_from_head(Some(ServerSideEncryption::Aes256), None), Some(SseKind::Aes256));
    }
}
