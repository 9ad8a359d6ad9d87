//! Presigned-grant operations. Expiry bounds are enforced here, at
//! generation time, never deferred to use time.

use std::collections::HashMap;
use std::time::Duration;

use super::{validate, ObjectStore};
use crate::core::client::storage::{StorageError, StorageResult};
use crate::types::object::PresignedPost;
use crate::types::params::OpContext;

/// Backend-imposed ceiling on presigned grants (7 days)
pub const MAX_PRESIGN_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// The signed `response-*` overrides a presigned GET may carry
const SUPPORTED_RESPONSE_OVERRIDES: &[&str] = &[
    "response-content-type",
    "response-content-disposition",
    "response-cache-control",
    "response-content-language",
    "response-content-encoding",
];

fn validate_expiry(operation: &'static str, expiry: Duration) -> StorageResult<()> {
    if expiry.is_zero() {
        return Err(StorageError::invalid_argument(operation, "expiry must be in the future"));
    }
    if expiry > MAX_PRESIGN_EXPIRY {
        return Err(StorageError::invalid_argument(
            operation,
            format!("expiry exceeds the backend maximum of {} seconds", MAX_PRESIGN_EXPIRY.as_secs()),
        ));
    }
    Ok(())
}

impl ObjectStore {
    /// Generates a presigned download URL. `extra_params` may carry the
    /// signed `response-*` overrides (content type, disposition, cache
    /// control, language, encoding); anything else is rejected.
    pub async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expiry: Duration,
        extra_params: HashMap<String, String>,
        ctx: &OpContext,
    ) -> StorageResult<String> {
        validate::bucket_name("presign_get", bucket)?;
        validate::object_key("presign_get", key)?;
        validate_expiry("presign_get", expiry)?;
        for name in extra_params.keys() {
            if !SUPPORTED_RESPONSE_OVERRIDES.contains(&name.as_str()) {
                return Err(StorageError::invalid_argument(
                    "presign_get",
                    format!("unsupported response override {name:?}"),
                ));
            }
        }
        self.guarded(ctx, "presign_get", self.client.presign_get(bucket, key, expiry, extra_params)).await
    }

    /// Generates a presigned upload URL
    pub async fn presign_put(
        &self,
        bucket: &str,
        key: &str,
        expiry: Duration,
        ctx: &OpContext,
    ) -> StorageResult<String> {
        validate::bucket_name("presign_put", bucket)?;
        validate::object_key("presign_put", key)?;
        validate_expiry("presign_put", expiry)?;
        self.guarded(ctx, "presign_put", self.client.presign_put(bucket, key, expiry)).await
    }

    /// Generates a POST-policy grant for a direct browser form upload
    pub async fn presign_post_policy(
        &self,
        bucket: &str,
        key: &str,
        expiry: Duration,
        ctx: &OpContext,
    ) -> StorageResult<PresignedPost> {
        validate::bucket_name("presign_post", bucket)?;
        validate::object_key("presign_post", key)?;
        validate_expiry("presign_post", expiry)?;
        self.guarded(ctx, "presign_post", self.client.presign_post(bucket, key, expiry)).await
    }
}
