use std::time::Duration;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::core::client::storage::{StorageError, StorageResult};

/// Smallest part size the backend accepts for multipart uploads (5 MiB)
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

const DEFAULT_MULTIPART_THRESHOLD: u64 = 16 * 1024 * 1024;
const DEFAULT_PART_SIZE: u64 = 8 * 1024 * 1024;

/// Connection parameters for one backend endpoint.
///
/// Everything but the endpoint is optional: omitting the key pair yields an
/// anonymous client. The values are fixed for the lifetime of the client
/// constructed from them.
#[derive(Debug, Clone)]
pub struct StorageArgs {
    pub endpoint: Url,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub region: Option<String>,
    pub session_token: Option<String>,
}

impl StorageArgs {
    pub fn new(endpoint: &str) -> StorageResult<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| StorageError::invalid_argument("connect", format!("malformed endpoint {endpoint:?}: {e}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(StorageError::invalid_argument(
                "connect",
                format!("endpoint scheme must be http or https, got {:?}", endpoint.scheme()),
            ));
        }
        Ok(Self { endpoint, access_key: None, secret_key: None, region: None, session_token: None })
    }

    pub fn with_credentials(mut self, access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_session_token(mut self, session_token: impl Into<String>) -> Self {
        self.session_token = Some(session_token.into());
        self
    }

    /// Reads the connection parameters from `STRATUS_ENDPOINT`,
    /// `STRATUS_ACCESS_KEY`, `STRATUS_SECRET_KEY`, `STRATUS_REGION` and
    /// `STRATUS_SESSION_TOKEN`. Only the endpoint is required.
    pub fn from_env() -> StorageResult<Self> {
        let endpoint = std::env::var("STRATUS_ENDPOINT")
            .map_err(|_| StorageError::invalid_argument("connect", "STRATUS_ENDPOINT is not set"))?;
        let mut args = Self::new(&endpoint)?;
        args.access_key = std::env::var("STRATUS_ACCESS_KEY").ok();
        args.secret_key = std::env::var("STRATUS_SECRET_KEY").ok();
        args.region = std::env::var("STRATUS_REGION").ok();
        args.session_token = std::env::var("STRATUS_SESSION_TOKEN").ok();
        args.validate()?;
        Ok(args)
    }

    /// A half-provided key pair is a configuration mistake, not a request
    /// for anonymous access
    pub(crate) fn validate(&self) -> StorageResult<()> {
        match (&self.access_key, &self.secret_key) {
            (Some(_), None) | (None, Some(_)) => Err(StorageError::invalid_argument(
                "connect",
                "access key and secret key must be provided together",
            )),
            _ => Ok(()),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.access_key.is_none() && self.secret_key.is_none()
    }
}

/// Upload chunking knobs. The facade switches to multipart upload when the
/// source size exceeds `multipart_threshold`; parts are `part_size` bytes.
#[derive(Debug, Clone, Copy)]
pub struct TransferConfig {
    pub multipart_threshold: u64,
    pub part_size: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self { multipart_threshold: DEFAULT_MULTIPART_THRESHOLD, part_size: DEFAULT_PART_SIZE }
    }
}

impl TransferConfig {
    pub(crate) fn validate(&self) -> StorageResult<()> {
        if self.part_size < MIN_PART_SIZE {
            return Err(StorageError::invalid_argument(
                "connect",
                format!("part size must be at least {MIN_PART_SIZE} bytes, got {}", self.part_size),
            ));
        }
        if self.multipart_threshold < self.part_size {
            return Err(StorageError::invalid_argument(
                "connect",
                "multipart threshold must not be smaller than the part size",
            ));
        }
        Ok(())
    }
}

/// Per-call cancellation and deadline controls. The default carries neither:
/// no deadline, not cancellable.
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    pub cancellation: Option<CancellationToken>,
    pub deadline: Option<Duration>,
}

impl OpContext {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self { cancellation: Some(token), deadline: None }
    }

    pub fn with_deadline(deadline: Duration) -> Self {
        Self { cancellation: None, deadline: Some(deadline) }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.as_ref().is_some_and(|token| token.is_cancelled())
    }
}
