use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Closed failure taxonomy. Every backend failure maps to exactly one kind;
/// anything unclassifiable becomes [`ErrorKind::Unknown`] with the original
/// message preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The bucket, object, or upload does not exist
    NotFound,
    /// The bucket (or object) already exists
    AlreadyExists,
    /// The bucket still contains objects and cannot be removed
    NotEmpty,
    /// A caller-supplied parameter was rejected, locally or by the backend
    InvalidArgument,
    /// The credentials do not permit the operation
    PermissionDenied,
    /// The backend could not be reached or is overloaded
    BackendUnavailable,
    /// The operation was cancelled or its deadline elapsed before completion
    Cancelled,
    /// Everything else
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::AlreadyExists => "already exists",
            ErrorKind::NotEmpty => "not empty",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::PermissionDenied => "permission denied",
            ErrorKind::BackendUnavailable => "backend unavailable",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A storage failure: the taxonomy kind, the operation that failed, and the
/// original backend error as the cause when there is one.
#[derive(Debug, Error)]
#[error("{operation}: {kind}: {message}")]
pub struct StorageError {
    kind: ErrorKind,
    operation: &'static str,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl StorageError {
    pub fn new(kind: ErrorKind, operation: &'static str, message: impl Into<String>) -> Self {
        Self { kind, operation, message: message.into(), source: None }
    }

    /// Attach the originating error for diagnostics
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn not_found(operation: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, operation, message)
    }

    pub fn already_exists(operation: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyExists, operation, message)
    }

    pub fn not_empty(operation: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotEmpty, operation, message)
    }

    pub fn invalid_argument(operation: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, operation, message)
    }

    pub fn permission_denied(operation: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PermissionDenied, operation, message)
    }

    pub fn backend_unavailable(operation: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BackendUnavailable, operation, message)
    }

    pub fn cancelled(operation: &'static str) -> Self {
        Self::new(ErrorKind::Cancelled, operation, "operation cancelled")
    }

    pub fn unknown(operation: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, operation, message)
    }

    /// The single translation point from SDK failures into the taxonomy.
    /// Classifies by the backend error code first, the HTTP status second;
    /// transport failures become [`ErrorKind::BackendUnavailable`].
    pub(crate) fn from_sdk<E>(operation: &'static str, err: SdkError<E>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    {
        let kind = classify_sdk(&err);
        let message = match err.meta().message() {
            Some(message) => message.to_string(),
            None => err.to_string(),
        };
        Self { kind, operation, message, source: Some(Box::new(err)) }
    }
}

fn classify_sdk<E>(err: &SdkError<E>) -> ErrorKind
where
    E: ProvideErrorMetadata,
{
    match err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => ErrorKind::BackendUnavailable,
        SdkError::ServiceError(ctx) => {
            let status = ctx.raw().status().as_u16();
            classify(err.meta().code(), Some(status))
        }
        _ => classify(err.meta().code(), None),
    }
}

/// Maps an S3 error code and/or HTTP status to a taxonomy kind
fn classify(code: Option<&str>, status: Option<u16>) -> ErrorKind {
    if let Some(code) = code {
        match code {
            "NoSuchBucket" | "NoSuchKey" | "NoSuchUpload" | "NoSuchBucketPolicy" | "NotFound" => {
                return ErrorKind::NotFound
            }
            "BucketAlreadyExists" | "BucketAlreadyOwnedByYou" => return ErrorKind::AlreadyExists,
            "BucketNotEmpty" => return ErrorKind::NotEmpty,
            "InvalidBucketName" | "InvalidArgument" | "InvalidRange" | "InvalidPart" | "InvalidPartOrder"
            | "MalformedPolicy" | "MalformedXML" | "EntityTooSmall" | "EntityTooLarge" | "KeyTooLongError" => {
                return ErrorKind::InvalidArgument
            }
            "AccessDenied" | "AccountProblem" | "InvalidAccessKeyId" | "SignatureDoesNotMatch" | "ExpiredToken"
            | "TokenRefreshRequired" => return ErrorKind::PermissionDenied,
            "SlowDown" | "ServiceUnavailable" | "InternalError" | "RequestTimeout" => {
                return ErrorKind::BackendUnavailable
            }
            _ => {}
        }
    }

    match status {
        Some(404) => ErrorKind::NotFound,
        Some(401) | Some(403) => ErrorKind::PermissionDenied,
        Some(409) => ErrorKind::AlreadyExists,
        Some(400) => ErrorKind::InvalidArgument,
        Some(status) if status >= 500 => ErrorKind::BackendUnavailable,
        _ => ErrorKind::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("NoSuchBucket"), Some(404), ErrorKind::NotFound)]
    #[case(Some("NoSuchKey"), Some(404), ErrorKind::NotFound)]
    #[case(Some("NoSuchBucketPolicy"), Some(404), ErrorKind::NotFound)]
    #[case(Some("BucketAlreadyOwnedByYou"), Some(409), ErrorKind::AlreadyExists)]
    #[case(Some("BucketNotEmpty"), Some(409), ErrorKind::NotEmpty)]
    #[case(Some("AccessDenied"), Some(403), ErrorKind::PermissionDenied)]
    #[case(Some("SlowDown"), Some(503), ErrorKind::BackendUnavailable)]
    #[case(Some("InvalidRange"), Some(416), ErrorKind::InvalidArgument)]
    #[case(Some("SomethingNovel"), Some(418), ErrorKind::Unknown)]
    fn classifies_by_code_first(#[case] code: Option<&str>, #[case] status: Option<u16>, #[case] expected: ErrorKind) {
        assert_eq!(classify(code, status), expected);
    }

    #[rstest]
    #[case(Some(404), ErrorKind::NotFound)]
    #[case(Some(403), ErrorKind::PermissionDenied)]
    #[case(Some(401), ErrorKind::PermissionDenied)]
    #[case(Some(409), ErrorKind::AlreadyExists)]
    #[case(Some(400), ErrorKind::InvalidArgument)]
    #[case(Some(500), ErrorKind::BackendUnavailable)]
    #[case(Some(503), ErrorKind::BackendUnavailable)]
    #[case(Some(200), ErrorKind::Unknown)]
    #[case(None, ErrorKind::Unknown)]
    fn falls_back_to_status(#[case] status: Option<u16>, #[case] expected: ErrorKind) {
        assert_eq!(classify(None, status), expected);
    }

    #[test]
    fn display_carries_operation_kind_and_message() {
        let err = StorageError::not_found("stat_object", "object data/a.txt does not exist");
        assert_eq!(err.to_string(), "stat_object: not found: object data/a.txt does not exist");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.operation(), "stat_object");
    }

    #[test]
    fn source_is_preserved() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err = StorageError::unknown("get_object", "stream failed").with_source(io);
        assert!(std::error::Error::source(&err).is_some());
    }
}
