//! Local parameter validation. Everything here rejects before a network
//! call is made.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::client::storage::{StorageError, StorageResult};

const MAX_KEY_BYTES: usize = 1024;

static VALID_BUCKET_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9\.\-]{1,61}[a-z0-9]$").expect("valid bucket name pattern"));
static IP_ADDRESS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+\.){3}\d+$").expect("valid ip pattern"));

/// Strict bucket naming rules: 3-63 characters, lowercase letters, digits,
/// dots and dashes, no IP addresses, no adjacent punctuation.
pub(crate) fn bucket_name(operation: &'static str, name: &str) -> StorageResult<()> {
    if name.is_empty() {
        return Err(StorageError::invalid_argument(operation, "bucket name cannot be empty"));
    }
    if name.len() < 3 {
        return Err(StorageError::invalid_argument(operation, "bucket name cannot be shorter than 3 characters"));
    }
    if name.len() > 63 {
        return Err(StorageError::invalid_argument(operation, "bucket name cannot be longer than 63 characters"));
    }
    if IP_ADDRESS.is_match(name) {
        return Err(StorageError::invalid_argument(operation, "bucket name cannot be an IP address"));
    }
    if name.contains("..") || name.contains(".-") || name.contains("-.") {
        return Err(StorageError::invalid_argument(
            operation,
            format!("bucket name {name:?} contains adjacent punctuation"),
        ));
    }
    if !VALID_BUCKET_NAME.is_match(name) {
        return Err(StorageError::invalid_argument(operation, format!("bucket name {name:?} contains invalid characters")));
    }
    Ok(())
}

pub(crate) fn object_key(operation: &'static str, key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::invalid_argument(operation, "object key cannot be empty"));
    }
    if key.len() > MAX_KEY_BYTES {
        return Err(StorageError::invalid_argument(
            operation,
            format!("object key cannot be longer than {MAX_KEY_BYTES} bytes"),
        ));
    }
    Ok(())
}

pub(crate) fn byte_range(operation: &'static str, range: &crate::types::object::ByteRange) -> StorageResult<()> {
    if range.length == Some(0) {
        return Err(StorageError::invalid_argument(operation, "range length must be greater than zero"));
    }
    Ok(())
}

pub(crate) fn metadata(operation: &'static str, metadata: &HashMap<String, String>) -> StorageResult<()> {
    if metadata.keys().any(|key| key.is_empty()) {
        return Err(StorageError::invalid_argument(operation, "metadata keys cannot be empty"));
    }
    Ok(())
}
