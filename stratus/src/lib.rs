/// Contains the core abstractions: client traits and backend bindings
pub mod core;
/// Contains the facade exposed to callers
pub mod facade;
/// Contains the typed parameters and the data model
pub mod types;
/// Contains utility modules
pub mod utils;

#[cfg(test)]
mod tests;

// Re-export commonly used items
pub use crate::core::client::storage::{AwsS3, ErrorKind, StorageClient, StorageError, StorageResult};
pub use facade::ObjectStore;
pub use types::object::{
    BucketInfo, ByteRange, CopyOptions, MultipartUploadInfo, ObjectStat, ObjectSummary, PresignedPost, PutOptions,
    PutSource, RemoveFailure, SseKind,
};
pub use types::params::{OpContext, StorageArgs, TransferConfig};

/// Initialize the stratus library
pub fn init() -> StorageResult<()> {
    // Initialize logging
    utils::logging::init_logging()?;

    Ok(())
}
