use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::core::client::storage::{StorageError, StorageResult};

/// Initialize the default logging stack: RUST_LOG-driven filtering over a
/// compact fmt layer. Fails if a global subscriber is already installed.
pub fn init_logging() -> StorageResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    Registry::default()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()
        .map_err(|e| StorageError::unknown("init_logging", e.to_string()))?;

    Ok(())
}
