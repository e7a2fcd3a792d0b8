// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the typed, in-process API of the library. Both foreign surfaces
// (the C ABI in `ffi::entry`, and the optional Python module) are thin adapters
// over it.
//
//   1. [Async surface (write_async / write_async_with)]
//         |  validates arguments, resolves config, accepts a CancellationToken
//         `-> pipeline::run_load(loader, request, cancel)
//
//   2. [Sync surface (write_blocking / write_blocking_with)]
//         |  no cancellation channel
//         `-> runtime::run_blocking(|| async surface)
//
// Failures are structured `BulkCopyError`s here; they are only flattened into an
// exit code plus diagnostic text at the C boundary.
// ====================================================================================

pub mod runtime;

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::LoaderConfig;
use crate::error::BulkCopyError;
use crate::loader::{BulkLoader, ConnectionString, PostgresLoader};
use crate::pipeline::{self, LoadRequest};

pub use runtime::run_blocking;

/// Rejects text that is empty or whitespace only.
pub(crate) fn require_text<'a>(argument: &'static str, value: &'a str) -> Result<&'a str, BulkCopyError> {
    if value.trim().is_empty() {
        return Err(BulkCopyError::invalid_argument(
            argument,
            "must not be null or empty",
        ));
    }
    Ok(value)
}

/// Rejects an empty buffer, then blank connection string or table name.
fn check_arguments(
    buffer: &[u8],
    connection_string: &str,
    table_name: &str,
) -> Result<(), BulkCopyError> {
    if buffer.is_empty() {
        return Err(BulkCopyError::invalid_argument("buffer", "must not be empty"));
    }
    require_text("connection_string", connection_string)?;
    require_text("table_name", table_name)?;
    Ok(())
}

/// Loads `buffer` (an Arrow IPC stream) into `table_name` using `loader`.
///
/// `timeout` bounds the bulk write only; `Duration::ZERO` selects the loader's
/// default. Returns the number of rows written.
pub async fn write_async_with<L: BulkLoader>(
    loader: &L,
    config: &LoaderConfig,
    buffer: &[u8],
    connection_string: &str,
    table_name: &str,
    timeout: Duration,
    cancel: CancellationToken,
) -> Result<u64, BulkCopyError> {
    check_arguments(buffer, connection_string, table_name)?;
    let connection = ConnectionString::new(connection_string);

    let request = LoadRequest {
        buffer,
        connection: &connection,
        destination: table_name,
        timeout,
        batch_policy: config.batch_policy,
    };
    pipeline::run_load(loader, request, &cancel).await
}

/// [`write_async_with`] against PostgreSQL, configured from the environment.
///
/// Arguments are validated before the environment is read.
pub async fn write_async(
    buffer: &[u8],
    connection_string: &str,
    table_name: &str,
    timeout: Duration,
    cancel: CancellationToken,
) -> Result<u64, BulkCopyError> {
    check_arguments(buffer, connection_string, table_name)?;
    let config = LoaderConfig::from_env()?;
    let loader = PostgresLoader::new(config.clone());
    write_async_with(
        &loader,
        &config,
        buffer,
        connection_string,
        table_name,
        timeout,
        cancel,
    )
    .await
}

/// Blocking form of [`write_async_with`]. Runs on the shared runtime; cannot be cancelled.
pub fn write_blocking_with<L: BulkLoader>(
    loader: &L,
    config: &LoaderConfig,
    buffer: &[u8],
    connection_string: &str,
    table_name: &str,
    timeout: Duration,
) -> Result<u64, BulkCopyError> {
    run_blocking(config.worker_threads, || {
        write_async_with(
            loader,
            config,
            buffer,
            connection_string,
            table_name,
            timeout,
            CancellationToken::new(),
        )
    })
}

/// Blocking form of [`write_async`].
pub fn write_blocking(
    buffer: &[u8],
    connection_string: &str,
    table_name: &str,
    timeout: Duration,
) -> Result<u64, BulkCopyError> {
    check_arguments(buffer, connection_string, table_name)?;
    let config = LoaderConfig::from_env()?;
    let loader = PostgresLoader::new(config.clone());
    write_blocking_with(&loader, &config, buffer, connection_string, table_name, timeout)
}
