// In: src/loader/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Loader Seam
// ====================================================================================
//
// The pipeline never talks to a database driver directly. It drives a `BulkLoader`
// through exactly two suspension points:
//
//   1. open(connection string)            -> Connection      (pipeline: Connecting)
//   2. write(connection, table, rows)     -> rows written    (pipeline: BulkWriting)
//
// Timeout and cancellation are applied by the pipeline around these calls, so a
// loader only has to do the I/O. Partial-write semantics are the loader's own.
// ====================================================================================

pub mod postgres;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::BoxError;
use crate::pipeline::RowSource;

pub use postgres::PostgresLoader;

/// Destination connection string. Holds credentials, so it never prints its contents.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionString(String);

impl ConnectionString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ConnectionString(<redacted>)")
    }
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// A bulk-load client for one kind of destination store.
#[async_trait]
pub trait BulkLoader: Send + Sync {
    type Connection: Send;

    /// Timeout applied to [`BulkLoader::write`] when the caller asks for the default.
    fn default_timeout(&self) -> Duration;

    async fn open(&self, connection: &ConnectionString) -> Result<Self::Connection, BoxError>;

    /// Streams every row of `rows` into `destination`, returning the rows written.
    async fn write(
        &self,
        connection: &mut Self::Connection,
        destination: &str,
        rows: RowSource,
    ) -> Result<u64, BoxError>;
}
