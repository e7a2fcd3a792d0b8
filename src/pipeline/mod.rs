// In: src/pipeline/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Decode-and-Load Pipeline
// ====================================================================================
//
// One pass, no retries of its own:
//
//   Idle -> Connecting -> Reading -> Projecting -> BulkWriting -> Done
//              |            |           |              |
//              `------------+-----------+--------------+--> Failed
//
//   Connecting   loader.open()                 suspends; honours cancellation
//   Reading      decode_stream(&buffer)        pure, in memory
//   Projecting   project(schema, batches)      pure, in memory
//   BulkWriting  loader.write(rows)            suspends; timeout + cancellation
//
// Every failure leaves the pipeline exactly once, as a `BulkCopyError`.
// ====================================================================================

pub mod decode;
pub mod project;

use std::fmt;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::BatchPolicy;
use crate::error::BulkCopyError;
use crate::loader::{BulkLoader, ConnectionString};

pub use decode::{decode_stream, Decoded};
pub use project::{project, Row, RowSource, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Connecting,
    Reading,
    Projecting,
    BulkWriting,
    Done,
    Failed,
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoadState::Idle => "idle",
            LoadState::Connecting => "connecting",
            LoadState::Reading => "reading",
            LoadState::Projecting => "projecting",
            LoadState::BulkWriting => "bulk_writing",
            LoadState::Done => "done",
            LoadState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Validated inputs for one load. Borrowed for the duration of a single call.
#[derive(Debug)]
pub struct LoadRequest<'a> {
    pub buffer: &'a [u8],
    pub connection: &'a ConnectionString,
    pub destination: &'a str,
    /// Bulk-write timeout; zero selects the loader's default.
    pub timeout: Duration,
    pub batch_policy: BatchPolicy,
}

/// Tracks the current state so failures can be attributed to a stage.
#[derive(Debug)]
struct LoadRun {
    state: LoadState,
}

impl LoadRun {
    fn new() -> Self {
        Self {
            state: LoadState::Idle,
        }
    }

    fn enter(&mut self, next: LoadState) {
        bulkcopy_log!(
            log::Level::Debug,
            "load_transition",
            "from={} to={}",
            self.state,
            next
        );
        self.state = next;
    }
}

/// Runs the decode-and-load pipeline to completion, returning the rows written.
pub async fn run_load<L: BulkLoader>(
    loader: &L,
    request: LoadRequest<'_>,
    cancel: &CancellationToken,
) -> Result<u64, BulkCopyError> {
    let mut run = LoadRun::new();
    match run_stages(&mut run, loader, &request, cancel).await {
        Ok(rows) => Ok(rows),
        Err(err) => {
            bulkcopy_log!(
                log::Level::Warn,
                "load_failed",
                "state={} destination={} error={}",
                run.state,
                request.destination,
                err
            );
            run.enter(LoadState::Failed);
            Err(err)
        }
    }
}

async fn run_stages<L: BulkLoader>(
    run: &mut LoadRun,
    loader: &L,
    request: &LoadRequest<'_>,
    cancel: &CancellationToken,
) -> Result<u64, BulkCopyError> {
    // 1. Connect. The driver's own connect timeout applies here.
    run.enter(LoadState::Connecting);
    let mut connection = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(BulkCopyError::Cancelled("connecting")),
        opened = loader.open(request.connection) => opened.map_err(BulkCopyError::Connection)?,
    };

    // 2. Decode the first (or every, per policy) record batch.
    run.enter(LoadState::Reading);
    let decoded = decode_stream(request.buffer, request.batch_policy)?;

    // 3. Project to rows.
    run.enter(LoadState::Projecting);
    let rows = project(decoded.schema, decoded.batches)?;
    let total_rows = rows.total_rows();

    // 4. Stream the rows to the destination.
    run.enter(LoadState::BulkWriting);
    let timeout = if request.timeout.is_zero() {
        loader.default_timeout()
    } else {
        request.timeout
    };
    let write = tokio::time::timeout(
        timeout,
        loader.write(&mut connection, request.destination, rows),
    );
    let written = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(BulkCopyError::Cancelled("bulk writing")),
        outcome = write => match outcome {
            Ok(Ok(written)) => written,
            Ok(Err(source)) => {
                return Err(BulkCopyError::BulkLoad {
                    destination: request.destination.to_string(),
                    message: "write rejected by destination".to_string(),
                    source: Some(source),
                })
            }
            Err(_elapsed) => {
                return Err(BulkCopyError::BulkLoad {
                    destination: request.destination.to_string(),
                    message: format!("timed out after {:?}", timeout),
                    source: None,
                })
            }
        },
    };

    run.enter(LoadState::Done);
    bulkcopy_log!(
        log::Level::Info,
        "load_done",
        "destination={} rows={} decoded_rows={}",
        request.destination,
        written,
        total_rows
    );
    Ok(written)
}
