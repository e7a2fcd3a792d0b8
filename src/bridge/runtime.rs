// In: src/bridge/runtime.rs

//! Process-wide tokio runtime and the blocking bridge onto it.
//!
//! The runtime is started lazily on first use and kept in a [`OnceLock`]. A
//! failed start is cached too, so every later call reports the same error.

use std::any::Any;
use std::future::Future;
use std::sync::OnceLock;

use tokio::runtime::{Builder, Runtime};

use crate::error::BulkCopyError;

static RUNTIME: OnceLock<Result<Runtime, String>> = OnceLock::new();

fn runtime(worker_threads: Option<usize>) -> Result<&'static Runtime, BulkCopyError> {
    let started = RUNTIME.get_or_init(|| {
        let mut builder = Builder::new_multi_thread();
        builder.enable_all().thread_name("arrow-bulkcopy-worker");
        if let Some(threads) = worker_threads {
            builder.worker_threads(threads);
        }
        builder
            .build()
            .map_err(|e| format!("failed to start async runtime: {e}"))
    });
    match started {
        Ok(rt) => Ok(rt),
        Err(message) => Err(BulkCopyError::Internal(message.clone())),
    }
}

/// Runs an async operation to completion from a synchronous caller.
///
/// The future is built and driven on a dedicated scoped thread through the
/// shared runtime's handle, never on the calling thread, so a caller that is
/// itself inside an async context cannot deadlock it. A panic on that thread is
/// returned as [`BulkCopyError::Internal`].
pub fn run_blocking<F, Fut, T>(worker_threads: Option<usize>, make_future: F) -> Result<T, BulkCopyError>
where
    F: FnOnce() -> Fut + Send,
    Fut: Future<Output = Result<T, BulkCopyError>>,
    T: Send,
{
    let handle = runtime(worker_threads)?.handle().clone();
    std::thread::scope(|scope| {
        let worker = std::thread::Builder::new()
            .name("arrow-bulkcopy-call".to_string())
            .spawn_scoped(scope, move || handle.block_on(make_future()))
            .map_err(|e| BulkCopyError::Internal(format!("failed to spawn load thread: {e}")))?;
        worker
            .join()
            .map_err(|payload| BulkCopyError::Internal(panic_message(payload.as_ref())))?
    })
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload");
    format!("load panicked: {detail}")
}
