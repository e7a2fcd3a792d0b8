// In: src/ffi/python.rs

use std::time::Duration;

use pyo3::prelude::*;

use crate::bridge;
use crate::observability;

/// Bulk-loads an Arrow IPC stream (`bytes`) into `table_name`.
///
/// Releases the GIL for the whole load. Returns the number of rows written;
/// raises `ValueError` for invalid arguments and `RuntimeError` otherwise.
#[pyfunction]
#[pyo3(name = "write", signature = (buffer, connection_string, table_name, timeout = 0))]
pub fn write_py(
    py: Python,
    buffer: &[u8],
    connection_string: &str,
    table_name: &str,
    timeout: u64,
) -> PyResult<u64> {
    let rows = py.allow_threads(move || {
        bridge::write_blocking(
            buffer,
            connection_string,
            table_name,
            Duration::from_secs(timeout),
        )
    })?;
    Ok(rows)
}

#[pyfunction]
#[pyo3(name = "enable_verbose_logging", signature = (log_file = None))]
pub fn enable_verbose_logging_py(log_file: Option<String>) -> PyResult<()> {
    observability::enable_verbose_logging(log_file.as_deref())?;
    Ok(())
}
