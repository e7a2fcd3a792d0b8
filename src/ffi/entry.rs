//! Exported C entry points.
//!
//! Nothing unwinds out of these functions: every failure, including a panic,
//! becomes [`EXIT_FAILURE`] plus best-effort diagnostic text.

use std::os::raw::{c_char, c_int};
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use crate::bridge::{self, runtime::panic_message};
use crate::config::LoaderConfig;
use crate::error::BulkCopyError;
use crate::ffi::buffer::with_foreign_buffer;
use crate::ffi::strings::{decode_text, write_truncated};
use crate::loader::{BulkLoader, PostgresLoader};

pub const EXIT_SUCCESS: c_int = 0;
pub const EXIT_FAILURE: c_int = -1;

/// Raw arguments of one `arrow_bulkcopy_write` call, exactly as received.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawWrite {
    pub buffer: *const u8,
    pub buffer_length: c_int,
    pub connection_string: *const c_char,
    pub table_name: *const c_char,
    pub timeout_seconds: c_int,
}

/// Validates `raw` in order (buffer, buffer length, connection string, table
/// name, timeout), then calls `resolve` for the configuration and loader and
/// runs the load through the blocking bridge. `resolve` is never called for
/// invalid arguments.
///
/// # Safety
///
/// Pointers in `raw` must satisfy the contracts of [`with_foreign_buffer`] and
/// [`decode_text`].
pub(crate) unsafe fn write_with_loader<L, F>(raw: RawWrite, resolve: F) -> Result<u64, BulkCopyError>
where
    L: BulkLoader,
    F: FnOnce() -> Result<(LoaderConfig, L), BulkCopyError>,
{
    with_foreign_buffer(raw.buffer, raw.buffer_length, |buffer| -> Result<u64, BulkCopyError> {
        let connection_string = unsafe { decode_text(raw.connection_string, "connection_string")? };
        let table_name = unsafe { decode_text(raw.table_name, "table_name")? };
        let timeout = u64::try_from(raw.timeout_seconds).map_err(|_| {
            BulkCopyError::invalid_argument("timeout_seconds", "must not be negative")
        })?;

        let (config, loader) = resolve()?;
        bridge::write_blocking_with(
            &loader,
            &config,
            buffer.as_bytes(),
            &connection_string,
            &table_name,
            Duration::from_secs(timeout),
        )
    })?
}

/// Collapses a result into an exit code, marshaling the diagnostic on failure.
///
/// # Safety
///
/// See [`write_truncated`].
pub(crate) unsafe fn exit_code(
    result: Result<u64, BulkCopyError>,
    diagnostic: *mut c_char,
    diagnostic_max_length: c_int,
) -> c_int {
    match result {
        Ok(_) => EXIT_SUCCESS,
        Err(err) => {
            bulkcopy_log!(
                log::Level::Error,
                "write_failed",
                "invalid_argument={} error={}",
                err.is_invalid_argument(),
                err
            );
            write_truncated(&err.diagnostic(), diagnostic, diagnostic_max_length);
            EXIT_FAILURE
        }
    }
}

/// Bulk-loads the first record batch of an Arrow IPC stream into a table.
///
/// Returns `0` on success and `-1` on any failure. On failure, when
/// `diagnostic` is non-null and `diagnostic_max_length > 0`, up to
/// `diagnostic_max_length` bytes of UTF-8 error text (with its causal chain)
/// are written there; the buffer is left untouched on success.
///
/// # Safety
///
/// - `buffer` must point to `buffer_length` readable bytes, valid and unchanged
///   until this function returns.
/// - `connection_string` and `table_name` must be NUL-terminated strings.
/// - `diagnostic` must be writable for `diagnostic_max_length` bytes.
#[no_mangle]
pub unsafe extern "C" fn arrow_bulkcopy_write(
    buffer: *const u8,
    buffer_length: c_int,
    connection_string: *const c_char,
    table_name: *const c_char,
    timeout_seconds: c_int,
    diagnostic: *mut c_char,
    diagnostic_max_length: c_int,
) -> c_int {
    let raw = RawWrite {
        buffer,
        buffer_length,
        connection_string,
        table_name,
        timeout_seconds,
    };
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| unsafe {
        write_with_loader(raw, || {
            let config = LoaderConfig::from_env()?;
            Ok((config.clone(), PostgresLoader::new(config)))
        })
    }));
    let result = outcome.unwrap_or_else(|payload| {
        Err(BulkCopyError::Internal(panic_message(payload.as_ref())))
    });
    exit_code(result, diagnostic, diagnostic_max_length)
}

/// Turns on `Info` logging for the process, appending to `log_file` when it is
/// non-null. Returns `0`, or `-1` if the path is not valid UTF-8 or the file
/// cannot be opened.
///
/// # Safety
///
/// `log_file` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn arrow_bulkcopy_enable_logging(log_file: *const c_char) -> c_int {
    let path = if log_file.is_null() {
        None
    } else {
        match decode_text(log_file, "log_file") {
            Ok(path) => Some(path),
            Err(_) => return EXIT_FAILURE,
        }
    };
    match crate::observability::enable_verbose_logging(path.as_deref()) {
        Ok(()) => EXIT_SUCCESS,
        Err(_) => EXIT_FAILURE,
    }
}

/// Static, NUL-terminated library version.
#[no_mangle]
pub extern "C" fn arrow_bulkcopy_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr().cast()
}
