//! This file is the root of the `arrow_bulkcopy` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of our library (`pipeline`, `loader`, etc.)
//!     so the Rust compiler knows they exist.
//! 2.  Re-exporting the typed API used by Rust callers.
//! 3.  Defining the `#[pymodule]` (behind the `python` feature) which acts as the
//!     entry point when the compiled library is imported into Python.
//!
//! The C ABI itself lives in [`ffi::entry`].

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
mod observability; // Make macros available throughout the crate

pub mod bridge;
pub mod config;
pub mod error;
pub mod ffi;
pub mod loader;
pub mod pipeline;

#[cfg(test)]
mod test_util;

//==================================================================================
// 2. Public Re-exports
//==================================================================================
pub use bridge::{write_async, write_async_with, write_blocking, write_blocking_with};
pub use config::{BatchPolicy, LoaderConfig};
pub use error::BulkCopyError;
pub use loader::{BulkLoader, ConnectionString, PostgresLoader};
pub use observability::enable_verbose_logging;
pub use tokio_util::sync::CancellationToken;

//==================================================================================
// 3. Python Module Definition
//==================================================================================
#[cfg(feature = "python")]
use pyo3::prelude::*;

/// The `arrow_bulkcopy` Python module.
#[cfg(feature = "python")]
#[pymodule]
fn arrow_bulkcopy(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(ffi::python::write_py, m)?)?;

    // --- Expose version string as a module attribute ---
    m.add("__version__", VERSION)?;

    // --- Turn on logging for load state transitions ---
    m.add_function(wrap_pyfunction!(ffi::python::enable_verbose_logging_py, m)?)?;

    Ok(())
}
