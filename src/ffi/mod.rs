//! Foreign-facing surfaces: the C ABI and, behind the `python` feature, a
//! `pyo3` module. Both delegate to [`crate::bridge`].

pub mod buffer;
pub mod entry;
pub mod strings;

#[cfg(feature = "python")]
pub mod python;

pub use entry::{
    arrow_bulkcopy_enable_logging, arrow_bulkcopy_version, arrow_bulkcopy_write, EXIT_FAILURE,
    EXIT_SUCCESS,
};
