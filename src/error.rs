// In: src/error.rs

//! This module defines the single, unified error type for the arrow-bulkcopy library.
//! It uses the `thiserror` crate; every variant keeps its source so the foreign
//! caller can be handed the full causal chain through [`BulkCopyError::diagnostic`].

use std::error::Error as StdError;
use std::fmt::Write as _;

use thiserror::Error;

/// Boxed error produced by a bulk-loader collaborator.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum BulkCopyError {
    // =========================================================================
    // === Argument & configuration errors (detected before any I/O)
    // =========================================================================
    #[error("invalid argument `{argument}`: {reason}")]
    InvalidArgument {
        argument: &'static str,
        reason: String,
    },

    #[error("invalid loader configuration")]
    Config(#[from] serde_json::Error),

    // =========================================================================
    // === Pipeline stage errors
    // =========================================================================
    /// The Arrow stream could not be decoded or projected into rows.
    #[error("failed to decode arrow stream: {message}")]
    Decode {
        message: String,
        #[source]
        source: Option<arrow::error::ArrowError>,
    },

    /// The destination could not be reached or rejected the credentials.
    #[error("failed to connect to destination")]
    Connection(#[source] BoxError),

    /// The bulk write failed, timed out, or lost its connection mid-write.
    #[error("bulk load into `{destination}` failed: {message}")]
    BulkLoad {
        destination: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("bulk copy was cancelled while {0}")]
    Cancelled(&'static str),

    #[error("internal error (this is a bug): {0}")]
    Internal(String),
}

impl BulkCopyError {
    pub(crate) fn invalid_argument(argument: &'static str, reason: impl Into<String>) -> Self {
        BulkCopyError::InvalidArgument {
            argument,
            reason: reason.into(),
        }
    }

    pub(crate) fn decode(message: impl Into<String>) -> Self {
        BulkCopyError::Decode {
            message: message.into(),
            source: None,
        }
    }

    /// True for failures raised before the pipeline touched the network.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            BulkCopyError::InvalidArgument { .. } | BulkCopyError::Config(_)
        )
    }

    /// Renders the error followed by one `caused by:` line per source.
    ///
    /// This is the text written back into the foreign caller's diagnostic buffer.
    pub fn diagnostic(&self) -> String {
        let mut out = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            let _ = write!(out, "\ncaused by: {cause}");
            source = cause.source();
        }
        out
    }
}

impl From<arrow::error::ArrowError> for BulkCopyError {
    fn from(err: arrow::error::ArrowError) -> Self {
        BulkCopyError::Decode {
            message: "malformed IPC stream".to_string(),
            source: Some(err),
        }
    }
}

#[cfg(feature = "python")]
impl From<BulkCopyError> for pyo3::PyErr {
    fn from(err: BulkCopyError) -> pyo3::PyErr {
        if err.is_invalid_argument() {
            pyo3::exceptions::PyValueError::new_err(err.diagnostic())
        } else {
            pyo3::exceptions::PyRuntimeError::new_err(err.diagnostic())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::error::ArrowError;

    #[test]
    fn diagnostic_includes_the_causal_chain() {
        let err = BulkCopyError::from(ArrowError::ParseError("truncated header".into()));
        let text = err.diagnostic();

        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("failed to decode arrow stream: malformed IPC stream")
        );
        assert!(lines.next().unwrap().starts_with("caused by: "));
        assert!(text.contains("truncated header"));
    }

    #[test]
    fn diagnostic_without_source_is_just_the_message() {
        let err = BulkCopyError::invalid_argument("buffer_length", "must be greater than zero");
        assert_eq!(
            err.diagnostic(),
            "invalid argument `buffer_length`: must be greater than zero"
        );
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn config_error_reports_the_parser_message_once() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let detail = parse_err.to_string();
        let err = BulkCopyError::from(parse_err);

        let text = err.diagnostic();
        assert_eq!(text, format!("invalid loader configuration\ncaused by: {detail}"));
        assert_eq!(text.matches(detail.as_str()).count(), 1);
    }
}
