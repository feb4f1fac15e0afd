//! Error types for research-pulse.
//!
//! All functions return `Result<T, PipelineError>` instead of using `unwrap()`.

use thiserror::Error;

/// Main error type for research-pulse operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Network/HTTP transport error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Upstream returned a non-retryable status (4xx other than 429)
    #[error("upstream error {status}: {body}")]
    Upstream { status: u16, body: String },

    /// XML or JSON body could not be parsed into the expected shape
    #[error("parse error: {0}")]
    Parse(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration (e.g. an empty resolved source set)
    #[error("config error: {0}")]
    Config(String),
}

/// Result type alias using `PipelineError`.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Extension trait for adding parse-error context to `Option`.
pub trait OptionExt<T> {
    fn ok_or_parse(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_parse(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| PipelineError::Parse(msg.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_or_parse_turns_none_into_parse_error() {
        let value: Option<i32> = None;
        let err = value.ok_or_parse("missing title").unwrap_err();
        assert!(matches!(err, PipelineError::Parse(ref m) if m == "missing title"));
    }

    #[test]
    fn ok_or_parse_passes_through_some() {
        let value = Some(42);
        assert_eq!(value.ok_or_parse("unused").unwrap(), 42);
    }
}
