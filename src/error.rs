//! Error types for the inference layer.
//!
//! Loading and running a classifier returns [`Result<T>`], which uses
//! [`PipelineError`] as the error type. The analyzer wraps these in
//! [`ClassifierFailure`](crate::analyzer::ClassifierFailure) so callers know
//! which classifier failed.

use thiserror::Error;

/// A [`Result`](std::result::Result) alias using [`PipelineError`] as the error type.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Everything that can go wrong while loading or running a classifier.
///
/// # Example
///
/// ```rust,no_run
/// use tone_analyzer::error::PipelineError;
///
/// fn handle_error(e: PipelineError) {
///     match &e {
///         PipelineError::Download(_) => {
///             // Hub unreachable or checkpoint missing
///         }
///         PipelineError::Device(_) => {
///             // GPU unavailable - fall back to CPU
///         }
///         PipelineError::Tokenization(_) => {
///             // Bad or oversized input
///         }
///         _ => eprintln!("Internal error: {e}"),
///     }
/// }
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PipelineError {
    /// Network or download failure. Retry may help.
    #[error("{0}")]
    Download(String),

    /// Tokenization failure. Check input text.
    #[error("{0}")]
    Tokenization(String),

    /// Device initialization failure. Fall back to CPU.
    #[error("{0}")]
    Device(String),

    /// Internal error. Report if seen.
    #[error("{0}")]
    Unexpected(String),
}

impl From<hf_hub::api::sync::ApiError> for PipelineError {
    fn from(value: hf_hub::api::sync::ApiError) -> Self {
        PipelineError::Download(format!("HuggingFace API error: {}", value))
    }
}

impl From<candle_core::Error> for PipelineError {
    fn from(value: candle_core::Error) -> Self {
        PipelineError::Unexpected(value.to_string())
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(value: std::io::Error) -> Self {
        PipelineError::Unexpected(value.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(value: serde_json::Error) -> Self {
        PipelineError::Unexpected(value.to_string())
    }
}
