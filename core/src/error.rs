use std::path::PathBuf;

use thiserror::Error;

/// Malformed options or pipeline input, caught before any pixel work.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// 1-based index of the offending pipeline step, when there is one.
    pub step: Option<usize>,
    /// Offending option fields, when the failure is about flat options.
    pub fields: Vec<String>,
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            step: None,
            fields: Vec::new(),
            message: message.into(),
        }
    }

    pub fn at_step(step: usize, message: impl Into<String>) -> Self {
        Self {
            step: Some(step),
            fields: Vec::new(),
            message: message.into(),
        }
    }

    pub fn for_fields(fields: Vec<String>, messages: Vec<String>) -> Self {
        Self {
            step: None,
            fields,
            message: messages.join("; "),
        }
    }
}

/// Failure inside the codec capability.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("transform failed: {0}")]
    Transform(String),

    #[error("encoding failed: {0}")]
    Encode(String),

    #[error("optimization failed: {0}")]
    Optimize(String),

    #[error("metadata rewrite failed: {0}")]
    Metadata(String),
}

/// Loader-side failures, kept apart from processing failures.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("failed to download image from {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("failed to read file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("input exceeds the {limit_kind} limit: {actual} > {limit}")]
    Oversize {
        limit_kind: &'static str,
        actual: u64,
        limit: u64,
    },

    #[error("invalid image data: {0}")]
    InvalidData(String),

    #[error("failed to process the image: {0}")]
    Processing(#[from] CodecError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}

impl EngineError {
    /// Stable kind string for callers that map errors onto responses.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "VALIDATION_ERROR",
            EngineError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            EngineError::Oversize { .. } => "FILE_TOO_LARGE",
            EngineError::InvalidData(_) => "INVALID_IMAGE",
            EngineError::Processing(_) => "PROCESSING_ERROR",
            EngineError::Retrieval(RetrievalError::Download { .. }) => "INVALID_URL",
            EngineError::Retrieval(RetrievalError::Read { .. }) => "READ_ERROR",
        }
    }
}
