//! Error types for collaborator calls, run validation, and isolated item failures.

use thiserror::Error;

/// Failure of one collaborator call (search, byte fetch, decode, analysis).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("response is missing `{0}`")]
    MissingField(&'static str),

    #[error("{0}")]
    Other(String),
}

impl ServiceError {
    /// Free-form error, mostly for collaborators that are not HTTP backed.
    pub fn other(msg: impl Into<String>) -> Self {
        ServiceError::Other(msg.into())
    }
}

/// Rejections raised by [`ImageStore::run`](crate::pipeline::ImageStore::run) before any I/O is issued.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RunError {
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument { name: &'static str, reason: String },
}

/// Which step of an item's processing failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchStage {
    Thumbnail,
    Decode,
    FullImage,
    Analysis,
}

impl std::fmt::Display for FetchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FetchStage::Thumbnail => "thumbnail download",
            FetchStage::Decode => "thumbnail decode",
            FetchStage::FullImage => "full image download",
            FetchStage::Analysis => "image analysis",
        };
        f.write_str(s)
    }
}

/// A failure isolated to one item (or one detail branch). Logged as a warning, never propagated.
#[derive(Debug, Error)]
#[error("{stage} failed: {error}")]
pub struct ItemFailure {
    pub stage: FetchStage,
    #[source]
    pub error: ServiceError,
}

impl ItemFailure {
    pub fn new(stage: FetchStage, error: ServiceError) -> Self {
        Self { stage, error }
    }
}
