//! Error types for the prediction pipeline.
//!
//! Every stage has its own error enum. `PredictionService` folds them into
//! `ServiceError`, which is the only error a caller of the service sees.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Pipeline stage an error or observability record refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Request body schema validation.
    Request,
    /// Base64 + image container decoding.
    Decode,
    /// Grayscale, resize, normalization.
    Canonicalize,
    /// Classifier forward pass.
    Infer,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Request => write!(f, "request"),
            Stage::Decode => write!(f, "decode"),
            Stage::Canonicalize => write!(f, "canonicalize"),
            Stage::Infer => write!(f, "infer"),
        }
    }
}

/// The request body does not match `{"image": "<string>"}`.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("request body is not valid JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),

    #[error("No image data provided")]
    MissingImage,

    #[error("field `image` must be a string")]
    ImageNotString,
}

/// The payload could not be turned into pixels.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("image payload is empty")]
    EmptyPayload,

    #[error("image payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("decoded bytes are not a supported image: {0}")]
    Image(#[from] image::ImageError),
}

/// The decoded image cannot be reduced to the canonical tensor.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CanonicalizationError {
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("unsupported channel count {0}; expected 1 to 4")]
    UnsupportedChannels(u8),

    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferLength { expected: usize, actual: usize },

    #[error("image of {width}x{height} with {channels} channels is too large")]
    TooLarge { width: u32, height: u32, channels: u8 },
}

/// The model artifact could not be loaded. Fatal at startup.
#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("cannot read model artifact {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model artifact {path:?} is incompatible: {reason}")]
    Incompatible { path: PathBuf, reason: String },
}

/// The classifier was invoked with a non-canonical tensor or produced an
/// unusable distribution. Both indicate a defect, never bad user input.
#[derive(Error, Debug, PartialEq)]
pub enum InferenceError {
    #[error("tensor shape {actual:?} (len {len}) does not match {expected:?}")]
    ShapeMismatch {
        expected: [usize; 4],
        actual: [usize; 4],
        len: usize,
    },

    #[error("classifier output is not a probability distribution: {0}")]
    InvalidOutput(String),
}

/// Failure kinds exposed by the service boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequest,
    InternalError,
}

/// Error returned by `PredictionService`.
///
/// `Display` is what gets sent to the client: descriptive for invalid
/// requests, generic for internal errors. The cause of an internal error is
/// kept in `source` for logging only.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{message}")]
    InvalidRequest { stage: Stage, message: String },

    #[error("An error occurred during prediction")]
    Internal {
        stage: Stage,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ServiceError {
    pub fn invalid(stage: Stage, err: impl std::fmt::Display) -> Self {
        ServiceError::InvalidRequest { stage, message: err.to_string() }
    }

    pub fn internal(stage: Stage, err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        ServiceError::Internal { stage, source: err.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            ServiceError::Internal { .. } => ErrorKind::InternalError,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            ServiceError::InvalidRequest { stage, .. } | ServiceError::Internal { stage, .. } => *stage,
        }
    }

    /// HTTP status class for this error: 400 or 500.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidRequest => 400,
            ErrorKind::InternalError => 500,
        }
    }
}

impl From<RequestError> for ServiceError {
    fn from(e: RequestError) -> Self {
        ServiceError::invalid(Stage::Request, e)
    }
}

impl From<DecodeError> for ServiceError {
    fn from(e: DecodeError) -> Self {
        ServiceError::invalid(Stage::Decode, e)
    }
}

impl From<CanonicalizationError> for ServiceError {
    fn from(e: CanonicalizationError) -> Self {
        ServiceError::invalid(Stage::Canonicalize, e)
    }
}

impl From<InferenceError> for ServiceError {
    fn from(e: InferenceError) -> Self {
        ServiceError::internal(Stage::Infer, e)
    }
}
