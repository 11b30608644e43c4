// Error kinds surfaced by the model handler.
//
// Every failure is fatal for the request that hit it. Causes are kept as
// `source` so the host can log the full chain instead of a bare "load failed".

use std::path::PathBuf;

use thiserror::Error;

use crate::handler::ModelKind;

#[derive(Debug, Error)]
pub enum HandlerError {
    /// An expected file (params file or model artifact) is not on disk. When
    /// no params file matches, the path is the `*-params.json` glob.
    #[error("Missing {} file.", .0.display())]
    MissingArtifact(PathBuf),

    /// More than one `*-params.json` file, so the model type is ambiguous.
    #[error("Found {} parameter files in {}: {candidates:?}", .candidates.len(), .dir.display())]
    AmbiguousParamsFile {
        dir: PathBuf,
        candidates: Vec<PathBuf>,
    },

    #[error("Model {0} not supported!")]
    UnsupportedModel(String),

    #[error("Failed to initialize {model_type} model")]
    InitializationFailure {
        model_type: String,
        #[source]
        source: Box<HandlerError>,
    },

    #[error("Handler used before initialize() was called")]
    NotInitialized,

    #[error("Context has no `model_dir` system property")]
    MissingModelDir,

    #[error("Missing model parameter `{0}`")]
    MissingParameter(String),

    #[error("Invalid model parameter `{key}`: {reason}")]
    InvalidParameter { key: String, reason: String },

    #[error("Invalid model artifact {}: {reason}", .path.display())]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error("Request {index} payload is not valid UTF-8")]
    InvalidPayload {
        index: usize,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("Request {index} is not a table of paired texts: {reason}")]
    MalformedTable { index: usize, reason: String },

    /// One side of a similarity row had no in-vocabulary tokens left.
    #[error("Row {row} of table {table}: at least one of the documents is empty after filtering")]
    EmptyDocument { table: usize, row: usize },

    /// Stage input was produced for a different model kind.
    #[error("Stage input does not belong to a {expected} model")]
    InputMismatch { expected: ModelKind },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl HandlerError {
    pub(crate) fn invalid_param(key: &str, reason: impl Into<String>) -> Self {
        HandlerError::InvalidParameter {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_artifact(path: &std::path::Path, reason: impl Into<String>) -> Self {
        HandlerError::InvalidArtifact {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = HandlerError> = std::result::Result<T, E>;
