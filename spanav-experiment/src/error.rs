use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("Invalid experiment configuration: {0}")]
    InvalidConfig(String),
    #[error("Stimulus catalog contains no stimuli")]
    EmptyCatalog,
    #[error("Invalid participant information: {0}")]
    InvalidParticipant(String),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Failure of an external collaborator (identity service, record sink).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Transport unavailable: {0}")]
    Unavailable(String),
    #[error("Transport write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}
