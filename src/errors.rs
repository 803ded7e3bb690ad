use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::SourceId;

/// Error type for ingestion, sampling configuration, IO, and persistence failures.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("event source '{source_id}' is unavailable: {reason}")]
    SourceUnavailable { source_id: SourceId, reason: String },
    #[error("malformed event record {record}: {reason}")]
    MalformedRecord { record: String, reason: String },
    #[error("output file {} already exists", .0.display())]
    OutputExists(PathBuf),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("annotation failed: {0}")]
    Annotation(String),
}
