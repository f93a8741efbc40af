use std::path::PathBuf;
use thiserror::Error;

/// Result type for workflow operations.
pub type WorkflowResult<T> = std::result::Result<T, WorkflowError>;

/// Errors raised by the pipeline catalogue and engine.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// No pipeline with this name in the catalogue.
    #[error("pipeline not found: {0}")]
    PipelineNotFound(String),

    /// No step with this id in the active pipeline.
    #[error("step '{step_id}' not found in pipeline '{pipeline}'")]
    StepNotFound { pipeline: String, step_id: String },

    /// Catalogue content is structurally invalid.
    #[error("invalid catalogue: {0}")]
    InvalidCatalogue(String),

    /// Failed to read a catalogue file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a catalogue file.
    #[error("Failed to parse catalogue at {path}: {message}")]
    Parse { path: PathBuf, message: String },
}
