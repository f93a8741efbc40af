use thiserror::Error;

pub type TrainingResult<T> = std::result::Result<T, TrainingError>;

#[derive(Debug, Error)]
pub enum TrainingError {
    /// A comparison item is missing a required field.
    #[error("validation error: {0}")]
    Validation(String),

    /// An import payload does not have the dataset record shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// A training configuration is missing required fields or is out of range.
    #[error("invalid training config: {0}")]
    Config(String),

    #[error("training job {job_id} is already running")]
    AlreadyRunning { job_id: String },

    #[error("comparison item not found: {0}")]
    ItemNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
