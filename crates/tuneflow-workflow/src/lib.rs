//! Workflow pipeline dashboard state for tuneflow.
//!
//! Provides the static pipeline catalogue (DPO, RLHF, or custom files) and an
//! engine that tracks the status of each step in the selected pipeline.

pub mod catalogue;
pub mod engine;
pub mod error;
pub mod step;

pub use catalogue::{PipelineCatalogue, PipelineDefinition};
pub use engine::{PipelineEngine, PipelineView, StatusCounts};
pub use error::{WorkflowError, WorkflowResult};
pub use step::{format_elapsed, PipelineStep, StepStatus, WorkflowStep};
