//! Tuneflow Training
//!
//! In-memory core of the preference-tuning workbench:
//! - A comparison dataset with import/export (`DatasetStore`)
//! - Preference annotation and a review cursor (`AnnotationSession`)
//! - A simulated, cancellable DPO training job (`TrainingController`)

pub mod annotation;
pub mod controller;
pub mod dataset;
pub mod error;
pub mod job;
pub mod log_buffer;
pub mod metrics;
pub mod progress;
pub mod samples;
pub mod transfer;

pub use annotation::{AnnotationSession, AnnotationSummary};
pub use controller::TrainingController;
pub use dataset::{Annotation, ComparisonItem, DatasetEntry, DatasetRecord, DatasetSnapshot, DatasetStore, ItemId, Preference};
pub use error::{TrainingError, TrainingResult};
pub use job::{JobSnapshot, SimulationSettings, TrainingConfig, TrainingJob, TrainingJobId, TrainingState};
pub use log_buffer::LogBuffer;
pub use metrics::{FixedMetricGenerator, MetricGenerator, RandomMetricGenerator, StepMetrics};
pub use progress::{ProgressEvent, ProgressSink, ProgressUpdate, TracingProgressSink};
pub use samples::add_sample_comparisons;
pub use transfer::{export_file_name, load_dataset_file, read_snapshot_file, write_dataset_file};
