use crate::job::{JobSnapshot, TrainingJobId, TrainingState};
use serde::{Deserialize, Serialize};

/// Per-tick view consumed by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub state: TrainingState,
    pub current_epoch: u64,
    pub current_step: u64,
    pub total_steps: u64,
    pub progress_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_log_line: Option<String>,
}

impl From<&JobSnapshot> for ProgressUpdate {
    fn from(snapshot: &JobSnapshot) -> Self {
        Self {
            state: snapshot.state,
            current_epoch: snapshot.current_epoch,
            current_step: snapshot.current_step,
            total_steps: snapshot.total_steps,
            progress_percent: snapshot.progress_percent,
            last_log_line: snapshot.last_log_line().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Started { job_id: TrainingJobId, total_steps: u64 },
    Progress { job_id: TrainingJobId, update: ProgressUpdate },
    LogAppended { job_id: TrainingJobId, line: String },
    Completed { job_id: TrainingJobId, snapshot: JobSnapshot },
    Stopped { job_id: TrainingJobId, snapshot: JobSnapshot },
}

impl ProgressEvent {
    #[must_use]
    pub fn job_id(&self) -> &TrainingJobId {
        match self {
            Self::Started { job_id, .. }
            | Self::Progress { job_id, .. }
            | Self::LogAppended { job_id, .. }
            | Self::Completed { job_id, .. }
            | Self::Stopped { job_id, .. } => job_id,
        }
    }

    /// True for the last event a job emits.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Stopped { .. })
    }
}

pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);
}

/// Logs job lifecycle at `info` and per-tick progress at `debug`.
#[derive(Debug, Default)]
pub struct TracingProgressSink;

impl ProgressSink for TracingProgressSink {
    fn on_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { job_id, total_steps } => {
                tracing::info!(job_id = %job_id, total_steps, "Training started");
            }
            ProgressEvent::Progress { job_id, update } => {
                tracing::debug!(
                    job_id = %job_id,
                    step = update.current_step,
                    epoch = update.current_epoch,
                    percent = update.progress_percent,
                    "Training progress"
                );
            }
            ProgressEvent::LogAppended { job_id, line } => {
                tracing::debug!(job_id = %job_id, "{line}");
            }
            ProgressEvent::Completed { job_id, snapshot } => {
                tracing::info!(job_id = %job_id, steps = snapshot.current_step, "Training completed");
            }
            ProgressEvent::Stopped { job_id, snapshot } => {
                tracing::info!(job_id = %job_id, steps = snapshot.current_step, "Training stopped");
            }
        }
    }
}
