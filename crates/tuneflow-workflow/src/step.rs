//! Pipeline steps and their runtime status records.

use crate::error::WorkflowError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Status of a pipeline step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    /// Step has not been started.
    #[default]
    Pending,
    /// Step is currently running.
    InProgress,
    /// Step finished successfully.
    Completed,
    /// Step failed.
    Error,
}

impl StepStatus {
    /// Completed or errored.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepStatus {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "pending" => Ok(Self::Pending),
            "in-progress" | "running" => Ok(Self::InProgress),
            "completed" | "done" => Ok(Self::Completed),
            "error" | "failed" => Ok(Self::Error),
            other => Err(WorkflowError::InvalidCatalogue(format!("unknown step status '{other}'"))),
        }
    }
}

/// Static definition of a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Status the step starts in and returns to on reset.
    #[serde(rename = "status", default)]
    pub initial_status: StepStatus,
    /// Display label such as "2.3h".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

/// Runtime state of one step in the active pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStep {
    #[serde(flatten)]
    pub definition: WorkflowStep,
    #[serde(rename = "currentStatus")]
    pub status: StepStatus,
    /// When the step last entered `in-progress`.
    pub started_at: Option<DateTime<Utc>>,
    /// When the step last reached `completed` or `error`.
    pub finished_at: Option<DateTime<Utc>>,
}

impl PipelineStep {
    /// Creates a runtime record in the definition's initial status.
    ///
    /// A step that starts `in-progress` counts its elapsed time from `now`.
    pub fn new(definition: WorkflowStep, now: DateTime<Utc>) -> Self {
        let status = definition.initial_status;
        let started_at = (status == StepStatus::InProgress).then_some(now);
        Self { definition, status, started_at, finished_at: None }
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    /// Sets the status, stamping start/finish times on transitions.
    pub fn set_status(&mut self, status: StepStatus, now: DateTime<Utc>) {
        if status == self.status {
            return;
        }
        match status {
            StepStatus::Pending => {
                self.started_at = None;
                self.finished_at = None;
            }
            StepStatus::InProgress => {
                self.started_at = Some(now);
                self.finished_at = None;
            }
            StepStatus::Completed | StepStatus::Error => {
                self.finished_at = Some(now);
            }
        }
        self.status = status;
    }

    /// Time spent in progress: up to the finish time, or up to `now` while running.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<Duration> {
        let started = self.started_at?;
        let end = match self.status {
            StepStatus::InProgress => now,
            _ => self.finished_at?,
        };
        Some(end - started)
    }

    pub fn is_completed(&self) -> bool {
        self.status == StepStatus::Completed
    }
}

/// Formats a duration the way the dashboard labels do: "45s", "15m", "2.3h".
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.num_seconds().max(0);
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{:.1}h", secs as f64 / 3600.0)
    }
}
