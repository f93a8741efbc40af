//! Pipeline status engine.
//!
//! Holds one active pipeline from a [`PipelineCatalogue`] and the runtime
//! status of its steps. Statuses only change when a caller sets them; the
//! engine stores and aggregates, it never advances steps on its own.

use crate::catalogue::{PipelineCatalogue, PipelineDefinition};
use crate::error::{WorkflowError, WorkflowResult};
use crate::step::{PipelineStep, StepStatus};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Number of steps in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub error: usize,
}

/// Serializable view of the active pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineView {
    pub name: String,
    pub title: String,
    pub running: bool,
    pub completion_percent: u32,
    pub counts: StatusCounts,
    pub steps: Vec<PipelineStep>,
}

#[derive(Debug, Clone)]
pub struct PipelineEngine {
    catalogue: PipelineCatalogue,
    active: usize,
    steps: Vec<PipelineStep>,
    running: bool,
}

impl PipelineEngine {
    /// Creates an engine with the catalogue's first pipeline selected.
    pub fn new(catalogue: PipelineCatalogue) -> WorkflowResult<Self> {
        catalogue.validate()?;
        let steps = build_steps(&catalogue.pipelines()[0]);
        Ok(Self { catalogue, active: 0, steps, running: true })
    }

    /// Engine over the built-in `dpo`/`rlhf` catalogue, `dpo` selected.
    pub fn builtin() -> Self {
        let catalogue = PipelineCatalogue::builtin();
        let steps = build_steps(&catalogue.pipelines()[0]);
        Self { catalogue, active: 0, steps, running: true }
    }

    pub fn catalogue(&self) -> &PipelineCatalogue {
        &self.catalogue
    }

    pub fn active_pipeline(&self) -> &PipelineDefinition {
        &self.catalogue.pipelines()[self.active]
    }

    pub fn active_name(&self) -> &str {
        &self.active_pipeline().name
    }

    /// Switches to `name`, discarding all status of the previous selection.
    pub fn select_pipeline(&mut self, name: &str) -> WorkflowResult<()> {
        let index = self
            .catalogue
            .position(name)
            .ok_or_else(|| WorkflowError::PipelineNotFound(name.to_string()))?;

        self.steps = build_steps(&self.catalogue.pipelines()[index]);
        self.active = index;
        tracing::info!(pipeline = name, steps = self.steps.len(), "Pipeline selected");
        Ok(())
    }

    /// Flips the running/paused flag. Advisory only: step statuses are untouched.
    pub fn toggle_running(&mut self) -> bool {
        self.running = !self.running;
        tracing::debug!(pipeline = self.active_name(), running = self.running, "Pipeline run flag toggled");
        self.running
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    pub fn step(&self, step_id: &str) -> Option<&PipelineStep> {
        self.steps.iter().find(|s| s.id() == step_id)
    }

    /// First step currently in progress.
    pub fn current_step(&self) -> Option<&PipelineStep> {
        self.steps.iter().find(|s| s.status == StepStatus::InProgress)
    }

    /// Sets a step's status. Any of the four statuses may follow any other.
    pub fn set_step_status(&mut self, step_id: &str, status: StepStatus) -> WorkflowResult<()> {
        let pipeline = self.active_name().to_string();
        let step = self.steps.iter_mut().find(|s| s.id() == step_id).ok_or_else(|| {
            WorkflowError::StepNotFound { pipeline: pipeline.clone(), step_id: step_id.to_string() }
        })?;

        step.set_status(status, Utc::now());
        tracing::debug!(pipeline = %pipeline, step = step_id, %status, "Step status changed");
        Ok(())
    }

    /// Restores every step of the active pipeline to its initial status.
    ///
    /// The new step list is built in full before it replaces the old one.
    pub fn reset(&mut self) {
        self.steps = build_steps(self.active_pipeline());
        tracing::info!(pipeline = self.active_name(), "Pipeline reset");
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn completed_steps(&self) -> usize {
        self.steps.iter().filter(|s| s.is_completed()).count()
    }

    /// Completed / total, in `[0.0, 1.0]`.
    pub fn completion_ratio(&self) -> f64 {
        if self.steps.is_empty() {
            return 0.0;
        }
        self.completed_steps() as f64 / self.steps.len() as f64
    }

    /// Completed / total × 100, rounded half up to an integer.
    pub fn completion_percent(&self) -> u32 {
        let total = self.steps.len();
        if total == 0 {
            return 0;
        }
        ((200 * self.completed_steps() + total) / (2 * total)) as u32
    }

    pub fn status_counts(&self) -> StatusCounts {
        self.steps.iter().fold(StatusCounts::default(), |mut counts, step| {
            match step.status {
                StepStatus::Pending => counts.pending += 1,
                StepStatus::InProgress => counts.in_progress += 1,
                StepStatus::Completed => counts.completed += 1,
                StepStatus::Error => counts.error += 1,
            }
            counts
        })
    }

    /// "2 of 6 steps completed"
    pub fn progress_label(&self) -> String {
        format!("{} of {} steps completed", self.completed_steps(), self.total_steps())
    }

    pub fn view(&self) -> PipelineView {
        let pipeline = self.active_pipeline();
        PipelineView {
            name: pipeline.name.clone(),
            title: pipeline.title.clone(),
            running: self.running,
            completion_percent: self.completion_percent(),
            counts: self.status_counts(),
            steps: self.steps.clone(),
        }
    }
}

impl Default for PipelineEngine {
    fn default() -> Self {
        Self::builtin()
    }
}

fn build_steps(pipeline: &PipelineDefinition) -> Vec<PipelineStep> {
    let now = Utc::now();
    pipeline.steps.iter().cloned().map(|step| PipelineStep::new(step, now)).collect()
}
