use crate::error::{TrainingError, TrainingResult};
use crate::log_buffer::LogBuffer;
use crate::metrics::MetricGenerator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;
use uuid::Uuid;

pub const STEPS_PER_EPOCH: u64 = 100;
pub const LOG_EVERY: u64 = 10;
pub const LOG_CAPACITY: usize = 10;
pub const TICK_INTERVAL_MS: u64 = 200;

pub const BATCH_SIZE_CHOICES: [u32; 5] = [1, 2, 4, 8, 16];
pub const EPOCH_CHOICES: [u32; 5] = [1, 2, 3, 5, 10];
pub const LEARNING_RATE_RANGE: RangeInclusive<f64> = 1e-5..=1e-4;
pub const BETA_RANGE: RangeInclusive<f64> = 0.01..=0.5;

/// Identifier for a training job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrainingJobId(pub String);

impl TrainingJobId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for TrainingJobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// DPO hyperparameters as entered in the training form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingConfig {
    pub model_name: String,
    /// Free-form reference; never checked against a loaded dataset.
    pub dataset_path: String,
    pub learning_rate: f64,
    pub batch_size: u32,
    pub epochs: u32,
    pub beta_value: f64,
    pub warmup_steps: u32,
    pub save_steps: u32,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            model_name: "microsoft/DialoGPT-medium".to_string(),
            dataset_path: "preference_dataset.json".to_string(),
            learning_rate: 5e-5,
            batch_size: 4,
            epochs: 3,
            beta_value: 0.1,
            warmup_steps: 100,
            save_steps: 500,
        }
    }
}

impl TrainingConfig {
    /// Checks required fields and that numeric values are usable at all.
    pub fn validate(&self) -> TrainingResult<()> {
        if self.model_name.trim().is_empty() {
            return Err(TrainingError::Config("model name is required".to_string()));
        }
        if self.dataset_path.trim().is_empty() {
            return Err(TrainingError::Config("dataset path is required".to_string()));
        }
        if self.epochs == 0 {
            return Err(TrainingError::Config("epochs must be >= 1".to_string()));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(TrainingError::Config("learning rate must be > 0".to_string()));
        }
        if !self.beta_value.is_finite() || self.beta_value <= 0.0 {
            return Err(TrainingError::Config("beta must be > 0".to_string()));
        }
        if self.batch_size == 0 {
            return Err(TrainingError::Config("batch size must be >= 1".to_string()));
        }
        if self.save_steps == 0 {
            return Err(TrainingError::Config("save steps must be >= 1".to_string()));
        }
        Ok(())
    }

    /// Stricter check matching the form controls: enumerated batch sizes and
    /// epochs, slider ranges for learning rate and beta.
    pub fn check_ui_bounds(&self) -> TrainingResult<()> {
        self.validate()?;
        if !BATCH_SIZE_CHOICES.contains(&self.batch_size) {
            return Err(TrainingError::Config(format!(
                "batch size {} is not one of {:?}",
                self.batch_size, BATCH_SIZE_CHOICES
            )));
        }
        if !EPOCH_CHOICES.contains(&self.epochs) {
            return Err(TrainingError::Config(format!(
                "epochs {} is not one of {:?}",
                self.epochs, EPOCH_CHOICES
            )));
        }
        if !LEARNING_RATE_RANGE.contains(&self.learning_rate) {
            return Err(TrainingError::Config(format!(
                "learning rate {} is outside {:e}..={:e}",
                self.learning_rate,
                LEARNING_RATE_RANGE.start(),
                LEARNING_RATE_RANGE.end()
            )));
        }
        if !BETA_RANGE.contains(&self.beta_value) {
            return Err(TrainingError::Config(format!(
                "beta {} is outside {}..={}",
                self.beta_value,
                BETA_RANGE.start(),
                BETA_RANGE.end()
            )));
        }
        Ok(())
    }
}

/// Timing and sizing constants of the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub tick_ms: u64,
    pub steps_per_epoch: u64,
    pub log_every: u64,
    pub log_capacity: usize,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            tick_ms: TICK_INTERVAL_MS,
            steps_per_epoch: STEPS_PER_EPOCH,
            log_every: LOG_EVERY,
            log_capacity: LOG_CAPACITY,
        }
    }
}

impl SimulationSettings {
    pub fn validate(&self) -> TrainingResult<()> {
        if self.tick_ms == 0 {
            return Err(TrainingError::Config("tick_ms must be >= 1".to_string()));
        }
        if self.steps_per_epoch == 0 {
            return Err(TrainingError::Config("steps_per_epoch must be >= 1".to_string()));
        }
        if self.log_every == 0 {
            return Err(TrainingError::Config("log_every must be >= 1".to_string()));
        }
        if self.log_capacity == 0 {
            return Err(TrainingError::Config("log_capacity must be >= 1".to_string()));
        }
        Ok(())
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingState {
    Idle,
    Running,
    Stopped,
    Completed,
}

impl TrainingState {
    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Stopped | Self::Completed)
    }
}

impl std::fmt::Display for TrainingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// Read-only view of a job, as handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<TrainingJobId>,
    pub state: TrainingState,
    pub current_epoch: u64,
    pub current_step: u64,
    pub total_steps: u64,
    pub progress_percent: f64,
    pub logs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<TrainingConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobSnapshot {
    #[must_use]
    pub fn idle() -> Self {
        Self {
            job_id: None,
            state: TrainingState::Idle,
            current_epoch: 0,
            current_step: 0,
            total_steps: 0,
            progress_percent: 0.0,
            logs: Vec::new(),
            config: None,
            started_at: None,
            finished_at: None,
        }
    }

    #[must_use]
    pub fn last_log_line(&self) -> Option<&str> {
        self.logs.last().map(String::as_str)
    }
}

/// What a single tick changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    pub step: u64,
    pub log_line: Option<String>,
    pub completed: bool,
}

/// State of one simulated training run.
///
/// All mutation happens through `tick` and `stop`; the controller serializes
/// calls to both behind a single lock.
#[derive(Debug, Clone)]
pub struct TrainingJob {
    id: TrainingJobId,
    config: TrainingConfig,
    settings: SimulationSettings,
    state: TrainingState,
    current_step: u64,
    total_steps: u64,
    logs: LogBuffer,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl TrainingJob {
    /// Validate `config` and create a job in the `Running` state at step 0.
    pub fn start(config: TrainingConfig, settings: SimulationSettings) -> TrainingResult<Self> {
        config.validate()?;
        settings.validate()?;

        let total_steps = u64::from(config.epochs)
            .checked_mul(settings.steps_per_epoch)
            .ok_or_else(|| {
                TrainingError::Config(format!(
                    "{} epochs of {} steps exceeds the step counter",
                    config.epochs, settings.steps_per_epoch
                ))
            })?;
        Ok(Self {
            id: TrainingJobId::new(),
            config,
            settings,
            state: TrainingState::Running,
            current_step: 0,
            total_steps,
            logs: LogBuffer::new(settings.log_capacity),
            started_at: Utc::now(),
            finished_at: None,
        })
    }

    #[must_use]
    pub fn id(&self) -> &TrainingJobId {
        &self.id
    }

    #[must_use]
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> TrainingState {
        self.state
    }

    #[must_use]
    pub fn current_step(&self) -> u64 {
        self.current_step
    }

    #[must_use]
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// 1-based epoch of the last applied step; 0 before the first step.
    #[must_use]
    pub fn current_epoch(&self) -> u64 {
        if self.current_step == 0 {
            0
        } else {
            (self.current_step - 1) / self.settings.steps_per_epoch + 1
        }
    }

    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        if self.total_steps == 0 {
            return 0.0;
        }
        (self.current_step as f64 * 100.0 / self.total_steps as f64).clamp(0.0, 100.0)
    }

    #[must_use]
    pub fn logs(&self) -> &LogBuffer {
        &self.logs
    }

    /// Apply one progression step. Returns `None` unless the job is running.
    pub fn tick(&mut self, metrics: &dyn MetricGenerator) -> Option<TickOutcome> {
        if self.state != TrainingState::Running {
            return None;
        }

        self.current_step += 1;
        let step = self.current_step;

        let log_line = (step % self.settings.log_every == 0).then(|| {
            let m = metrics.next_metric(step);
            let line = format!("Step {step}: Loss={:.4}, Accuracy={:.3}", m.loss, m.accuracy);
            self.logs.push(line.clone());
            line
        });

        let completed = step >= self.total_steps;
        if completed {
            self.state = TrainingState::Completed;
            self.finished_at = Some(Utc::now());
        }

        Some(TickOutcome { step, log_line, completed })
    }

    /// Freeze the job. Returns `false` (and changes nothing) unless it was running.
    pub fn stop(&mut self) -> bool {
        if self.state != TrainingState::Running {
            return false;
        }
        self.state = TrainingState::Stopped;
        self.finished_at = Some(Utc::now());
        true
    }

    #[must_use]
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            job_id: Some(self.id.clone()),
            state: self.state,
            current_epoch: self.current_epoch(),
            current_step: self.current_step,
            total_steps: self.total_steps,
            progress_percent: self.progress_percent(),
            logs: self.logs.to_vec(),
            config: Some(self.config.clone()),
            started_at: Some(self.started_at),
            finished_at: self.finished_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{FixedMetricGenerator, StepMetrics};

    const METRICS: FixedMetricGenerator =
        FixedMetricGenerator(StepMetrics { loss: 0.25, accuracy: 0.9 });

    fn config(epochs: u32) -> TrainingConfig {
        TrainingConfig { epochs, ..Default::default() }
    }

    #[test]
    fn test_config_validate_requires_model_and_dataset() {
        let missing_model = TrainingConfig { model_name: "  ".to_string(), ..Default::default() };
        let missing_dataset = TrainingConfig { dataset_path: String::new(), ..Default::default() };

        assert!(matches!(missing_model.validate(), Err(TrainingError::Config(_))));
        assert!(matches!(missing_dataset.validate(), Err(TrainingError::Config(_))));
        assert!(TrainingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_ui_bounds() {
        assert!(TrainingConfig::default().check_ui_bounds().is_ok());

        let odd_batch = TrainingConfig { batch_size: 3, ..Default::default() };
        let odd_epochs = TrainingConfig { epochs: 4, ..Default::default() };
        let high_lr = TrainingConfig { learning_rate: 1e-3, ..Default::default() };
        let high_beta = TrainingConfig { beta_value: 0.9, ..Default::default() };

        for cfg in [odd_batch, odd_epochs, high_lr, high_beta] {
            assert!(cfg.validate().is_ok());
            assert!(matches!(cfg.check_ui_bounds(), Err(TrainingError::Config(_))));
        }
    }

    #[test]
    fn test_simulation_settings_validate() {
        assert!(SimulationSettings::default().validate().is_ok());
        let bad = SimulationSettings { log_every: 0, ..Default::default() };
        assert!(bad.validate().is_err());
        assert_eq!(SimulationSettings::default().tick_interval(), Duration::from_millis(200));
    }

    #[test]
    fn test_start_rejects_step_count_overflow() {
        let settings = SimulationSettings { steps_per_epoch: u64::MAX, ..Default::default() };
        assert!(settings.validate().is_ok());

        let err = TrainingJob::start(config(2), settings).unwrap_err();
        assert!(matches!(err, TrainingError::Config(ref msg) if msg.contains("exceeds")));

        let single = TrainingJob::start(config(1), settings).unwrap();
        assert_eq!(single.total_steps(), u64::MAX);
    }

    #[test]
    fn test_start_with_huge_log_capacity() {
        let settings = SimulationSettings { log_every: 1, log_capacity: usize::MAX, ..Default::default() };
        let mut job = TrainingJob::start(config(1), settings).unwrap();
        for _ in 0..3 {
            job.tick(&METRICS);
        }
        assert_eq!(job.logs().len(), 3);
        assert_eq!(job.logs().capacity(), usize::MAX);
    }

    #[test]
    fn test_start_resets_counters() {
        let job = TrainingJob::start(config(3), SimulationSettings::default()).unwrap();

        assert_eq!(job.state(), TrainingState::Running);
        assert_eq!(job.current_step(), 0);
        assert_eq!(job.current_epoch(), 0);
        assert_eq!(job.total_steps(), 300);
        assert!(job.logs().is_empty());
    }

    #[test]
    fn test_epoch_boundaries() {
        let mut job = TrainingJob::start(config(3), SimulationSettings::default()).unwrap();

        let mut epochs = Vec::new();
        for _ in 0..201 {
            job.tick(&METRICS);
            epochs.push(job.current_epoch());
        }
        assert_eq!(epochs[0], 1); // step 1
        assert_eq!(epochs[99], 1); // step 100
        assert_eq!(epochs[100], 2); // step 101
        assert_eq!(epochs[199], 2); // step 200
        assert_eq!(epochs[200], 3); // step 201
    }

    #[test]
    fn test_runs_to_completion_exactly_at_total_steps() {
        let mut job = TrainingJob::start(config(3), SimulationSettings::default()).unwrap();

        let mut ticks = 0;
        while let Some(outcome) = job.tick(&METRICS) {
            ticks += 1;
            if outcome.completed {
                break;
            }
        }

        assert_eq!(ticks, 300);
        assert_eq!(job.state(), TrainingState::Completed);
        assert_eq!(job.current_step(), 300);
        assert_eq!(job.current_epoch(), 3);
        assert!((job.progress_percent() - 100.0).abs() < f64::EPSILON);

        assert!(job.tick(&METRICS).is_none());
        assert_eq!(job.current_step(), 300);
    }

    #[test]
    fn test_log_every_tenth_step_with_bounded_buffer() {
        let mut job = TrainingJob::start(config(1), SimulationSettings::default()).unwrap();

        for step in 1..=100u64 {
            let outcome = job.tick(&METRICS).unwrap();
            assert_eq!(outcome.log_line.is_some(), step % 10 == 0);
            assert!(job.logs().len() <= LOG_CAPACITY);
        }

        let logs = job.logs().to_vec();
        assert_eq!(logs.len(), 10);
        assert_eq!(logs[0], "Step 10: Loss=0.2500, Accuracy=0.900");
        assert_eq!(logs[9], "Step 100: Loss=0.2500, Accuracy=0.900");
    }

    #[test]
    fn test_log_buffer_evicts_oldest_lines() {
        let settings = SimulationSettings { log_every: 1, log_capacity: 3, ..Default::default() };
        let mut job = TrainingJob::start(config(1), settings).unwrap();
        for _ in 0..5 {
            job.tick(&METRICS);
        }

        let steps: Vec<_> = job.logs().iter().map(|l| l.split(':').next().unwrap().to_string()).collect();
        assert_eq!(steps, vec!["Step 3", "Step 4", "Step 5"]);
    }

    #[test]
    fn test_stop_freezes_snapshot() {
        let mut job = TrainingJob::start(config(1), SimulationSettings::default()).unwrap();
        for _ in 0..25 {
            job.tick(&METRICS);
        }

        assert!(job.stop());
        assert!(!job.stop());
        assert!(job.tick(&METRICS).is_none());

        let snapshot = job.snapshot();
        assert_eq!(snapshot.state, TrainingState::Stopped);
        assert_eq!(snapshot.current_step, 25);
        assert!((snapshot.progress_percent - 25.0).abs() < f64::EPSILON);
        assert_eq!(snapshot.logs.len(), 2);
        assert_eq!(snapshot.last_log_line(), Some("Step 20: Loss=0.2500, Accuracy=0.900"));
        assert!(snapshot.finished_at.is_some());
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let job = TrainingJob::start(config(1), SimulationSettings::default()).unwrap();
        let value = serde_json::to_value(job.snapshot()).unwrap();

        assert_eq!(value["state"], "running");
        assert_eq!(value["totalSteps"], 100);
        assert_eq!(value["config"]["modelName"], "microsoft/DialoGPT-medium");
    }
}
