//! Owner of the single simulated training job and its timer task.

use crate::error::{TrainingError, TrainingResult};
use crate::job::{JobSnapshot, SimulationSettings, TrainingConfig, TrainingJob, TrainingJobId, TrainingState};
use crate::metrics::{MetricGenerator, RandomMetricGenerator};
use crate::progress::{ProgressEvent, ProgressSink, ProgressUpdate, TracingProgressSink};
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Everything the tick task and the public API share.
struct Shared {
    job: Mutex<Option<TrainingJob>>,
    metrics: Arc<dyn MetricGenerator>,
    sinks: Vec<Arc<dyn ProgressSink>>,
    events_tx: broadcast::Sender<ProgressEvent>,
    snapshot_tx: watch::Sender<JobSnapshot>,
}

impl Shared {
    /// Callers hold the job lock, so notifications leave in mutation order.
    fn publish(&self, events: Vec<ProgressEvent>, snapshot: JobSnapshot) {
        self.snapshot_tx.send_replace(snapshot);
        for event in events {
            for sink in &self.sinks {
                sink.on_event(&event);
            }
            // No subscribers is fine.
            let _ = self.events_tx.send(event);
        }
    }
}

/// Drives at most one [`TrainingJob`] at a time.
///
/// `start` spawns a tokio task that ticks the job every
/// [`SimulationSettings::tick_interval`]. Each tick mutates the job under one
/// lock acquisition, and only if the job is still the one the task was spawned
/// for, so a task that outlives `stop` or `reset` can never touch a newer job.
pub struct TrainingController {
    shared: Arc<Shared>,
    settings: SimulationSettings,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TrainingController {
    #[must_use]
    pub fn new(settings: SimulationSettings) -> Self {
        Self::with_parts(settings, Arc::new(RandomMetricGenerator::new()), vec![Arc::new(TracingProgressSink)])
    }

    #[must_use]
    pub fn with_parts(
        settings: SimulationSettings,
        metrics: Arc<dyn MetricGenerator>,
        sinks: Vec<Arc<dyn ProgressSink>>,
    ) -> Self {
        let (events_tx, _) = broadcast::channel(256);
        let (snapshot_tx, _) = watch::channel(JobSnapshot::idle());
        Self {
            shared: Arc::new(Shared { job: Mutex::new(None), metrics, sinks, events_tx, snapshot_tx }),
            settings,
            task: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn settings(&self) -> SimulationSettings {
        self.settings
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.shared.events_tx.subscribe()
    }

    /// Receiver that always holds the latest snapshot.
    pub fn watch(&self) -> watch::Receiver<JobSnapshot> {
        self.shared.snapshot_tx.subscribe()
    }

    pub async fn snapshot(&self) -> JobSnapshot {
        self.shared.job.lock().await.as_ref().map_or_else(JobSnapshot::idle, TrainingJob::snapshot)
    }

    pub async fn state(&self) -> TrainingState {
        self.shared.job.lock().await.as_ref().map_or(TrainingState::Idle, TrainingJob::state)
    }

    /// Start a new job. Fails if one is already running or `config` is invalid.
    pub async fn start(&self, config: TrainingConfig) -> TrainingResult<TrainingJobId> {
        let mut task = self.task.lock().await;
        let mut guard = self.shared.job.lock().await;

        if let Some(current) = guard.as_ref().filter(|j| j.state() == TrainingState::Running) {
            tracing::warn!(job_id = %current.id(), "Rejected start while a job is running");
            return Err(TrainingError::AlreadyRunning { job_id: current.id().to_string() });
        }

        let job = TrainingJob::start(config, self.settings).inspect_err(|e| {
            tracing::warn!(error = %e, "Rejected training config");
        })?;
        let job_id = job.id().clone();
        let total_steps = job.total_steps();
        let snapshot = job.snapshot();
        *guard = Some(job);
        self.shared.publish(
            vec![ProgressEvent::Started { job_id: job_id.clone(), total_steps }],
            snapshot,
        );
        drop(guard);

        // A finished job's task has already exited; abort is a no-op for it.
        if let Some(old) = task.take() {
            old.abort();
        }
        *task = Some(spawn_ticker(Arc::clone(&self.shared), job_id.clone(), self.settings));
        Ok(job_id)
    }

    /// Halt the running job and keep its counters for inspection.
    ///
    /// Not running is not an error; the current snapshot is returned unchanged.
    pub async fn stop(&self) -> JobSnapshot {
        let mut task = self.task.lock().await;
        let mut guard = self.shared.job.lock().await;

        let Some(job) = guard.as_mut() else {
            return JobSnapshot::idle();
        };
        if !job.stop() {
            return job.snapshot();
        }

        if let Some(handle) = task.take() {
            handle.abort();
        }
        let job_id = job.id().clone();
        let snapshot = job.snapshot();
        self.shared.publish(
            vec![ProgressEvent::Stopped { job_id, snapshot: snapshot.clone() }],
            snapshot.clone(),
        );
        snapshot
    }

    /// Discard any job, running or not, and return to `Idle`.
    pub async fn reset(&self) {
        let mut task = self.task.lock().await;
        if let Some(handle) = task.take() {
            handle.abort();
        }
        let mut guard = self.shared.job.lock().await;
        if let Some(job) = guard.take() {
            tracing::info!(job_id = %job.id(), "Training job reset");
        }
        self.shared.snapshot_tx.send_replace(JobSnapshot::idle());
    }

    /// Wait until the current job leaves `Running`, then return its snapshot.
    pub async fn wait_finished(&self) -> JobSnapshot {
        let mut rx = self.watch();
        loop {
            let current = rx.borrow_and_update().clone();
            if current.state != TrainingState::Running {
                return current;
            }
            if rx.changed().await.is_err() {
                return self.snapshot().await;
            }
        }
    }
}

impl Drop for TrainingController {
    fn drop(&mut self) {
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}

fn spawn_ticker(shared: Arc<Shared>, job_id: TrainingJobId, settings: SimulationSettings) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(settings.tick_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a tokio interval completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;

            let finished = {
                let mut guard = shared.job.lock().await;
                let Some(job) = guard.as_mut().filter(|j| j.id() == &job_id) else {
                    break;
                };
                let Some(outcome) = job.tick(shared.metrics.as_ref()) else {
                    break;
                };

                let snapshot = job.snapshot();
                let mut events = vec![ProgressEvent::Progress {
                    job_id: job_id.clone(),
                    update: ProgressUpdate::from(&snapshot),
                }];
                if let Some(line) = outcome.log_line {
                    events.push(ProgressEvent::LogAppended { job_id: job_id.clone(), line });
                }
                if outcome.completed {
                    events.push(ProgressEvent::Completed {
                        job_id: job_id.clone(),
                        snapshot: snapshot.clone(),
                    });
                }
                shared.publish(events, snapshot);
                outcome.completed
            };

            if finished {
                break;
            }
        }
    })
}
