//! Training command implementation.

use crate::config::CliConfig;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast::error::RecvError;
use tuneflow_training::{JobSnapshot, ProgressEvent, SimulationSettings, TrainingConfig, TrainingController, TrainingState};

#[derive(Args, Debug, Default)]
pub struct TrainArgs {
    /// Base model name
    #[arg(long)]
    model: Option<String>,

    /// Preference dataset path (recorded in the config only)
    #[arg(long)]
    dataset: Option<String>,

    /// Learning rate (1e-5 to 1e-4)
    #[arg(long)]
    learning_rate: Option<f64>,

    /// Batch size (1, 2, 4, 8, 16)
    #[arg(long)]
    batch_size: Option<u32>,

    /// Epochs (1, 2, 3, 5, 10)
    #[arg(long)]
    epochs: Option<u32>,

    /// DPO beta (0.01 to 0.5)
    #[arg(long)]
    beta: Option<f64>,

    /// Warmup steps
    #[arg(long)]
    warmup_steps: Option<u32>,

    /// Save a checkpoint every N steps
    #[arg(long)]
    save_steps: Option<u32>,

    /// Milliseconds between simulated steps
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Print the final job snapshot as JSON
    #[arg(long)]
    json: bool,
}

impl TrainArgs {
    /// Built-in defaults, then the config file, then flags.
    fn training_config(&self, config: &CliConfig) -> TrainingConfig {
        let mut training = TrainingConfig::default();
        config.training.apply(&mut training);

        if let Some(ref model) = self.model {
            training.model_name.clone_from(model);
        }
        if let Some(ref dataset) = self.dataset {
            training.dataset_path.clone_from(dataset);
        }
        if let Some(learning_rate) = self.learning_rate {
            training.learning_rate = learning_rate;
        }
        if let Some(batch_size) = self.batch_size {
            training.batch_size = batch_size;
        }
        if let Some(epochs) = self.epochs {
            training.epochs = epochs;
        }
        if let Some(beta) = self.beta {
            training.beta_value = beta;
        }
        if let Some(warmup_steps) = self.warmup_steps {
            training.warmup_steps = warmup_steps;
        }
        if let Some(save_steps) = self.save_steps {
            training.save_steps = save_steps;
        }
        training
    }

    fn simulation_settings(&self, config: &CliConfig) -> SimulationSettings {
        let mut settings = SimulationSettings::default();
        config.simulation.apply(&mut settings);
        if let Some(tick_ms) = self.tick_ms {
            settings.tick_ms = tick_ms;
        }
        settings
    }
}

pub async fn execute(args: TrainArgs, config: &CliConfig) -> Result<()> {
    let json_output = args.json || config.output.wants_json();
    let training = args.training_config(config);
    training.check_ui_bounds()?;
    let settings = args.simulation_settings(config);
    settings.validate()?;

    let controller = TrainingController::new(settings);
    let mut events = controller.subscribe();
    let epochs = training.epochs;
    let job_id = controller.start(training).await.context("Failed to start training")?;
    let total_steps = controller.snapshot().await.total_steps;

    let bar = if json_output {
        ProgressBar::hidden()
    } else {
        println!();
        println!("{}", "DPO Training (simulated)".bold().cyan());
        println!("  Job: {}", job_id.to_string().dimmed());
        println!("  {}", "Press Ctrl-C to stop.".dimmed());
        println!();
        let bar = ProgressBar::new(total_steps);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>4}/{len} steps  {msg}")?.progress_chars("█▓░"),
        );
        bar
    };

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut listen_ctrl_c = true;

    loop {
        tokio::select! {
            signal = &mut ctrl_c, if listen_ctrl_c => {
                listen_ctrl_c = false;
                if let Err(e) = signal {
                    tracing::warn!(error = %e, "Cannot listen for Ctrl-C");
                    continue;
                }
                controller.stop().await;
                break;
            }
            event = events.recv() => match event {
                Ok(ProgressEvent::Progress { update, .. }) => {
                    bar.set_position(update.current_step);
                    bar.set_message(format!("epoch {}/{}", update.current_epoch, epochs));
                }
                Ok(ProgressEvent::LogAppended { line, .. }) => bar.println(format!("  {}", line.dimmed())),
                Ok(event) if event.is_terminal() => break,
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Progress display fell behind");
                    if controller.state().await.is_finished() {
                        break;
                    }
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    let snapshot = controller.snapshot().await;
    bar.set_position(snapshot.current_step);
    match snapshot.state {
        TrainingState::Completed => bar.finish(),
        _ => bar.abandon(),
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    print_summary(&snapshot);
    Ok(())
}

fn print_summary(snapshot: &JobSnapshot) {
    println!();
    match snapshot.state {
        TrainingState::Completed => println!("{}", "Training complete".bold().green()),
        _ => println!(
            "{}",
            format!("Training stopped at step {} of {}", snapshot.current_step, snapshot.total_steps).bold().yellow()
        ),
    }
    println!("  Epoch:    {}", snapshot.current_epoch);
    println!("  Progress: {:.1}%", snapshot.progress_percent);
    if let Some(ref config) = snapshot.config {
        println!("  Model:    {}", config.model_name.cyan());
        println!(
            "  {}",
            format!(
                "lr={:e} batch={} epochs={} beta={}",
                config.learning_rate, config.batch_size, config.epochs, config.beta_value
            )
            .dimmed()
        );
    }
    if let Some(line) = snapshot.last_log_line() {
        println!("  Last log: {}", line);
    }
    println!();
}
