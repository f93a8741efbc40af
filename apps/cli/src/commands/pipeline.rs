//! Pipeline command implementation.

use crate::config::CliConfig;
use anyhow::{Context, Result};
use chrono::Utc;
use clap::Subcommand;
use colored::Colorize;
use serde_json::json;
use std::path::PathBuf;
use tuneflow_workflow::{format_elapsed, PipelineCatalogue, PipelineEngine, PipelineStep, StepStatus};

#[derive(Subcommand, Debug)]
pub enum PipelineCommand {
    /// List the pipelines in the catalogue
    List {
        /// Pipeline catalogue file (TOML or JSON)
        #[arg(long)]
        catalogue: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a pipeline with step statuses and overall progress
    Show {
        /// Pipeline name (defaults to the first in the catalogue)
        name: Option<String>,

        /// Pipeline catalogue file (TOML or JSON)
        #[arg(long)]
        catalogue: Option<PathBuf>,

        /// Set a step status, e.g. --set evaluation=in-progress
        #[arg(long = "set", value_parser = parse_assignment)]
        set: Vec<(String, StepStatus)>,

        /// Show the pipeline as paused
        #[arg(long)]
        paused: bool,

        /// Restore every step to its initial status before applying --set
        #[arg(long)]
        reset: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn execute(command: PipelineCommand, config: &CliConfig) -> Result<()> {
    match command {
        PipelineCommand::List { catalogue, json } => {
            let engine = engine_for(catalogue.or_else(|| config.catalogue.clone()))?;
            list(&engine, json || config.output.wants_json())
        }
        PipelineCommand::Show { name, catalogue, set, paused, reset, json } => {
            let mut engine = engine_for(catalogue.or_else(|| config.catalogue.clone()))?;
            if let Some(ref name) = name {
                engine.select_pipeline(name)?;
            }
            if reset {
                engine.reset();
            }
            for (step_id, status) in set {
                engine.set_step_status(&step_id, status)?;
            }
            if paused {
                engine.set_running(false);
            }
            show(&engine, json || config.output.wants_json())
        }
    }
}

fn engine_for(catalogue: Option<PathBuf>) -> Result<PipelineEngine> {
    let Some(path) = catalogue else {
        return Ok(PipelineEngine::builtin());
    };
    let catalogue = PipelineCatalogue::load_from_file(&path)
        .with_context(|| format!("Failed to load pipeline catalogue: {}", path.display()))?;
    Ok(PipelineEngine::new(catalogue)?)
}

fn parse_assignment(raw: &str) -> Result<(String, StepStatus), String> {
    let (step, status) = raw.split_once('=').ok_or_else(|| format!("expected STEP=STATUS, got '{raw}'"))?;
    let status = status.parse::<StepStatus>().map_err(|e| e.to_string())?;
    Ok((step.trim().to_string(), status))
}

fn list(engine: &PipelineEngine, json_output: bool) -> Result<()> {
    let pipelines = engine.catalogue().pipelines();

    if json_output {
        let out: Vec<_> = pipelines
            .iter()
            .map(|p| json!({ "name": p.name, "title": p.title, "steps": p.steps.len() }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("{}", format!("Pipelines ({})", pipelines.len()).bold().cyan());
    println!();
    println!("{:<12} {:<6} {}", "Name", "Steps", "Title");
    println!("{}", "─".repeat(70));
    for pipeline in pipelines {
        println!("{:<12} {:<6} {}", pipeline.name.cyan(), pipeline.steps.len(), pipeline.title);
    }
    println!();
    Ok(())
}

fn show(engine: &PipelineEngine, json_output: bool) -> Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(&engine.view())?);
        return Ok(());
    }

    let pipeline = engine.active_pipeline();
    let run_state = if engine.is_running() { "Running".green() } else { "Paused".yellow() };

    println!();
    println!("{}  {}", pipeline.title.bold().cyan(), run_state);
    println!("  {}  {}%", progress_bar(engine.completion_ratio(), 30), engine.completion_percent());
    println!("  {}", engine.progress_label().dimmed());
    println!();

    let now = Utc::now();
    for (index, step) in engine.steps().iter().enumerate() {
        print_step(index + 1, step, now);
    }
    Ok(())
}

fn print_step(number: usize, step: &PipelineStep, now: chrono::DateTime<Utc>) {
    let icon = match step.status {
        StepStatus::Completed => "✓".green(),
        StepStatus::InProgress => "●".cyan(),
        StepStatus::Error => "✗".red(),
        StepStatus::Pending => "○".dimmed(),
    };
    let mut timing = step.definition.duration.clone().unwrap_or_default();
    if let Some(elapsed) = step.elapsed(now) {
        timing = format!("{timing} (elapsed {})", format_elapsed(elapsed)).trim().to_string();
    }

    println!(
        "{} {}. {}  {}  {}",
        icon,
        number,
        step.definition.title.bold(),
        step.status.to_string().dimmed(),
        timing.dimmed()
    );
    println!("     {}", step.definition.description);
    for detail in &step.definition.details {
        println!("     {} {}", "·".dimmed(), detail.dimmed());
    }
    println!();
}

fn progress_bar(ratio: f64, width: usize) -> String {
    let filled = ((ratio.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled).cyan(), "░".repeat(width - filled).dimmed())
}
