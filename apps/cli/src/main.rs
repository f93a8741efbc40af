//! Tuneflow CLI - preference-tuning workbench
//!
//! Provides a `tuneflow-cli` command for curating comparison datasets,
//! annotating preferences, running the simulated DPO job and inspecting
//! workflow pipelines.

mod commands;
mod config;

use clap::{CommandFactory, Parser, Subcommand};
use commands::{annotate, dataset, pipeline, train};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Tuneflow CLI - DPO/RLHF preference-tuning workbench
#[derive(Parser, Debug)]
#[command(
    name = "tuneflow-cli",
    author,
    version,
    about = "Tuneflow - preference dataset curation and simulated DPO training",
    long_about = "Tuneflow curates prompt/response comparison datasets, records human preferences,\nruns a simulated DPO training job and tracks DPO/RLHF workflow pipelines."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage a comparison dataset file
    #[command(subcommand)]
    Dataset(dataset::DatasetCommand),

    /// Record preferences for the items of a dataset
    ///
    /// Without --id this opens an interactive review loop over every item.
    Annotate(annotate::AnnotateArgs),

    /// Run the simulated DPO training job
    Train(train::TrainArgs),

    /// Inspect DPO/RLHF workflow pipelines
    #[command(subcommand)]
    Pipeline(pipeline::PipelineCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let cli_config = config::CliConfig::discover_and_load();

    // RUST_LOG wins over --log-level, which wins over the config file.
    let level = args.log_level.clone().or_else(|| cli_config.log_level.clone()).unwrap_or_else(|| "info".to_string());
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&level))?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let Some(command) = args.command else {
        Args::command().print_help()?;
        return Ok(());
    };

    match command {
        Command::Dataset(cmd) => dataset::execute(cmd, &cli_config)?,
        Command::Annotate(cmd) => annotate::execute(cmd)?,
        Command::Train(cmd) => train::execute(cmd, &cli_config).await?,
        Command::Pipeline(cmd) => pipeline::execute(cmd, &cli_config)?,
    }

    Ok(())
}
