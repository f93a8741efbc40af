//! Dataset command implementation.

use super::{preview, DEFAULT_DATASET_FILE};
use crate::config::CliConfig;
use anyhow::{Context, Result};
use chrono::Utc;
use clap::Subcommand;
use colored::Colorize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tuneflow_training::{
    add_sample_comparisons, export_file_name, load_dataset_file, write_dataset_file, DatasetStore, ItemId, Preference,
};

#[derive(Subcommand, Debug)]
pub enum DatasetCommand {
    /// Add a comparison item
    Add {
        /// Dataset file
        #[arg(short, long, default_value = DEFAULT_DATASET_FILE)]
        file: PathBuf,

        /// Prompt shown to both responses
        #[arg(long)]
        prompt: String,

        /// First response
        #[arg(long = "response-a")]
        response_a: String,

        /// Second response
        #[arg(long = "response-b")]
        response_b: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove every item with the given id
    Remove {
        /// Dataset file
        #[arg(short, long, default_value = DEFAULT_DATASET_FILE)]
        file: PathBuf,

        /// Item id
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List items in order
    List {
        /// Dataset file
        #[arg(short, long, default_value = DEFAULT_DATASET_FILE)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show annotated/total counts and the preference breakdown
    Stats {
        /// Dataset file
        #[arg(short, long, default_value = DEFAULT_DATASET_FILE)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Append the records of an exported dataset file
    Import {
        /// Dataset file
        #[arg(short, long, default_value = DEFAULT_DATASET_FILE)]
        file: PathBuf,

        /// File to import
        source: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a snapshot of the dataset
    Export {
        /// Dataset file
        #[arg(short, long, default_value = DEFAULT_DATASET_FILE)]
        file: PathBuf,

        /// Destination (defaults to dpo_dataset_<date>.json)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add the built-in sample comparisons
    Samples {
        /// Dataset file
        #[arg(short, long, default_value = DEFAULT_DATASET_FILE)]
        file: PathBuf,
    },
}

pub fn execute(command: DatasetCommand, config: &CliConfig) -> Result<()> {
    let as_json = |flag: bool| flag || config.output.wants_json();

    match command {
        DatasetCommand::Add { file, prompt, response_a, response_b, json } => {
            add(&file, &prompt, &response_a, &response_b, as_json(json))
        }
        DatasetCommand::Remove { file, id, json } => remove(&file, id, as_json(json)),
        DatasetCommand::List { file, json } => list(&file, as_json(json)),
        DatasetCommand::Stats { file, json } => stats(&file, as_json(json)),
        DatasetCommand::Import { file, source, json } => import(&file, &source, as_json(json)),
        DatasetCommand::Export { file, out, json } => export(&file, out, as_json(json)),
        DatasetCommand::Samples { file } => samples(&file),
    }
}

pub(crate) fn load(file: &Path) -> Result<DatasetStore> {
    load_dataset_file(file).with_context(|| format!("Failed to load dataset: {}", file.display()))
}

pub(crate) fn save(file: &Path, store: &DatasetStore) -> Result<()> {
    write_dataset_file(file, store).with_context(|| format!("Failed to write dataset: {}", file.display()))
}

fn add(file: &Path, prompt: &str, response_a: &str, response_b: &str, json_output: bool) -> Result<()> {
    let mut store = load(file)?;
    let id = store.add(prompt, response_a, response_b).context("Comparison item rejected")?;
    save(file, &store)?;

    if json_output {
        println!("{}", json!({ "id": id, "total": store.total_count() }));
        return Ok(());
    }

    println!("{} Added comparison {}", "✓".green(), id.to_string().cyan());
    println!("  {}", format!("{} items in {}", store.total_count(), file.display()).dimmed());
    Ok(())
}

fn remove(file: &Path, id: String, json_output: bool) -> Result<()> {
    let mut store = load(file)?;
    let id = ItemId(id);
    let removed = store.remove(&id);
    if removed {
        save(file, &store)?;
    }

    if json_output {
        println!("{}", json!({ "id": id, "removed": removed, "total": store.total_count() }));
        return Ok(());
    }

    if removed {
        println!("{} Removed comparison {}", "✓".green(), id.to_string().cyan());
    } else {
        println!("{} No comparison with id {}", "ℹ".cyan(), id.to_string().dimmed());
    }
    Ok(())
}

fn list(file: &Path, json_output: bool) -> Result<()> {
    let store = load(file)?;

    if json_output {
        println!("{}", store.export_snapshot().to_json_pretty()?);
        return Ok(());
    }

    println!();
    println!("{}", format!("Comparisons ({})", store.total_count()).bold().cyan());
    println!();

    if store.is_empty() {
        println!("  {}", "No comparisons in this dataset.".dimmed());
        println!();
        println!("  {}", "Tip: run `tuneflow-cli dataset samples` to seed the demo comparisons.".dimmed());
        return Ok(());
    }

    println!("{:<38} {:<7} {}", "ID", "Pref", "Prompt");
    println!("{}", "─".repeat(90));
    for entry in store.entries() {
        let pref = match entry.preference() {
            Preference::A => "A".green(),
            Preference::B => "B".green(),
            Preference::Tie => "tie".yellow(),
            Preference::Unset => "-".dimmed(),
        };
        println!("{:<38} {:<7} {}", entry.item.id.to_string().cyan(), pref, preview(&entry.item.prompt, 44));
    }
    println!();
    Ok(())
}

fn stats(file: &Path, json_output: bool) -> Result<()> {
    let store = load(file)?;
    let summary = store.annotation_summary();

    if json_output {
        println!(
            "{}",
            json!({
                "total": store.total_count(),
                "annotated": store.annotated_count(),
                "preferredA": summary.preferred_a,
                "preferredB": summary.preferred_b,
                "ties": summary.ties,
                "unannotated": summary.unannotated,
            })
        );
        return Ok(());
    }

    println!();
    println!("{}", "Dataset Statistics".bold().cyan());
    println!();
    println!("  Annotated:   {} / {}", store.annotated_count().to_string().green(), store.total_count());
    println!("  Prefer A:    {}", summary.preferred_a);
    println!("  Prefer B:    {}", summary.preferred_b);
    println!("  Ties:        {}", summary.ties);
    println!("  Unannotated: {}", summary.unannotated.to_string().dimmed());
    println!();
    Ok(())
}

fn import(file: &Path, source: &Path, json_output: bool) -> Result<()> {
    let mut store = load(file)?;
    let payload =
        std::fs::read_to_string(source).with_context(|| format!("Failed to read import file: {}", source.display()))?;
    let added = store.import_json(&payload).with_context(|| format!("Failed to import {}", source.display()))?;
    save(file, &store)?;

    if json_output {
        println!("{}", json!({ "imported": added, "total": store.total_count() }));
        return Ok(());
    }

    println!("{} Imported {} comparisons from {}", "✓".green(), added, source.display().to_string().cyan());
    println!("  {}", format!("{} items in {}", store.total_count(), file.display()).dimmed());
    Ok(())
}

fn export(file: &Path, out: Option<PathBuf>, json_output: bool) -> Result<()> {
    let store = load(file)?;
    let out = out.unwrap_or_else(|| PathBuf::from(export_file_name(Utc::now().date_naive())));
    save(&out, &store)?;

    if json_output {
        println!("{}", json!({ "path": out, "items": store.total_count() }));
        return Ok(());
    }

    println!("{} Exported {} comparisons to {}", "✓".green(), store.total_count(), out.display().to_string().cyan());
    Ok(())
}

fn samples(file: &Path) -> Result<()> {
    let mut store = load(file)?;
    let added = add_sample_comparisons(&mut store)?;
    save(file, &store)?;

    println!("{} Added {} sample comparisons", "✓".green(), added);
    Ok(())
}
