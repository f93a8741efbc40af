//! Annotate command implementation.

use super::dataset::{load, save};
use super::DEFAULT_DATASET_FILE;
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use inquire::{InquireError, Select, Text};
use std::fmt;
use std::path::{Path, PathBuf};
use tuneflow_training::{add_sample_comparisons, AnnotationSession, DatasetEntry, DatasetStore, ItemId, Preference};

#[derive(Args, Debug)]
pub struct AnnotateArgs {
    /// Dataset file
    #[arg(short, long, default_value = DEFAULT_DATASET_FILE)]
    file: PathBuf,

    /// Annotate a single item instead of starting a review
    #[arg(long, requires = "prefer")]
    id: Option<String>,

    /// Preference for --id (A, B, tie, unset)
    #[arg(long, requires = "id")]
    prefer: Option<Preference>,

    /// Reasoning for --id
    #[arg(long, requires = "id")]
    reasoning: Option<String>,

    /// Seed the sample comparisons when the dataset is empty
    #[arg(long)]
    samples: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    PreferA,
    PreferB,
    Tie,
    Clear,
    Skip,
    Previous,
    Next,
    Quit,
}

impl Action {
    const ALL: [Self; 8] =
        [Self::PreferA, Self::PreferB, Self::Tie, Self::Clear, Self::Skip, Self::Previous, Self::Next, Self::Quit];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::PreferA => "Prefer response A",
            Self::PreferB => "Prefer response B",
            Self::Tie => "Tie",
            Self::Clear => "Clear preference",
            Self::Skip => "Skip",
            Self::Previous => "Previous",
            Self::Next => "Next",
            Self::Quit => "Save and quit",
        };
        f.write_str(label)
    }
}

pub fn execute(args: AnnotateArgs) -> Result<()> {
    let mut store = load(&args.file)?;

    if let (Some(id), Some(preference)) = (args.id, args.prefer) {
        return annotate_one(&args.file, &mut store, ItemId(id), preference, args.reasoning);
    }

    if store.is_empty() {
        if !args.samples {
            bail!(
                "Dataset {} is empty. Add comparisons first or pass --samples to seed the demo set.",
                args.file.display()
            );
        }
        add_sample_comparisons(&mut store)?;
        save(&args.file, &store)?;
    }

    review(&args.file, &mut store)
}

fn annotate_one(
    file: &Path,
    store: &mut DatasetStore,
    id: ItemId,
    preference: Preference,
    reasoning: Option<String>,
) -> Result<()> {
    store.set_preference(&id, preference, reasoning).context("Failed to annotate")?;
    save(file, store)?;

    println!("{} {} → {}", "✓".green(), id.to_string().cyan(), preference.to_string().bold());
    println!("  {}", format!("{} of {} annotated", store.annotated_count(), store.total_count()).dimmed());
    Ok(())
}

fn review(file: &Path, store: &mut DatasetStore) -> Result<()> {
    let mut session = AnnotationSession::new();

    while let Some(entry) = session.current(store) {
        render(entry, &session, store);

        let action = match Select::new("Action:", Action::ALL.to_vec()).prompt() {
            Ok(action) => action,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Action::Quit,
            Err(e) => return Err(e).context("Prompt failed"),
        };

        let preference = match action {
            Action::PreferA => Preference::A,
            Action::PreferB => Preference::B,
            Action::Tie => Preference::Tie,
            Action::Clear => Preference::Unset,
            Action::Skip => {
                session.skip(store);
                continue;
            }
            Action::Previous => {
                session.retreat(store);
                continue;
            }
            Action::Next => {
                session.advance(store);
                continue;
            }
            Action::Quit => break,
        };

        let reasoning = if preference.is_set() { ask_reasoning(entry.reasoning())? } else { None };
        session.annotate_current(store, preference, reasoning)?;
        save(file, store)?;

        if session.is_complete(store) {
            println!();
            println!("{}", "Review complete: the last comparison is annotated.".bold().green());
            break;
        }
        if preference.is_set() {
            session.advance(store);
        }
    }

    save(file, store)?;
    let summary = store.annotation_summary();
    println!();
    println!(
        "{} Saved {} ({} annotated: {} A, {} B, {} tie)",
        "✓".green(),
        file.display().to_string().cyan(),
        summary.annotated(),
        summary.preferred_a,
        summary.preferred_b,
        summary.ties
    );
    Ok(())
}

fn ask_reasoning(existing: Option<&str>) -> Result<Option<String>> {
    let prompt = Text::new("Reasoning (optional):").with_initial_value(existing.unwrap_or_default());
    match prompt.prompt_skippable() {
        Ok(reasoning) => Ok(reasoning),
        Err(InquireError::OperationInterrupted) => Ok(existing.map(str::to_string)),
        Err(e) => Err(e).context("Prompt failed"),
    }
}

fn render(entry: &DatasetEntry, session: &AnnotationSession, store: &DatasetStore) {
    println!();
    println!(
        "{}  {}",
        format!("Comparison {}", session.position_label(store)).bold().cyan(),
        format!("{:.0}% reviewed", session.progress_percent(store)).dimmed()
    );
    println!("{}", "─".repeat(72));
    println!("{}", "Prompt".bold());
    println!("{}", entry.item.prompt);
    println!();
    println!("{}", "Response A".bold().blue());
    println!("{}", entry.item.response_a);
    println!();
    println!("{}", "Response B".bold().magenta());
    println!("{}", entry.item.response_b);
    println!();
    match entry.preference() {
        Preference::Unset => println!("{}", "No preference yet".dimmed()),
        preference => println!("Current preference: {}", preference.to_string().green()),
    }
    if let Some(reasoning) = entry.reasoning() {
        println!("Reasoning: {}", reasoning.dimmed());
    }
    println!();
}
