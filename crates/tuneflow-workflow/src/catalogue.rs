//! Pipeline catalogue.
//!
//! A catalogue is static configuration: named pipelines, each an ordered list
//! of step definitions. The built-in catalogue holds the `dpo` and `rlhf`
//! pipelines; custom catalogues can be loaded from TOML or JSON files.

use crate::error::{WorkflowError, WorkflowResult};
use crate::step::{StepStatus, WorkflowStep};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// A named pipeline definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    /// Lookup key, e.g. "dpo".
    pub name: String,
    /// Display title.
    pub title: String,
    pub steps: Vec<WorkflowStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineCatalogue {
    pipelines: Vec<PipelineDefinition>,
}

impl PipelineCatalogue {
    /// Creates a catalogue after validating it.
    pub fn new(pipelines: Vec<PipelineDefinition>) -> WorkflowResult<Self> {
        let catalogue = Self { pipelines };
        catalogue.validate()?;
        Ok(catalogue)
    }

    /// The `dpo` and `rlhf` pipelines.
    pub fn builtin() -> Self {
        Self { pipelines: vec![dpo_pipeline(), rlhf_pipeline()] }
    }

    pub fn from_toml_str(content: &str, path: &Path) -> WorkflowResult<Self> {
        let catalogue: Self = toml::from_str(content)
            .map_err(|e| WorkflowError::Parse { path: path.to_path_buf(), message: e.to_string() })?;
        catalogue.validate()?;
        Ok(catalogue)
    }

    pub fn from_json_str(content: &str, path: &Path) -> WorkflowResult<Self> {
        let catalogue: Self = serde_json::from_str(content)
            .map_err(|e| WorkflowError::Parse { path: path.to_path_buf(), message: e.to_string() })?;
        catalogue.validate()?;
        Ok(catalogue)
    }

    /// Loads a catalogue file; `.json` files are parsed as JSON, anything else as TOML.
    pub fn load_from_file(path: impl AsRef<Path>) -> WorkflowResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| WorkflowError::Io { path: path.to_path_buf(), source: e })?;

        let is_json = path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let catalogue =
            if is_json { Self::from_json_str(&content, path)? } else { Self::from_toml_str(&content, path)? };

        tracing::info!(path = %path.display(), pipelines = catalogue.pipelines.len(), "Loaded pipeline catalogue");
        Ok(catalogue)
    }

    /// Checks names, step ids and that no pipeline is empty.
    pub fn validate(&self) -> WorkflowResult<()> {
        if self.pipelines.is_empty() {
            return Err(WorkflowError::InvalidCatalogue("catalogue has no pipelines".to_string()));
        }

        let mut names = HashSet::new();
        for pipeline in &self.pipelines {
            if pipeline.name.trim().is_empty() {
                return Err(WorkflowError::InvalidCatalogue("pipeline name is empty".to_string()));
            }
            if !names.insert(pipeline.name.as_str()) {
                return Err(WorkflowError::InvalidCatalogue(format!(
                    "duplicate pipeline name '{}'",
                    pipeline.name
                )));
            }
            if pipeline.steps.is_empty() {
                return Err(WorkflowError::InvalidCatalogue(format!(
                    "pipeline '{}' has no steps",
                    pipeline.name
                )));
            }

            let mut step_ids = HashSet::new();
            for step in &pipeline.steps {
                if step.id.trim().is_empty() {
                    return Err(WorkflowError::InvalidCatalogue(format!(
                        "pipeline '{}' has a step with an empty id",
                        pipeline.name
                    )));
                }
                if !step_ids.insert(step.id.as_str()) {
                    return Err(WorkflowError::InvalidCatalogue(format!(
                        "pipeline '{}' has duplicate step id '{}'",
                        pipeline.name, step.id
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PipelineDefinition> {
        self.pipelines.iter().find(|p| p.name == name)
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.pipelines.iter().position(|p| p.name == name)
    }

    pub fn pipelines(&self) -> &[PipelineDefinition] {
        &self.pipelines
    }

    pub fn names(&self) -> Vec<&str> {
        self.pipelines.iter().map(|p| p.name.as_str()).collect()
    }
}

impl Default for PipelineCatalogue {
    fn default() -> Self {
        Self::builtin()
    }
}

fn step(
    id: &str,
    title: &str,
    description: &str,
    status: StepStatus,
    duration: Option<&str>,
    details: &[&str],
) -> WorkflowStep {
    WorkflowStep {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        initial_status: status,
        duration: duration.map(str::to_string),
        details: details.iter().map(|d| (*d).to_string()).collect(),
    }
}

fn dpo_pipeline() -> PipelineDefinition {
    PipelineDefinition {
        name: "dpo".to_string(),
        title: "Direct Preference Optimization".to_string(),
        steps: vec![
            step(
                "data-collection",
                "Data Collection",
                "Gather preference pairs and comparison data for training",
                StepStatus::Completed,
                Some("2.3h"),
                &["Collected 10,000 preference pairs", "Validated data quality", "Applied filtering and cleaning"],
            ),
            step(
                "model-initialization",
                "Model Initialization",
                "Initialize base model and prepare for DPO training",
                StepStatus::Completed,
                Some("15m"),
                &["Loaded pre-trained model", "Configured model architecture", "Set up training parameters"],
            ),
            step(
                "preference-modeling",
                "Preference Modeling",
                "Train preference model to understand human feedback",
                StepStatus::InProgress,
                Some("1.2h"),
                &["Training preference classifier", "Current accuracy: 87.3%", "Processing batch 342/500"],
            ),
            step(
                "dpo-optimization",
                "DPO Optimization",
                "Direct preference optimization using collected feedback",
                StepStatus::Pending,
                None,
                &["Awaiting preference modeling completion", "Hyperparameters configured", "Learning rate: 1e-5"],
            ),
            step(
                "evaluation",
                "Model Evaluation",
                "Evaluate optimized model performance and alignment",
                StepStatus::Pending,
                None,
                &["Prepare evaluation datasets", "Set up benchmarking metrics", "Configure safety assessments"],
            ),
            step(
                "deployment",
                "Model Deployment",
                "Deploy optimized model to production environment",
                StepStatus::Pending,
                None,
                &["Prepare deployment configuration", "Set up monitoring systems", "Configure safety guardrails"],
            ),
        ],
    }
}

fn rlhf_pipeline() -> PipelineDefinition {
    PipelineDefinition {
        name: "rlhf".to_string(),
        title: "Reinforcement Learning from Human Feedback".to_string(),
        steps: vec![
            step(
                "supervised-finetuning",
                "Supervised Fine-tuning",
                "Initial fine-tuning on high-quality supervised data",
                StepStatus::Completed,
                Some("4.1h"),
                &["Trained on curated instruction dataset", "Achieved 92.1% task completion rate", "Model checkpoint saved"],
            ),
            step(
                "reward-modeling",
                "Reward Modeling",
                "Train reward model to predict human preferences",
                StepStatus::Completed,
                Some("2.8h"),
                &["Trained on 15K preference comparisons", "Model accuracy: 89.7%", "Validation loss: 0.23"],
            ),
            step(
                "ppo-training",
                "PPO Training",
                "Proximal Policy Optimization using trained reward model",
                StepStatus::InProgress,
                Some("3.5h"),
                &["Training with PPO algorithm", "Current reward score: 4.2/5.0", "Epoch 127/200"],
            ),
            step(
                "safety-evaluation",
                "Safety Evaluation",
                "Comprehensive safety and alignment testing",
                StepStatus::Pending,
                None,
                &["Red team adversarial testing", "Bias and fairness evaluation", "Harmful content detection"],
            ),
            step(
                "final-evaluation",
                "Final Evaluation",
                "Final performance assessment and benchmarking",
                StepStatus::Pending,
                None,
                &["Human evaluation studies", "Benchmark performance testing", "Quality assurance checks"],
            ),
        ],
    }
}
