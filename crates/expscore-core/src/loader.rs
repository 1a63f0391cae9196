//! Experiment record loader.
//!
//! Reads experiment records from JSON files and directories, and validates
//! them for issues that make scores misleading.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use crate::feedback::{FeedbackRules, Verdict};
use crate::model::{ApiEnvelope, Experiment};

/// Parse a record from JSON text, unwrapping the API envelope if present.
///
/// An object with a `status` key is treated as a `{status, data, message}`
/// envelope; anything else is the bare record.
pub fn parse_record_str<T: DeserializeOwned>(content: &str) -> Result<T> {
    let value: serde_json::Value =
        serde_json::from_str(content).context("failed to parse JSON")?;

    let is_envelope = value
        .as_object()
        .is_some_and(|obj| obj.contains_key("status"));

    if is_envelope {
        let envelope: ApiEnvelope<T> =
            serde_json::from_value(value).context("malformed response envelope")?;
        Ok(envelope.into_data()?)
    } else {
        serde_json::from_value(value).context("malformed record")
    }
}

/// Parse an experiment from JSON text.
pub fn parse_experiment_str(content: &str) -> Result<Experiment> {
    parse_record_str(content)
}

/// Parse a single experiment JSON file.
pub fn parse_experiment(path: &Path) -> Result<Experiment> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read experiment file: {}", path.display()))?;

    parse_experiment_str(&content)
        .with_context(|| format!("failed to load experiment: {}", path.display()))
}

/// Recursively load all `.json` experiment files from a directory.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_experiment_directory(dir: &Path) -> Result<Vec<Experiment>> {
    let mut experiments = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            experiments.extend(load_experiment_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "json") {
            match parse_experiment(&path) {
                Ok(exp) => experiments.push(exp),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(experiments)
}

/// A warning from experiment validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate an experiment record for common issues.
pub fn validate_experiment(experiment: &Experiment, rules: &FeedbackRules) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_ids = HashSet::new();
    for (i, q) in experiment.questions.iter().enumerate() {
        match &q.question_id {
            Some(id) => {
                if !seen_ids.insert(id.as_str()) {
                    warnings.push(ValidationWarning {
                        question_id: Some(id.clone()),
                        message: format!("duplicate question ID: {id}"),
                    });
                }
            }
            None => warnings.push(ValidationWarning {
                question_id: None,
                message: format!("question {} has no ID", i + 1),
            }),
        }
    }

    for q in &experiment.questions {
        if q.max_score.unwrap_or(0) == 0 {
            warnings.push(ValidationWarning {
                question_id: q.question_id.clone(),
                message: "score is missing or zero; the question can never earn points".into(),
            });
        }
    }

    // Unknown wording means the grader and this tool disagree on the format.
    for q in &experiment.questions {
        if rules.classify(q.feedback.as_deref()) == Verdict::Unrecognized {
            warnings.push(ValidationWarning {
                question_id: q.question_id.clone(),
                message: format!(
                    "unrecognized feedback format, scored as zero: {:?}",
                    q.feedback.as_deref().unwrap_or_default()
                ),
            });
        }
    }

    if let Some(total) = experiment.total_score {
        let possible: u64 = experiment
            .questions
            .iter()
            .map(|q| u64::from(q.max_score.unwrap_or(0)))
            .sum();
        if u64::from(total) > possible {
            warnings.push(ValidationWarning {
                question_id: None,
                message: format!("total_score {total} exceeds the {possible} points available"),
            });
        }
    }

    warnings
}
