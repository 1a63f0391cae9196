//! Score reports with JSON persistence and attempt-to-attempt comparison.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scoring::ExperimentResult;

/// A saved evaluation of one experiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// The evaluated experiment.
    pub experiment: ExperimentResult,
}

impl ScoreReport {
    /// Wrap an evaluated experiment in a new report.
    pub fn new(experiment: ExperimentResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            experiment,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: ScoreReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare this report against a baseline attempt.
    ///
    /// Questions are matched by ID, falling back to their position when a
    /// question has no ID. Positions never match an ID, even one that reads
    /// like `#2`. When an ID repeats within a report only its first
    /// occurrence is compared; the rest are counted in `duplicate_questions`.
    /// A change larger than `threshold` points counts as a regression or
    /// improvement.
    pub fn compare(&self, baseline: &ScoreReport, threshold: u32) -> ScoreComparison {
        let (baseline_scores, baseline_dups) = score_map(baseline);
        let (current_scores, current_dups) = score_map(self);

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_questions = 0usize;

        for (key, &current) in &current_scores {
            let Some(&previous) = baseline_scores.get(key) else {
                new_questions += 1;
                continue;
            };
            let delta = i64::from(current) - i64::from(previous);
            let change = ScoreChange {
                question_id: key.to_string(),
                baseline_score: previous,
                current_score: current,
                delta,
            };
            if delta < -i64::from(threshold) {
                regressions.push(change);
            } else if delta > i64::from(threshold) {
                improvements.push(change);
            } else {
                unchanged += 1;
            }
        }

        regressions.sort_by(|a, b| a.question_id.cmp(&b.question_id));
        improvements.sort_by(|a, b| a.question_id.cmp(&b.question_id));

        let removed_questions = baseline_scores
            .keys()
            .filter(|k| !current_scores.contains_key(*k))
            .count();

        ScoreComparison {
            baseline_percentage: baseline.experiment.summary.percentage,
            current_percentage: self.experiment.summary.percentage,
            regressions,
            improvements,
            unchanged,
            new_questions,
            removed_questions,
            duplicate_questions: baseline_dups + current_dups,
        }
    }
}

/// How a question is matched between two reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum QuestionKey {
    Id(String),
    Position(usize),
}

impl fmt::Display for QuestionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKey::Id(id) => write!(f, "{id}"),
            QuestionKey::Position(n) => write!(f, "#{n}"),
        }
    }
}

/// Earned scores by question key, plus the number of repeated IDs skipped.
fn score_map(report: &ScoreReport) -> (HashMap<QuestionKey, u32>, usize) {
    let mut scores = HashMap::new();
    let mut duplicates = 0;
    for q in &report.experiment.questions {
        let key = match &q.result.question_id {
            Some(id) => QuestionKey::Id(id.clone()),
            None => QuestionKey::Position(q.number),
        };
        if scores.contains_key(&key) {
            tracing::warn!(
                question = %key,
                "duplicate question ID, comparing first occurrence only"
            );
            duplicates += 1;
            continue;
        }
        scores.insert(key, q.result.earned_score);
    }
    (scores, duplicates)
}

/// Result of comparing two reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreComparison {
    pub baseline_percentage: u8,
    pub current_percentage: u8,
    /// Questions whose earned score went down.
    pub regressions: Vec<ScoreChange>,
    /// Questions whose earned score went up.
    pub improvements: Vec<ScoreChange>,
    /// Questions with no significant change.
    pub unchanged: usize,
    /// Questions in current but not baseline.
    pub new_questions: usize,
    /// Questions in baseline but not current.
    pub removed_questions: usize,
    /// Repeated question IDs, across both reports, left out of the comparison.
    #[serde(default)]
    pub duplicate_questions: usize,
}

/// A per-question score change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreChange {
    pub question_id: String,
    pub baseline_score: u32,
    pub current_score: u32,
    pub delta: i64,
}

impl ScoreComparison {
    /// Change in overall percentage points.
    pub fn percentage_delta(&self) -> i16 {
        i16::from(self.current_percentage) - i16::from(self.baseline_percentage)
    }

    /// Format the comparison as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {}% -> {}% ({:+}), {} regressions, {} improvements, {} unchanged\n\n",
            self.baseline_percentage,
            self.current_percentage,
            self.percentage_delta(),
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged
        ));

        for (heading, changes) in [
            ("Regressions", &self.regressions),
            ("Improvements", &self.improvements),
        ] {
            if changes.is_empty() {
                continue;
            }
            md.push_str(&format!("### {heading}\n\n"));
            md.push_str("| Question | Baseline | Current | Delta |\n");
            md.push_str("|----------|----------|---------|-------|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} | {} | {} | {:+} |\n",
                    c.question_id, c.baseline_score, c.current_score, c.delta
                ));
            }
            md.push('\n');
        }

        md
    }

    /// Returns true if there are any regressions.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}
