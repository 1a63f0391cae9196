//! Score evaluation.
//!
//! Turns classified feedback into earned points per question, and per-question
//! points into an experiment summary with a percentage and a grade label.
//!
//! Rounding uses [`f64::round`] (half away from zero). All inputs are
//! non-negative, so this matches the conventional "round half up".

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScoreError;
use crate::feedback::{FeedbackConfig, FeedbackRules, Verdict};
use crate::model::{Experiment, Question, QuestionType, SubmissionRecord};

/// Qualitative banding of a percentage score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeLabel {
    Excellent,
    Good,
    Pass,
    Fail,
}

impl fmt::Display for GradeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradeLabel::Excellent => write!(f, "excellent"),
            GradeLabel::Good => write!(f, "good"),
            GradeLabel::Pass => write!(f, "pass"),
            GradeLabel::Fail => write!(f, "fail"),
        }
    }
}

/// Colour band of the progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressTone {
    Success,
    Warning,
    Danger,
}

/// Inclusive lower bounds for each grade label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeBands {
    #[serde(default = "default_excellent")]
    pub excellent: u8,
    #[serde(default = "default_good")]
    pub good: u8,
    #[serde(default = "default_pass")]
    pub pass: u8,
}

fn default_excellent() -> u8 {
    80
}

fn default_good() -> u8 {
    60
}

fn default_pass() -> u8 {
    40
}

impl Default for GradeBands {
    fn default() -> Self {
        Self {
            excellent: default_excellent(),
            good: default_good(),
            pass: default_pass(),
        }
    }
}

impl GradeBands {
    /// Bands must be strictly descending and no higher than 100.
    pub fn validate(&self) -> Result<(), ScoreError> {
        if self.excellent > 100 || self.excellent <= self.good || self.good <= self.pass {
            return Err(ScoreError::InvalidBands {
                excellent: self.excellent,
                good: self.good,
                pass: self.pass,
            });
        }
        Ok(())
    }

    /// Label for a percentage. Boundary values belong to the higher band.
    pub fn label(&self, percentage: u8) -> GradeLabel {
        if percentage >= self.excellent {
            GradeLabel::Excellent
        } else if percentage >= self.good {
            GradeLabel::Good
        } else if percentage >= self.pass {
            GradeLabel::Pass
        } else {
            GradeLabel::Fail
        }
    }

    /// Progress colour: anything rated good or better is a success.
    pub fn tone(&self, percentage: u8) -> ProgressTone {
        if percentage >= self.good {
            ProgressTone::Success
        } else if percentage >= self.pass {
            ProgressTone::Warning
        } else {
            ProgressTone::Danger
        }
    }
}

/// User-facing scoring configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub bands: GradeBands,
    /// Ignore the server's aggregate and recompute totals from questions.
    #[serde(default)]
    pub recompute_totals: bool,
}

/// Score for a single question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub question_id: Option<String>,
    pub verdict: Verdict,
    /// Always within `0..=max_score`.
    pub earned_score: u32,
    pub max_score: u32,
    pub is_correct: bool,
}

/// Aggregate score of an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentSummary {
    pub total_possible: u64,
    pub total_earned: u64,
    /// Always within `0..=100`.
    pub percentage: u8,
    pub label: GradeLabel,
    pub tone: ProgressTone,
}

/// A question together with its evaluation, in display order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOutcome {
    /// 1-based position within the experiment.
    pub number: usize,
    pub question_type: QuestionType,
    #[serde(default)]
    pub content: Option<String>,
    pub answer: String,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    pub has_result: bool,
    pub result: EvaluationResult,
}

/// Evaluated experiment, ready for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResult {
    pub experiment_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub submission_status: Option<String>,
    pub questions: Vec<QuestionOutcome>,
    pub summary: ExperimentSummary,
}

/// Verdict counts over one history entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionTally {
    pub correct: usize,
    pub incorrect: usize,
    pub partial: usize,
    pub ungraded: usize,
    pub unrecognized: usize,
    /// Sum of the points the server awarded per question.
    pub awarded_points: u64,
    pub total_score: Option<u32>,
}

impl SubmissionTally {
    /// Whether the server's total agrees with its per-question points.
    ///
    /// The backend floors partial credit while result pages round it, so a
    /// mismatch is expected for some code questions.
    pub fn is_consistent(&self) -> bool {
        self.total_score
            .is_none_or(|total| u64::from(total) == self.awarded_points)
    }
}

/// Configured score evaluator.
#[derive(Debug, Clone)]
pub struct Evaluator {
    rules: FeedbackRules,
    bands: GradeBands,
    trust_server_total: bool,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self {
            rules: FeedbackRules::default(),
            bands: GradeBands::default(),
            trust_server_total: true,
        }
    }
}

impl Evaluator {
    /// Build an evaluator, validating the configuration.
    pub fn new(config: &ScoringConfig) -> Result<Self, ScoreError> {
        config.bands.validate()?;
        Ok(Self {
            rules: FeedbackRules::new(&config.feedback)?,
            bands: config.bands,
            trust_server_total: !config.recompute_totals,
        })
    }

    /// Whether server aggregates override recomputed totals.
    pub fn with_server_totals(mut self, trust: bool) -> Self {
        self.trust_server_total = trust;
        self
    }

    /// Score a single question. Never fails.
    pub fn evaluate(&self, question: &Question) -> EvaluationResult {
        let verdict = self.rules.classify(question.feedback.as_deref());
        let max_score = question.max_score.unwrap_or(0);

        let earned_score = if max_score == 0 {
            0
        } else {
            match verdict {
                Verdict::Correct => max_score,
                Verdict::Partial { .. } => {
                    let raw = (verdict.credit_ratio() * f64::from(max_score)).round();
                    // More passes than cases would exceed the question's points.
                    (raw as u32).min(max_score)
                }
                Verdict::Ungraded | Verdict::Incorrect | Verdict::Unrecognized => 0,
            }
        };

        EvaluationResult {
            question_id: question.question_id.clone(),
            verdict,
            earned_score,
            max_score,
            is_correct: max_score > 0 && earned_score == max_score,
        }
    }

    /// Summarize an experiment.
    ///
    /// When `earned_override` is supplied it is authoritative for
    /// `total_earned`; per-question scores need not add up to it.
    pub fn summarize(
        &self,
        questions: &[Question],
        earned_override: Option<u32>,
    ) -> ExperimentSummary {
        let total_possible: u64 = questions
            .iter()
            .map(|q| u64::from(q.max_score.unwrap_or(0)))
            .sum();

        let total_earned = match earned_override {
            Some(earned) => u64::from(earned),
            None => questions
                .iter()
                .map(|q| u64::from(self.evaluate(q).earned_score))
                .sum(),
        };

        let percentage = percentage(total_earned, total_possible);

        ExperimentSummary {
            total_possible,
            total_earned,
            percentage,
            label: self.bands.label(percentage),
            tone: self.bands.tone(percentage),
        }
    }

    /// Evaluate every question of an experiment and summarize it.
    pub fn evaluate_experiment(&self, experiment: &Experiment) -> ExperimentResult {
        let questions: Vec<QuestionOutcome> = experiment
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| QuestionOutcome {
                number: i + 1,
                question_type: q.question_type,
                content: q.content.clone(),
                answer: q.displayed_answer().to_string(),
                correct_answer: q.correct_answer.clone(),
                feedback: q.feedback.clone(),
                explanation: q.explanation.clone(),
                has_result: q.has_result(),
                result: self.evaluate(q),
            })
            .collect();

        for outcome in &questions {
            if outcome.result.verdict == Verdict::Unrecognized {
                tracing::warn!(
                    question = outcome.result.question_id.as_deref().unwrap_or("-"),
                    feedback = outcome.feedback.as_deref().unwrap_or_default(),
                    "unrecognized feedback scored as zero"
                );
            }
        }

        let earned_override = if self.trust_server_total {
            experiment.total_score
        } else {
            None
        };

        tracing::debug!(
            experiment = experiment.experiment_id.as_deref().unwrap_or("-"),
            questions = experiment.questions.len(),
            server_total = ?experiment.total_score,
            "evaluating experiment"
        );

        ExperimentResult {
            experiment_id: experiment.experiment_id.clone(),
            title: experiment.title.clone(),
            deadline: experiment.deadline,
            submitted_at: experiment.submitted_at,
            submission_status: experiment.submission_status.clone(),
            questions,
            summary: self.summarize(&experiment.questions, earned_override),
        }
    }

    /// Count verdicts and awarded points in a submission history entry.
    pub fn tally(&self, submission: &SubmissionRecord) -> SubmissionTally {
        let mut tally = SubmissionTally {
            total_score: submission.total_score,
            ..Default::default()
        };
        for result in &submission.results {
            match self.rules.classify(result.feedback.as_deref()) {
                Verdict::Correct => tally.correct += 1,
                Verdict::Incorrect => tally.incorrect += 1,
                Verdict::Partial { .. } => tally.partial += 1,
                Verdict::Ungraded => tally.ungraded += 1,
                Verdict::Unrecognized => tally.unrecognized += 1,
            }
            tally.awarded_points += u64::from(result.score.unwrap_or(0));
        }
        tally
    }
}

/// `round(earned / possible * 100)`, 0 when nothing is possible, capped at 100.
fn percentage(earned: u64, possible: u64) -> u8 {
    if possible == 0 {
        return 0;
    }
    let pct = (earned as f64 / possible as f64 * 100.0).round();
    pct.min(100.0) as u8
}

fn default_evaluator() -> &'static Evaluator {
    static DEFAULT: OnceLock<Evaluator> = OnceLock::new();
    DEFAULT.get_or_init(Evaluator::default)
}

/// Score a question with the default rules.
pub fn evaluate_question(question: &Question) -> EvaluationResult {
    default_evaluator().evaluate(question)
}

/// Summarize questions with the default rules and bands.
pub fn summarize(questions: &[Question], earned_override: Option<u32>) -> ExperimentSummary {
    default_evaluator().summarize(questions, earned_override)
}
