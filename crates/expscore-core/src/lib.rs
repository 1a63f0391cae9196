//! expscore-core: Feedback classification, score evaluation, and reports.
//!
//! This crate defines the experiment record model, the rules that turn a
//! grader's free-text feedback into a verdict, and the evaluator that turns
//! verdicts into per-question scores and an experiment summary.

pub mod error;
pub mod feedback;
pub mod loader;
pub mod model;
pub mod report;
pub mod scoring;
pub mod traits;

pub use error::ScoreError;
pub use feedback::{FeedbackRules, Verdict};
pub use scoring::{evaluate_question, summarize, EvaluationResult, Evaluator, ExperimentSummary};
