//! Grader feedback classification.
//!
//! The grading backend reports results as free text: `Correct`, `Incorrect`,
//! `Passed 3/5 test cases`, or an error message. Scoring is coupled to that
//! wording, so the markers and the partial-credit pattern are configurable
//! and anything else degrades to [`Verdict::Unrecognized`].

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ScoreError;

/// Marker the backend writes for full credit. Case-sensitive.
pub const DEFAULT_CORRECT_MARKER: &str = "Correct";
/// Marker the backend writes for no credit. Case-sensitive.
pub const DEFAULT_INCORRECT_MARKER: &str = "Incorrect";
/// Partial credit for code questions, matched case-insensitively.
pub const DEFAULT_PARTIAL_PATTERN: &str = r"(?i)passed (\d+)/(\d+) test cases";

/// What a feedback string says about a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Verdict {
    /// No feedback yet.
    Ungraded,
    /// Full credit.
    Correct,
    /// No credit.
    Incorrect,
    /// `passed` of `total` test cases succeeded. `total` is never zero.
    Partial { passed: u32, total: u32 },
    /// Feedback is present but in no known format. Earns zero credit.
    Unrecognized,
}

impl Verdict {
    /// Short lowercase name, matching the serialized `kind` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Verdict::Ungraded => "ungraded",
            Verdict::Correct => "correct",
            Verdict::Incorrect => "incorrect",
            Verdict::Partial { .. } => "partial",
            Verdict::Unrecognized => "unrecognized",
        }
    }

    /// Fraction of the question's points this verdict is worth.
    pub fn credit_ratio(&self) -> f64 {
        match self {
            Verdict::Correct => 1.0,
            Verdict::Partial { passed, total } if *total > 0 => {
                f64::from(*passed) / f64::from(*total)
            }
            _ => 0.0,
        }
    }

    /// The feedback text the grading backend writes for this verdict.
    ///
    /// `Ungraded` and `Unrecognized` have no canonical text.
    pub fn feedback_text(&self) -> Option<String> {
        match self {
            Verdict::Correct => Some(DEFAULT_CORRECT_MARKER.to_string()),
            Verdict::Incorrect => Some(DEFAULT_INCORRECT_MARKER.to_string()),
            Verdict::Partial { passed, total } => {
                Some(format!("Passed {passed}/{total} test cases"))
            }
            Verdict::Ungraded | Verdict::Unrecognized => None,
        }
    }

    /// Exact-match grading used for choice and blank questions.
    pub fn from_answer_match(expected: &str, given: &str) -> Verdict {
        if expected == given {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Partial { passed, total } => write!(f, "partial ({passed}/{total})"),
            other => f.write_str(other.kind()),
        }
    }
}

/// Serializable description of the feedback rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackConfig {
    #[serde(default = "default_correct_marker")]
    pub correct_marker: String,
    #[serde(default = "default_incorrect_marker")]
    pub incorrect_marker: String,
    #[serde(default = "default_partial_pattern")]
    pub partial_pattern: String,
}

fn default_correct_marker() -> String {
    DEFAULT_CORRECT_MARKER.to_string()
}

fn default_incorrect_marker() -> String {
    DEFAULT_INCORRECT_MARKER.to_string()
}

fn default_partial_pattern() -> String {
    DEFAULT_PARTIAL_PATTERN.to_string()
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            correct_marker: default_correct_marker(),
            incorrect_marker: default_incorrect_marker(),
            partial_pattern: default_partial_pattern(),
        }
    }
}

/// Compiled feedback rules.
#[derive(Debug, Clone)]
pub struct FeedbackRules {
    correct_marker: String,
    incorrect_marker: String,
    partial: Regex,
}

impl FeedbackRules {
    /// Compile rules from configuration.
    pub fn new(config: &FeedbackConfig) -> Result<Self, ScoreError> {
        if config.correct_marker.is_empty() {
            return Err(ScoreError::EmptyMarker("correct_marker"));
        }
        if config.incorrect_marker.is_empty() {
            return Err(ScoreError::EmptyMarker("incorrect_marker"));
        }
        let partial =
            Regex::new(&config.partial_pattern).map_err(|source| ScoreError::InvalidPattern {
                pattern: config.partial_pattern.clone(),
                source,
            })?;
        // captures_len counts the implicit whole-match group.
        if partial.captures_len() < 3 {
            return Err(ScoreError::MissingCaptureGroups(
                config.partial_pattern.clone(),
            ));
        }
        Ok(Self {
            correct_marker: config.correct_marker.clone(),
            incorrect_marker: config.incorrect_marker.clone(),
            partial,
        })
    }

    /// Classify a feedback string.
    ///
    /// Rules apply in order: absent or empty feedback is ungraded, the
    /// correct marker wins over the incorrect marker, then the partial
    /// pattern is tried. A pattern match with a zero total, or counts that do
    /// not fit in `u32`, falls through to `Unrecognized`.
    pub fn classify(&self, feedback: Option<&str>) -> Verdict {
        let Some(text) = feedback.filter(|f| !f.is_empty()) else {
            return Verdict::Ungraded;
        };

        if text.contains(&self.correct_marker) {
            return Verdict::Correct;
        }
        if text.contains(&self.incorrect_marker) {
            return Verdict::Incorrect;
        }

        if let Some(caps) = self.partial.captures(text) {
            let passed = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
            let total = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
            if let (Some(passed), Some(total)) = (passed, total) {
                if total > 0 {
                    return Verdict::Partial { passed, total };
                }
            }
        }

        tracing::debug!(feedback = text, "feedback in unrecognized format");
        Verdict::Unrecognized
    }
}

impl Default for FeedbackRules {
    fn default() -> Self {
        Self {
            correct_marker: DEFAULT_CORRECT_MARKER.to_string(),
            incorrect_marker: DEFAULT_INCORRECT_MARKER.to_string(),
            partial: Regex::new(DEFAULT_PARTIAL_PATTERN).expect("default pattern is valid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(feedback: Option<&str>) -> Verdict {
        FeedbackRules::default().classify(feedback)
    }

    #[test]
    fn absent_or_empty_is_ungraded() {
        assert_eq!(classify(None), Verdict::Ungraded);
        assert_eq!(classify(Some("")), Verdict::Ungraded);
    }

    #[test]
    fn markers_are_case_sensitive() {
        assert_eq!(classify(Some("Correct")), Verdict::Correct);
        assert_eq!(classify(Some("Incorrect")), Verdict::Incorrect);
        // "Incorrect" does not contain "Correct"; lowercase forms match nothing.
        assert_eq!(classify(Some("correct")), Verdict::Unrecognized);
        assert_eq!(classify(Some("incorrect")), Verdict::Unrecognized);
    }

    #[test]
    fn correct_marker_checked_before_incorrect() {
        assert_eq!(
            classify(Some("Correct answer, Incorrect units")),
            Verdict::Correct
        );
    }

    #[test]
    fn incorrect_marker_checked_before_partial_pattern() {
        assert_eq!(
            classify(Some("Incorrect: passed 2/5 test cases")),
            Verdict::Incorrect
        );
    }

    #[test]
    fn partial_pattern_is_case_insensitive() {
        assert_eq!(
            classify(Some("passed 3/5 test cases")),
            Verdict::Partial {
                passed: 3,
                total: 5
            }
        );
        assert_eq!(
            classify(Some("Passed 2/4 test cases")),
            Verdict::Partial {
                passed: 2,
                total: 4
            }
        );
        assert_eq!(
            classify(Some("PASSED 0/3 TEST CASES")),
            Verdict::Partial {
                passed: 0,
                total: 3
            }
        );
    }

    #[test]
    fn zero_total_is_unrecognized() {
        assert_eq!(classify(Some("Passed 0/0 test cases")), Verdict::Unrecognized);
    }

    #[test]
    fn overflowing_counts_are_unrecognized() {
        assert_eq!(
            classify(Some("Passed 99999999999/5 test cases")),
            Verdict::Unrecognized
        );
    }

    #[test]
    fn evaluation_errors_are_unrecognized() {
        assert_eq!(
            classify(Some("Evaluation error: connection refused")),
            Verdict::Unrecognized
        );
        assert_eq!(classify(Some("looks fine to me")), Verdict::Unrecognized);
    }

    #[test]
    fn rendered_feedback_classifies_back() {
        for verdict in [
            Verdict::Correct,
            Verdict::Incorrect,
            Verdict::Partial {
                passed: 4,
                total: 7,
            },
        ] {
            let text = verdict.feedback_text().unwrap();
            assert_eq!(classify(Some(&text)), verdict, "text: {text}");
        }
        assert!(Verdict::Ungraded.feedback_text().is_none());
    }

    #[test]
    fn answer_match_grading() {
        assert_eq!(Verdict::from_answer_match("A", "A"), Verdict::Correct);
        assert_eq!(Verdict::from_answer_match("A", "B"), Verdict::Incorrect);
        assert_eq!(Verdict::from_answer_match("A", "a"), Verdict::Incorrect);
    }

    #[test]
    fn custom_rules() {
        let config = FeedbackConfig {
            correct_marker: "AC".into(),
            incorrect_marker: "WA".into(),
            partial_pattern: r"(\d+) of (\d+) cases ok".into(),
        };
        let rules = FeedbackRules::new(&config).unwrap();
        assert_eq!(rules.classify(Some("AC")), Verdict::Correct);
        assert_eq!(rules.classify(Some("WA on test 3")), Verdict::Incorrect);
        assert_eq!(
            rules.classify(Some("2 of 8 cases ok")),
            Verdict::Partial {
                passed: 2,
                total: 8
            }
        );
        assert_eq!(rules.classify(Some("Correct")), Verdict::Unrecognized);
    }

    #[test]
    fn invalid_rules_are_rejected() {
        let bad_regex = FeedbackConfig {
            partial_pattern: "passed (".into(),
            ..Default::default()
        };
        assert!(matches!(
            FeedbackRules::new(&bad_regex),
            Err(ScoreError::InvalidPattern { .. })
        ));

        let no_groups = FeedbackConfig {
            partial_pattern: "passed".into(),
            ..Default::default()
        };
        assert!(matches!(
            FeedbackRules::new(&no_groups),
            Err(ScoreError::MissingCaptureGroups(_))
        ));

        let empty_marker = FeedbackConfig {
            correct_marker: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            FeedbackRules::new(&empty_marker),
            Err(ScoreError::EmptyMarker("correct_marker"))
        ));
    }

    #[test]
    fn verdict_serializes_with_kind_tag() {
        let json = serde_json::to_value(Verdict::Partial {
            passed: 1,
            total: 2,
        })
        .unwrap();
        assert_eq!(json["kind"], "partial");
        assert_eq!(json["passed"], 1);
        assert_eq!(serde_json::to_value(Verdict::Ungraded).unwrap()["kind"], "ungraded");
    }
}
