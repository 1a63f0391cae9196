//! Experiment record types as the coursework REST API emits them.
//!
//! Every field is optional on input: records come from an external service
//! and the evaluator must accept any subset of fields without failing.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ScoreError;

/// Placeholder shown when a student left a question blank.
pub const UNANSWERED: &str = "unanswered";

/// Kind of question. Informational only; it never changes the scoring math.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Choice,
    Blank,
    Code,
    #[default]
    #[serde(other)]
    Other,
}

impl QuestionType {
    /// Human-readable label used by renderers.
    pub fn label(&self) -> &'static str {
        match self {
            QuestionType::Choice => "Multiple choice",
            QuestionType::Blank => "Fill in the blank",
            QuestionType::Code | QuestionType::Other => "Programming",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::Choice => write!(f, "choice"),
            QuestionType::Blank => write!(f, "blank"),
            QuestionType::Code => write!(f, "code"),
            QuestionType::Other => write!(f, "other"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "choice" => Ok(QuestionType::Choice),
            "blank" => Ok(QuestionType::Blank),
            "code" => Ok(QuestionType::Code),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// A graded question inside an experiment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Question {
    /// Opaque identifier, unique within the experiment.
    #[serde(default, alias = "id", deserialize_with = "opaque_id")]
    pub question_id: Option<String>,
    #[serde(rename = "type", default)]
    pub question_type: QuestionType,
    /// Points available for this question.
    #[serde(
        rename = "score",
        alias = "max_score",
        default,
        deserialize_with = "lenient_points"
    )]
    pub max_score: Option<u32>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Free-text verdict written by the grading backend. `None` means ungraded.
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub student_answer: Option<String>,
    #[serde(default)]
    pub student_code: Option<String>,
    #[serde(default)]
    pub student_language: Option<String>,
}

impl Question {
    /// The student's response as it should be displayed.
    ///
    /// Code questions show the submitted code, all others the submitted
    /// answer. Missing or empty responses show [`UNANSWERED`].
    pub fn displayed_answer(&self) -> &str {
        let answer = match self.question_type {
            QuestionType::Code => self.student_code.as_deref(),
            _ => self.student_answer.as_deref(),
        };
        answer.filter(|a| !a.is_empty()).unwrap_or(UNANSWERED)
    }

    /// Whether the question carries any grading output worth tagging.
    pub fn has_result(&self) -> bool {
        non_empty(&self.feedback) || non_empty(&self.explanation)
    }
}

fn non_empty(s: &Option<String>) -> bool {
    s.as_deref().is_some_and(|s| !s.is_empty())
}

/// A file attached to an experiment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default, deserialize_with = "opaque_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// The student-facing experiment detail record, including submission results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Experiment {
    #[serde(default, deserialize_with = "opaque_id")]
    pub experiment_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub submission_status: Option<String>,
    /// Server-computed aggregate of earned points. Authoritative when present.
    #[serde(default, deserialize_with = "lenient_points")]
    pub total_score: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub questions: Vec<Question>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attachments: Vec<Attachment>,
}

/// One graded question inside a submission history entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionResultRecord {
    #[serde(default, deserialize_with = "opaque_id")]
    pub question_id: Option<String>,
    #[serde(rename = "type", default)]
    pub question_type: QuestionType,
    /// Points the server awarded.
    #[serde(default, deserialize_with = "lenient_points")]
    pub score: Option<u32>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// One entry of a student's submission history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionRecord {
    #[serde(default, deserialize_with = "opaque_id")]
    pub submission_id: Option<String>,
    #[serde(default, deserialize_with = "opaque_id")]
    pub experiment_id: Option<String>,
    #[serde(default)]
    pub experiment_title: String,
    #[serde(default, deserialize_with = "lenient_points")]
    pub total_score: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<QuestionResultRecord>,
}

/// Paging metadata returned with list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub total: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            total: 0,
        }
    }
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

/// A page of list results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    /// Whether more entries exist after this page.
    pub fn has_next(&self) -> bool {
        u64::from(self.pagination.page) * u64::from(self.pagination.limit) < self.pagination.total
    }
}

/// The `{status, data, message}` wrapper every API response uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub status: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap the payload of a successful response.
    pub fn into_data(self) -> Result<T, ScoreError> {
        match (self.status.as_str(), self.data) {
            ("success", Some(data)) => Ok(data),
            _ => Err(ScoreError::Rejected(
                self.message
                    .unwrap_or_else(|| "experiment result not found".to_string()),
            )),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

/// Accept identifiers emitted either as strings (UUIDs) or integers.
fn opaque_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawId>::deserialize(deserializer)?;
    Ok(raw.map(|id| match id {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    }))
}

/// Point values arrive as any JSON number.
///
/// Fractions round half away from zero, negatives clamp to 0 and values past
/// `u32::MAX` saturate. Anything that is not a number is treated as absent.
fn lenient_points<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| v.as_f64()).and_then(|n| {
        // `as` saturates and maps NaN to 0
        n.is_finite().then(|| n.round().max(0.0) as u32)
    }))
}

/// Timestamps that fail to parse are treated as absent.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }))
}

/// Go encodes nil slices as `null`; treat those like missing lists.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_type_parse_and_unknown() {
        assert_eq!("choice".parse::<QuestionType>().unwrap(), QuestionType::Choice);
        assert_eq!("CODE".parse::<QuestionType>().unwrap(), QuestionType::Code);
        assert!("essay".parse::<QuestionType>().is_err());

        let q: Question = serde_json::from_str(r#"{"type": "essay"}"#).unwrap();
        assert_eq!(q.question_type, QuestionType::Other);
        assert_eq!(q.question_type.label(), "Programming");
    }

    #[test]
    fn question_accepts_numeric_and_string_ids() {
        let q: Question = serde_json::from_str(r#"{"question_id": 7, "score": 5}"#).unwrap();
        assert_eq!(q.question_id.as_deref(), Some("7"));
        assert_eq!(q.max_score, Some(5));

        let q: Question =
            serde_json::from_str(r#"{"id": "0b5e-uuid", "type": "blank"}"#).unwrap();
        assert_eq!(q.question_id.as_deref(), Some("0b5e-uuid"));
    }

    #[test]
    fn question_tolerates_empty_record() {
        let q: Question = serde_json::from_str("{}").unwrap();
        assert!(q.question_id.is_none());
        assert!(q.max_score.is_none());
        assert!(q.feedback.is_none());
        assert!(!q.has_result());
    }

    #[test]
    fn displayed_answer_defaults_to_placeholder() {
        let q: Question = serde_json::from_str(
            r#"{"type": "blank", "score": 10, "feedback": null, "student_answer": null}"#,
        )
        .unwrap();
        assert_eq!(q.displayed_answer(), UNANSWERED);

        let code = Question {
            question_type: QuestionType::Code,
            student_code: Some("print(1)".into()),
            student_answer: Some("ignored".into()),
            ..Default::default()
        };
        assert_eq!(code.displayed_answer(), "print(1)");

        let empty = Question {
            question_type: QuestionType::Choice,
            student_answer: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(empty.displayed_answer(), UNANSWERED);
    }

    #[test]
    fn experiment_handles_nulls_and_bad_dates() {
        let json = r#"{
            "experiment_id": "exp-1",
            "title": "Loops",
            "deadline": "not a date",
            "submitted_at": null,
            "total_score": 0,
            "questions": null,
            "attachments": null
        }"#;
        let exp: Experiment = serde_json::from_str(json).unwrap();
        assert_eq!(exp.experiment_id.as_deref(), Some("exp-1"));
        assert!(exp.deadline.is_none());
        assert!(exp.questions.is_empty());
        assert_eq!(exp.total_score, Some(0));
    }

    #[test]
    fn points_accept_any_json_number() {
        let q: Question = serde_json::from_str(r#"{"score": 2.5, "feedback": "Correct"}"#).unwrap();
        assert_eq!(q.max_score, Some(3));
        assert_eq!(q.feedback.as_deref(), Some("Correct"));

        let q: Question = serde_json::from_str(r#"{"max_score": -4}"#).unwrap();
        assert_eq!(q.max_score, Some(0));

        let q: Question = serde_json::from_str(r#"{"score": 1e12}"#).unwrap();
        assert_eq!(q.max_score, Some(u32::MAX));

        let q: Question = serde_json::from_str(r#"{"score": "ten"}"#).unwrap();
        assert!(q.max_score.is_none());

        let exp: Experiment =
            serde_json::from_str(r#"{"total_score": 7.5, "questions": [{"score": 10.0}]}"#)
                .unwrap();
        assert_eq!(exp.total_score, Some(8));
        assert_eq!(exp.questions[0].max_score, Some(10));

        let sub: SubmissionRecord =
            serde_json::from_str(r#"{"total_score": 4.2, "results": [{"score": 1.4}]}"#).unwrap();
        assert_eq!(sub.total_score, Some(4));
        assert_eq!(sub.results[0].score, Some(1));
    }

    #[test]
    fn experiment_parses_rfc3339_deadline() {
        let exp: Experiment =
            serde_json::from_str(r#"{"deadline": "2025-12-31T00:00:00Z"}"#).unwrap();
        assert_eq!(
            exp.deadline.unwrap().format("%Y-%m-%d").to_string(),
            "2025-12-31"
        );
    }

    #[test]
    fn envelope_success_and_rejection() {
        let ok: ApiEnvelope<Experiment> =
            serde_json::from_str(r#"{"status": "success", "data": {"title": "T"}}"#).unwrap();
        assert_eq!(ok.into_data().unwrap().title, "T");

        let err: ApiEnvelope<Experiment> =
            serde_json::from_str(r#"{"status": "error", "message": "Experiment not found"}"#)
                .unwrap();
        let msg = err.into_data().unwrap_err().to_string();
        assert!(msg.contains("Experiment not found"));

        let bare: ApiEnvelope<Experiment> = serde_json::from_str(r#"{"status": "error"}"#).unwrap();
        assert!(bare
            .into_data()
            .unwrap_err()
            .to_string()
            .contains("not found"));
    }

    #[test]
    fn page_has_next() {
        let page = Page::<SubmissionRecord> {
            items: vec![],
            pagination: Pagination {
                page: 1,
                limit: 10,
                total: 25,
            },
        };
        assert!(page.has_next());

        let last = Page::<SubmissionRecord> {
            items: vec![],
            pagination: Pagination {
                page: 3,
                limit: 10,
                total: 25,
            },
        };
        assert!(!last.has_next());
    }
}
