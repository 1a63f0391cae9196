//! Typed errors for scoring configuration and record envelopes.
//!
//! The evaluator itself never fails: ungraded or unrecognized feedback
//! resolves to zero credit. These errors only arise when building an
//! [`Evaluator`](crate::scoring::Evaluator) from user configuration or when
//! unwrapping a server response envelope.

use thiserror::Error;

/// Errors raised while configuring scoring or reading records.
#[derive(Debug, Error)]
pub enum ScoreError {
    /// The partial-credit feedback pattern is not a valid regular expression.
    #[error("invalid feedback pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The partial-credit pattern must capture the passed and total counts.
    #[error("feedback pattern `{0}` must contain two capture groups (passed, total)")]
    MissingCaptureGroups(String),

    /// A feedback marker is empty, which would match every string.
    #[error("feedback marker `{0}` must not be empty")]
    EmptyMarker(&'static str),

    /// Grade bands are not strictly descending or exceed 100.
    #[error("invalid grade bands: excellent={excellent}, good={good}, pass={pass}")]
    InvalidBands { excellent: u8, good: u8, pass: u8 },

    /// The server envelope did not report success.
    #[error("server rejected request: {0}")]
    Rejected(String),
}
