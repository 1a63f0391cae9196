//! Client error types.

use thiserror::Error;

/// Errors that can occur when talking to the coursework API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The token is missing, expired, or lacks the student role.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The response envelope reported failure.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),
}

impl ClientError {
    /// Returns `true` if retrying the same request cannot succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ClientError::Unauthorized(_)
                | ClientError::NotFound(_)
                | ClientError::Rejected(_)
                | ClientError::InvalidResponse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanence() {
        assert!(ClientError::NotFound("x".into()).is_permanent());
        assert!(ClientError::Unauthorized("x".into()).is_permanent());
        assert!(!ClientError::Timeout(30).is_permanent());
        assert!(!ClientError::Network("reset".into()).is_permanent());
        assert!(!ClientError::Api {
            status: 503,
            message: "busy".into()
        }
        .is_permanent());
    }
}
