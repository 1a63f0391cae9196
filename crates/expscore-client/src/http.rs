//! Coursework REST API source.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use tracing::instrument;

use expscore_core::model::{ApiEnvelope, Experiment, Page, SubmissionRecord};
use expscore_core::traits::{ExperimentSource, SubmissionQuery};

use crate::error::ClientError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Reads experiment results from the student endpoints of the REST API.
pub struct HttpSource {
    base_url: String,
    token: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(
        base_url: Option<String>,
        token: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ClientError::Network(format!("failed to build HTTP client: {e}")))?;

        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            timeout_secs,
            client,
        })
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| ClientError::InvalidResponse(format!("invalid URL: {e}")))
    }

    async fn get_envelope<T: DeserializeOwned>(
        &self,
        url: Url,
    ) -> Result<ApiEnvelope<T>, ClientError> {
        let mut req = self.client.get(url);
        if let Some(token) = &self.token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout(self.timeout_secs)
            } else {
                ClientError::Network(e.to_string())
            }
        })?;

        let response = check_status(response).await?;

        response
            .json::<ApiEnvelope<T>>()
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("failed to parse response: {e}")))
    }
}

/// Map HTTP error statuses onto [`ClientError`], preferring the server's
/// envelope message over the raw body.
async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status().as_u16();
    if status < 400 {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body)
        .ok()
        .and_then(|env| env.message)
        .unwrap_or(body);

    Err(match status {
        401 | 403 => ClientError::Unauthorized(message),
        404 => ClientError::NotFound(message),
        _ => ClientError::Api { status, message },
    })
}

fn unwrap_envelope<T>(envelope: ApiEnvelope<T>) -> Result<T, ClientError> {
    envelope
        .into_data()
        .map_err(|e| ClientError::Rejected(e.to_string()))
}

#[async_trait]
impl ExperimentSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self))]
    async fn fetch_experiment(&self, experiment_id: &str) -> anyhow::Result<Experiment> {
        let mut url = self.url("/student/experiments")?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidResponse("base URL cannot have a path".into()))?
            .push(experiment_id);

        let envelope = self.get_envelope::<Experiment>(url).await?;
        let experiment = unwrap_envelope(envelope)?;
        tracing::debug!(questions = experiment.questions.len(), "fetched experiment");
        Ok(experiment)
    }

    #[instrument(skip(self), fields(page = query.page, limit = query.limit))]
    async fn fetch_submissions(
        &self,
        query: &SubmissionQuery,
    ) -> anyhow::Result<Page<SubmissionRecord>> {
        let mut url = self.url("/student/submissions")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("page", &query.page.to_string())
                .append_pair("limit", &query.limit.to_string());
            if let Some(id) = &query.experiment_id {
                pairs.append_pair("experiment_id", id);
            }
        }

        let envelope = self.get_envelope::<Vec<SubmissionRecord>>(url).await?;
        let pagination = envelope.pagination.unwrap_or_default();
        let items = unwrap_envelope(envelope)?;
        Ok(Page { items, pagination })
    }
}
