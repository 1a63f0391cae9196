//! Record source trait.
//!
//! Implemented by the `expscore-client` crate for the REST API, local files,
//! and in-memory fixtures.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{Experiment, Page, SubmissionRecord};

/// Somewhere experiment records can be loaded from.
#[async_trait]
pub trait ExperimentSource: Send + Sync {
    /// Human-readable source name (e.g. "http").
    fn name(&self) -> &str;

    /// Fetch one experiment, including the student's submission results.
    async fn fetch_experiment(&self, experiment_id: &str) -> anyhow::Result<Experiment>;

    /// Fetch one page of the student's submission history.
    async fn fetch_submissions(
        &self,
        query: &SubmissionQuery,
    ) -> anyhow::Result<Page<SubmissionRecord>>;
}

/// Paging and filtering for submission history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionQuery {
    pub page: u32,
    pub limit: u32,
    /// Restrict to a single experiment.
    #[serde(default)]
    pub experiment_id: Option<String>,
}

impl Default for SubmissionQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            experiment_id: None,
        }
    }
}

impl SubmissionQuery {
    /// Zero-based offset of the first entry on this page.
    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1) * self.limit as usize
    }
}
