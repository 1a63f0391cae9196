//! Mock source for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use expscore_core::model::{Experiment, Page, Pagination, SubmissionRecord};
use expscore_core::traits::{ExperimentSource, SubmissionQuery};

use crate::error::ClientError;

/// An in-memory source for exercising callers without a server.
pub struct MockSource {
    experiments: HashMap<String, Experiment>,
    submissions: Vec<SubmissionRecord>,
    /// Per-ID artificial latency.
    delays: HashMap<String, Duration>,
    call_count: AtomicU32,
    last_experiment_id: Mutex<Option<String>>,
}

impl MockSource {
    pub fn new(experiments: HashMap<String, Experiment>) -> Self {
        Self {
            experiments,
            submissions: Vec::new(),
            delays: HashMap::new(),
            call_count: AtomicU32::new(0),
            last_experiment_id: Mutex::new(None),
        }
    }

    pub fn with_submissions(mut self, submissions: Vec<SubmissionRecord>) -> Self {
        self.submissions = submissions;
        self
    }

    /// Delay responses for one ID, to shuffle completion order.
    pub fn with_delay(mut self, experiment_id: &str, delay: Duration) -> Self {
        self.delays.insert(experiment_id.to_string(), delay);
        self
    }

    /// Get the number of calls made to this source.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last experiment ID requested.
    pub fn last_experiment_id(&self) -> Option<String> {
        self.last_experiment_id.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExperimentSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_experiment(&self, experiment_id: &str) -> anyhow::Result<Experiment> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_experiment_id.lock().unwrap() = Some(experiment_id.to_string());

        if let Some(delay) = self.delays.get(experiment_id) {
            tokio::time::sleep(*delay).await;
        }

        self.experiments
            .get(experiment_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("experiment {experiment_id}")).into())
    }

    async fn fetch_submissions(
        &self,
        query: &SubmissionQuery,
    ) -> anyhow::Result<Page<SubmissionRecord>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);

        let matching: Vec<_> = self
            .submissions
            .iter()
            .filter(|s| {
                query
                    .experiment_id
                    .as_deref()
                    .is_none_or(|id| s.experiment_id.as_deref() == Some(id))
            })
            .cloned()
            .collect();
        let total = matching.len() as u64;

        Ok(Page {
            items: matching
                .into_iter()
                .skip(query.offset())
                .take(query.limit as usize)
                .collect(),
            pagination: Pagination {
                page: query.page.max(1),
                limit: query.limit,
                total,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_returns_known_experiment() {
        let mut experiments = HashMap::new();
        experiments.insert(
            "exp-1".to_string(),
            Experiment {
                title: "Mocked".into(),
                ..Default::default()
            },
        );
        let source = MockSource::new(experiments);

        let exp = source.fetch_experiment("exp-1").await.unwrap();
        assert_eq!(exp.title, "Mocked");
        assert_eq!(source.call_count(), 1);
        assert_eq!(source.last_experiment_id().as_deref(), Some("exp-1"));
    }

    #[tokio::test]
    async fn mock_unknown_experiment_is_not_found() {
        let source = MockSource::new(HashMap::new());
        let err = source.fetch_experiment("nope").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ClientError>(),
            Some(ClientError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn mock_pages_submissions() {
        let submissions = (0..5)
            .map(|i| SubmissionRecord {
                submission_id: Some(format!("s{i}")),
                experiment_id: Some(if i % 2 == 0 { "even" } else { "odd" }.into()),
                ..Default::default()
            })
            .collect();
        let source = MockSource::new(HashMap::new()).with_submissions(submissions);

        let page = source
            .fetch_submissions(&SubmissionQuery {
                page: 1,
                limit: 2,
                experiment_id: Some("even".into()),
            })
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 3);
        assert_eq!(page.items.len(), 2);
        assert!(page.has_next());
    }
}
