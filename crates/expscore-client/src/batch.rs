//! Concurrent fetching of several experiments.

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use expscore_core::model::Experiment;
use expscore_core::traits::ExperimentSource;

/// Fetch every ID with at most `parallelism` requests in flight.
///
/// Results come back in the order of `ids`; one failure does not abort the
/// others.
pub async fn fetch_all(
    source: &dyn ExperimentSource,
    ids: &[String],
    parallelism: usize,
) -> Vec<(String, anyhow::Result<Experiment>)> {
    let semaphore = Semaphore::new(parallelism.max(1));
    let mut futures = FuturesUnordered::new();

    for (index, id) in ids.iter().enumerate() {
        let semaphore = &semaphore;
        futures.push(async move {
            let result = match semaphore.acquire().await {
                Ok(_permit) => source.fetch_experiment(id).await,
                Err(_) => Err(anyhow::anyhow!("semaphore closed")),
            };
            if let Err(e) = &result {
                tracing::warn!(experiment_id = %id, source = source.name(), "fetch failed: {e:#}");
            }
            (index, result)
        });
    }

    let mut slots: Vec<Option<anyhow::Result<Experiment>>> = ids.iter().map(|_| None).collect();
    while let Some((index, result)) = futures.next().await {
        slots[index] = Some(result);
    }

    ids.iter()
        .cloned()
        .zip(slots)
        .map(|(id, slot)| {
            let result = slot.unwrap_or_else(|| Err(anyhow::anyhow!("fetch did not complete")));
            (id, result)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::*;
    use crate::mock::MockSource;

    fn source() -> MockSource {
        let experiments = ["a", "b", "c"]
            .into_iter()
            .map(|id| {
                (
                    id.to_string(),
                    Experiment {
                        experiment_id: Some(id.to_string()),
                        title: format!("Experiment {id}"),
                        ..Default::default()
                    },
                )
            })
            .collect::<HashMap<_, _>>();
        MockSource::new(experiments)
    }

    #[tokio::test]
    async fn preserves_input_order() {
        let source = source().with_delay("a", Duration::from_millis(50));
        let ids: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();

        let results = fetch_all(&source, &ids, 3).await;
        let order: Vec<_> = results.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(order, ["a", "b", "c"]);
        assert_eq!(results[0].1.as_ref().unwrap().title, "Experiment a");
        assert_eq!(source.call_count(), 3);
    }

    #[tokio::test]
    async fn failures_do_not_abort_batch() {
        let source = source();
        let ids: Vec<String> = ["a", "missing", "c"].iter().map(|s| s.to_string()).collect();

        let results = fetch_all(&source, &ids, 1).await;
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
        assert!(results[2].1.is_ok());
    }

    #[tokio::test]
    async fn zero_parallelism_still_runs() {
        let source = source();
        let results = fetch_all(&source, &["b".to_string()], 0).await;
        assert!(results[0].1.is_ok());
    }

    #[tokio::test]
    async fn empty_input() {
        let source = source();
        assert!(fetch_all(&source, &[], 4).await.is_empty());
        assert_eq!(source.call_count(), 0);
    }
}
