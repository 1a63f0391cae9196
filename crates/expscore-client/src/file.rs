//! Local JSON file source.
//!
//! Layout: `<dir>/<experiment_id>.json` holds one experiment (bare or in
//! the API envelope) and `<dir>/submissions.json` holds the history list.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use expscore_core::loader::{parse_experiment_str, parse_record_str};
use expscore_core::model::{Experiment, Page, Pagination, SubmissionRecord};
use expscore_core::traits::{ExperimentSource, SubmissionQuery};

pub const SUBMISSIONS_FILE: &str = "submissions.json";

/// Reads exported API responses from a directory.
pub struct FileSource {
    dir: PathBuf,
}

impl FileSource {
    pub fn new(dir: &Path) -> Result<Self> {
        anyhow::ensure!(dir.is_dir(), "not a directory: {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }
}

/// IDs become file names; anything that could leave the directory is refused.
fn is_safe_id(id: &str) -> bool {
    !id.is_empty() && !id.contains(['/', '\\']) && id != "." && id != ".."
}

#[async_trait]
impl ExperimentSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch_experiment(&self, experiment_id: &str) -> Result<Experiment> {
        anyhow::ensure!(
            is_safe_id(experiment_id),
            "invalid experiment ID: {experiment_id:?}"
        );
        let path = self.dir.join(format!("{experiment_id}.json"));
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read experiment file: {}", path.display()))?;
        parse_experiment_str(&content)
            .with_context(|| format!("failed to load experiment: {}", path.display()))
    }

    async fn fetch_submissions(&self, query: &SubmissionQuery) -> Result<Page<SubmissionRecord>> {
        let path = self.dir.join(SUBMISSIONS_FILE);
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read submissions: {}", path.display()))?;
        let mut records: Vec<SubmissionRecord> = parse_record_str(&content)
            .with_context(|| format!("failed to load submissions: {}", path.display()))?;

        if let Some(id) = &query.experiment_id {
            records.retain(|r| r.experiment_id.as_deref() == Some(id.as_str()));
        }
        // Newest first, undated entries last.
        records.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));

        let total = records.len() as u64;
        let items = records
            .into_iter()
            .skip(query.offset())
            .take(query.limit as usize)
            .collect();

        Ok(Page {
            items,
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

    fn write_fixture(dir: &Path) {
        std::fs::write(
            dir.join("exp-1.json"),
            r#"{"status": "success", "data": {"experiment_id": "exp-1", "title": "Arrays", "questions": []}}"#,
        )
        .unwrap();
        std::fs::write(
            dir.join(SUBMISSIONS_FILE),
            r#"[
                {"submission_id": "s1", "experiment_id": "exp-1", "total_score": 5, "submitted_at": "2025-01-01T00:00:00Z"},
                {"submission_id": "s2", "experiment_id": "exp-2", "total_score": 7, "submitted_at": "2025-03-01T00:00:00Z"},
                {"submission_id": "s3", "experiment_id": "exp-1", "total_score": 9, "submitted_at": "2025-02-01T00:00:00Z"}
            ]"#,
        )
        .unwrap();
    }

    #[tokio::test]
    async fn fetch_experiment_from_file() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let source = FileSource::new(dir.path()).unwrap();

        let exp = source.fetch_experiment("exp-1").await.unwrap();
        assert_eq!(exp.title, "Arrays");
        assert!(source.fetch_experiment("missing").await.is_err());
    }

    #[tokio::test]
    async fn rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path()).unwrap();
        let err = source.fetch_experiment("../etc/passwd").await.unwrap_err();
        assert!(err.to_string().contains("invalid experiment ID"));
    }

    #[tokio::test]
    async fn submissions_are_sorted_filtered_and_paged() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let source = FileSource::new(dir.path()).unwrap();

        let all = source
            .fetch_submissions(&SubmissionQuery::default())
            .await
            .unwrap();
        let ids: Vec<_> = all
            .items
            .iter()
            .map(|s| s.submission_id.clone().unwrap())
            .collect();
        assert_eq!(ids, ["s2", "s3", "s1"]);
        assert_eq!(all.pagination.total, 3);

        let filtered = source
            .fetch_submissions(&SubmissionQuery {
                page: 2,
                limit: 1,
                experiment_id: Some("exp-1".into()),
            })
            .await
            .unwrap();
        assert_eq!(filtered.pagination.total, 2);
        assert_eq!(filtered.items.len(), 1);
        assert_eq!(filtered.items[0].submission_id.as_deref(), Some("s1"));
        assert!(!filtered.has_next());
    }

    #[test]
    fn new_requires_directory() {
        assert!(FileSource::new(Path::new("/nonexistent/expscore")).is_err());
    }
}
