//! The `expscore history` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use expscore_client::{create_source, load_config_from};
use expscore_core::scoring::Evaluator;
use expscore_core::traits::SubmissionQuery;

pub async fn execute(
    page: u32,
    limit: u32,
    experiment: Option<String>,
    data_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(page >= 1, "page must be at least 1");
    anyhow::ensure!(limit >= 1, "limit must be at least 1");

    let config = load_config_from(config_path.as_deref())?;
    let evaluator = Evaluator::new(&config.scoring)?;
    let source = create_source(&config.api, data_dir.as_deref())?;

    let query = SubmissionQuery {
        page,
        limit,
        experiment_id: experiment,
    };
    let submissions = source.fetch_submissions(&query).await?;

    if submissions.items.is_empty() {
        println!("No submissions found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Submission",
        "Experiment",
        "Submitted",
        "Status",
        "Score",
        "Correct",
        "Partial",
        "Incorrect",
    ]);

    let mut inconsistent = 0;
    for s in &submissions.items {
        let tally = evaluator.tally(s);
        if !tally.is_consistent() {
            inconsistent += 1;
        }
        let experiment = if s.experiment_title.is_empty() {
            s.experiment_id.clone().unwrap_or_else(|| "-".into())
        } else {
            s.experiment_title.clone()
        };
        table.add_row(vec![
            Cell::new(s.submission_id.as_deref().unwrap_or("-")),
            Cell::new(experiment),
            Cell::new(
                s.submitted_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".into()),
            ),
            Cell::new(s.status.as_deref().unwrap_or("-")),
            Cell::new(
                s.total_score
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "-".into()),
            ),
            Cell::new(tally.correct),
            Cell::new(tally.partial),
            Cell::new(tally.incorrect),
        ]);
    }

    println!("{table}");

    let p = &submissions.pagination;
    let pages = p.total.div_ceil(u64::from(p.limit.max(1)));
    println!("Page {} of {} ({} submissions)", p.page, pages.max(1), p.total);
    if submissions.has_next() {
        println!("Next page: --page {}", p.page + 1);
    }
    if inconsistent > 0 {
        println!(
            "Note: {inconsistent} submission(s) have a total that differs from the sum of their question scores."
        );
    }

    Ok(())
}
