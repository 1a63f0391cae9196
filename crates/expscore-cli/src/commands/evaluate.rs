//! The `expscore evaluate` command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use comfy_table::{Cell, Color, Table};

use expscore_client::{create_source, fetch_all, load_config_from};
use expscore_core::feedback::Verdict;
use expscore_core::loader;
use expscore_core::model::Experiment;
use expscore_core::report::ScoreReport;
use expscore_core::scoring::{Evaluator, ExperimentResult, ProgressTone};
use expscore_report::write_html_report;

const FORMATS: &[&str] = &["text", "json", "html", "all"];

pub struct EvaluateArgs {
    pub file: Option<PathBuf>,
    pub ids: Vec<String>,
    pub data_dir: Option<PathBuf>,
    pub format: String,
    pub output: PathBuf,
    pub no_override: bool,
    pub config: Option<PathBuf>,
}

pub async fn execute(args: EvaluateArgs) -> Result<()> {
    anyhow::ensure!(
        FORMATS.contains(&args.format.as_str()),
        "unknown format '{}', expected one of: {}",
        args.format,
        FORMATS.join(", ")
    );

    let config = load_config_from(args.config.as_deref())?;
    let mut evaluator = Evaluator::new(&config.scoring)?;
    if args.no_override {
        evaluator = evaluator.with_server_totals(false);
    }

    let (experiments, failed) = match &args.file {
        Some(path) => (load_files(path)?, 0),
        None => {
            anyhow::ensure!(!args.ids.is_empty(), "pass --file or --id");
            let source = create_source(&config.api, args.data_dir.as_deref())?;
            tracing::info!(
                source = source.name(),
                count = args.ids.len(),
                "fetching experiments"
            );
            let mut experiments = Vec::new();
            let mut failed = 0;
            for (id, result) in fetch_all(source.as_ref(), &args.ids, config.parallelism).await {
                match result {
                    Ok(exp) => experiments.push(exp),
                    Err(e) => {
                        eprintln!("  ERROR: {id}: {e:#}");
                        failed += 1;
                    }
                }
            }
            (experiments, failed)
        }
    };

    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
    for (i, experiment) in experiments.iter().enumerate() {
        let result = evaluator.evaluate_experiment(experiment);
        print_result(&result);

        if args.format == "text" {
            continue;
        }
        let report = ScoreReport::new(result);
        let stem = format!("{}-{timestamp}", file_stem(experiment, i));
        if matches!(args.format.as_str(), "json" | "all") {
            let path = args.output.join(format!("{stem}.json"));
            report.save_json(&path)?;
            eprintln!("Results saved to: {}", path.display());
        }
        if matches!(args.format.as_str(), "html" | "all") {
            let path = args.output.join(format!("{stem}.html"));
            write_html_report(&report, &path)?;
            eprintln!("HTML report: {}", path.display());
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} experiment(s) could not be loaded");
    }
    Ok(())
}

fn load_files(path: &Path) -> Result<Vec<Experiment>> {
    if path.is_dir() {
        let experiments = loader::load_experiment_directory(path)?;
        anyhow::ensure!(
            !experiments.is_empty(),
            "no experiment records found in {}",
            path.display()
        );
        Ok(experiments)
    } else {
        Ok(vec![loader::parse_experiment(path)?])
    }
}

/// Report file name: the experiment ID, restricted to filename-safe characters.
fn file_stem(experiment: &Experiment, index: usize) -> String {
    let id = experiment
        .experiment_id
        .as_deref()
        .map(|id| {
            id.chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
                .collect::<String>()
        })
        .filter(|id| !id.is_empty());
    match id {
        Some(id) => format!("result-{id}"),
        None => format!("result-{}", index + 1),
    }
}

fn print_result(result: &ExperimentResult) {
    let title = if result.title.is_empty() {
        "Untitled experiment"
    } else {
        result.title.as_str()
    };
    println!("{title}");

    let mut table = Table::new();
    table.set_header(vec!["#", "Type", "Verdict", "Score", "Answer"]);

    for q in &result.questions {
        let r = &q.result;
        let color = match r.verdict {
            Verdict::Correct => Color::Green,
            Verdict::Partial { .. } => Color::Yellow,
            Verdict::Incorrect | Verdict::Unrecognized => Color::Red,
            Verdict::Ungraded => Color::Reset,
        };
        table.add_row(vec![
            Cell::new(q.number),
            Cell::new(q.question_type.label()),
            Cell::new(r.verdict).fg(color),
            Cell::new(format!("{}/{}", r.earned_score, r.max_score)),
            Cell::new(truncate(&q.answer, 40)),
        ]);
    }

    println!("{table}");

    let s = &result.summary;
    let tone = match s.tone {
        ProgressTone::Success => "",
        ProgressTone::Warning => " (!)",
        ProgressTone::Danger => " (!!)",
    };
    println!(
        "Score: {}/{} ({}%) {}{tone}\n",
        s.total_earned, s.total_possible, s.percentage, s.label
    );
}

/// First line of `s`, cut to `max` characters.
fn truncate(s: &str, max: usize) -> String {
    let line = s.lines().next().unwrap_or_default();
    if line.chars().count() > max || line.len() < s.trim_end().len() {
        let cut: String = line.chars().take(max).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}
