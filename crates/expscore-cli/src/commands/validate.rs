//! The `expscore validate` command.

use std::path::PathBuf;

use anyhow::Result;

use expscore_client::load_config_from;
use expscore_core::feedback::FeedbackRules;
use expscore_core::loader;

pub fn execute(path: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let rules = FeedbackRules::new(&config.scoring.feedback)?;
    config.scoring.bands.validate()?;

    let experiments = if path.is_dir() {
        loader::load_experiment_directory(&path)?
    } else {
        vec![loader::parse_experiment(&path)?]
    };

    let mut total_warnings = 0;

    for exp in &experiments {
        let title = if exp.title.is_empty() {
            exp.experiment_id.as_deref().unwrap_or("untitled")
        } else {
            exp.title.as_str()
        };
        println!("Experiment: {} ({} questions)", title, exp.questions.len());

        let warnings = loader::validate_experiment(exp, &rules);
        for w in &warnings {
            let prefix = w
                .question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All experiments valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
