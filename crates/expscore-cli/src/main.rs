//! expscore CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "expscore",
    version,
    about = "Coursework experiment score evaluator"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score an experiment result and print the summary
    Evaluate {
        /// Experiment JSON file or directory of files
        #[arg(long, conflicts_with = "id", required_unless_present = "id")]
        file: Option<PathBuf>,

        /// Experiment IDs to fetch (comma-separated)
        #[arg(long, value_delimiter = ',')]
        id: Vec<String>,

        /// Read records from exported JSON files instead of the API
        #[arg(long, conflicts_with = "file")]
        data_dir: Option<PathBuf>,

        /// Output format: text, json, html, all
        #[arg(long, default_value = "text")]
        format: String,

        /// Output directory for saved reports
        #[arg(long, default_value = "./expscore-results")]
        output: PathBuf,

        /// Recompute totals from questions instead of trusting the server total
        #[arg(long)]
        no_override: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List past submissions
    History {
        /// Page number (1-based)
        #[arg(long, default_value = "1")]
        page: u32,

        /// Entries per page
        #[arg(long, default_value = "10")]
        limit: u32,

        /// Only show submissions for this experiment
        #[arg(long)]
        experiment: Option<String>,

        /// Read records from exported JSON files instead of the API
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compare two saved score reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Points a question may drop before it counts as a regression
        #[arg(long, default_value = "0")]
        threshold: u32,

        /// Exit code 1 if regressions found
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Check experiment records for scoring problems
    Validate {
        /// Experiment JSON file or directory
        #[arg(long)]
        path: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and a sample experiment
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("expscore=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Evaluate {
            file,
            id,
            data_dir,
            format,
            output,
            no_override,
            config,
        } => {
            commands::evaluate::execute(commands::evaluate::EvaluateArgs {
                file,
                ids: id,
                data_dir,
                format,
                output,
                no_override,
                config,
            })
            .await
        }
        Commands::History {
            page,
            limit,
            experiment,
            data_dir,
            config,
        } => commands::history::execute(page, limit, experiment, data_dir, config).await,
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_regression, format),
        Commands::Validate { path, config } => commands::validate::execute(path, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
