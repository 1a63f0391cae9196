//! The `expscore init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("expscore.toml").exists() {
        println!("expscore.toml already exists, skipping.");
    } else {
        std::fs::write("expscore.toml", SAMPLE_CONFIG)?;
        println!("Created expscore.toml");
    }

    std::fs::create_dir_all("samples")?;
    let sample_path = std::path::Path::new("samples/experiment.json");
    if sample_path.exists() {
        println!("samples/experiment.json already exists, skipping.");
    } else {
        std::fs::write(sample_path, SAMPLE_EXPERIMENT)?;
        println!("Created samples/experiment.json");
    }

    println!("\nNext steps:");
    println!("  1. Edit expscore.toml with your API URL and export EXPSCORE_TOKEN");
    println!("  2. Run: expscore validate --path samples/experiment.json");
    println!("  3. Run: expscore evaluate --file samples/experiment.json");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# expscore configuration

parallelism = 4

[api]
base_url = "http://localhost:8080/api"
token = "${EXPSCORE_TOKEN}"
timeout_secs = 30

[scoring]
# Ignore the server's total_score and add up question scores instead.
recompute_totals = false

[scoring.feedback]
correct_marker = "Correct"
incorrect_marker = "Incorrect"
partial_pattern = '(?i)passed (\d+)/(\d+) test cases'

[scoring.bands]
excellent = 80
good = 60
pass = 40
"#;

const SAMPLE_EXPERIMENT: &str = r#"{
  "status": "success",
  "data": {
    "experiment_id": "sample-1",
    "title": "Sample experiment",
    "description": "Three questions with every kind of feedback",
    "deadline": "2030-01-01T00:00:00Z",
    "submission_status": "submitted",
    "questions": [
      {
        "question_id": "q1",
        "type": "choice",
        "score": 10,
        "content": "Which data structure is FIFO?",
        "options": ["Stack", "Queue", "Tree"],
        "correct_answer": "Queue",
        "student_answer": "Queue",
        "feedback": "Correct"
      },
      {
        "question_id": "q2",
        "type": "blank",
        "score": 10,
        "content": "The time complexity of binary search is ____.",
        "correct_answer": "O(log n)",
        "student_answer": "O(n)",
        "feedback": "Incorrect",
        "explanation": "Each step halves the search range."
      },
      {
        "question_id": "q3",
        "type": "code",
        "score": 20,
        "content": "Implement fibonacci(n).",
        "student_code": "def fibonacci(n):\n    return n",
        "student_language": "python",
        "feedback": "Passed 3/5 test cases"
      }
    ]
  }
}
"#;
