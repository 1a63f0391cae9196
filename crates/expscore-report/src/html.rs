//! HTML result page generator.
//!
//! Produces a self-contained HTML file with all CSS inlined: a summary card
//! with the score, percentage bar and grade label, followed by one card per
//! question.

use anyhow::Result;
use std::path::Path;

use expscore_core::report::ScoreReport;
use expscore_core::scoring::{GradeLabel, ProgressTone, QuestionOutcome};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn tone_class(tone: ProgressTone) -> &'static str {
    match tone {
        ProgressTone::Success => "success",
        ProgressTone::Warning => "warning",
        ProgressTone::Danger => "danger",
    }
}

fn label_text(label: GradeLabel) -> &'static str {
    match label {
        GradeLabel::Excellent => "Excellent",
        GradeLabel::Good => "Good",
        GradeLabel::Pass => "Pass",
        GradeLabel::Fail => "Fail",
    }
}

/// Generate the result page for an evaluated experiment.
pub fn generate_html(report: &ScoreReport) -> String {
    let exp = &report.experiment;
    let summary = &exp.summary;
    let title = if exp.title.is_empty() {
        "Untitled experiment"
    } else {
        exp.title.as_str()
    };

    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>{} | experiment result</title>\n",
        html_escape(title)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(title)));
    let mut meta = Vec::new();
    if let Some(deadline) = exp.deadline {
        meta.push(format!("Deadline: {}", deadline.format("%Y-%m-%d %H:%M UTC")));
    }
    if let Some(submitted) = exp.submitted_at {
        meta.push(format!("Submitted: {}", submitted.format("%Y-%m-%d %H:%M UTC")));
    }
    if let Some(status) = &exp.submission_status {
        meta.push(format!("Status: {}", html_escape(status)));
    }
    meta.push(format!(
        "Generated {}",
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str(&format!("<p class=\"meta\">{}</p>\n", meta.join(" | ")));
    html.push_str("</header>\n");

    // Summary card
    let tone = tone_class(summary.tone);
    html.push_str("<section class=\"summary card\">\n");
    html.push_str(&format!(
        "<div class=\"score\"><span class=\"earned\">{}</span> / {}</div>\n",
        summary.total_earned, summary.total_possible
    ));
    html.push_str(&format!(
        "<div class=\"progress\"><div class=\"bar {tone}\" style=\"width: {}%\"></div></div>\n",
        summary.percentage
    ));
    html.push_str(&format!(
        "<p class=\"percentage\">{}% <span class=\"label {tone}\">{}</span></p>\n",
        summary.percentage,
        label_text(summary.label)
    ));
    html.push_str("</section>\n");

    // Questions
    html.push_str("<section class=\"questions\">\n");
    html.push_str("<h2>Questions</h2>\n");
    if exp.questions.is_empty() {
        html.push_str("<p class=\"empty\">This experiment has no questions.</p>\n");
    }
    for q in &exp.questions {
        html.push_str(&question_card(q));
    }
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("</body>\n</html>");
    html
}

fn question_card(q: &QuestionOutcome) -> String {
    let r = &q.result;
    let mut card = String::new();

    card.push_str("<article class=\"question card\">\n");
    card.push_str("<div class=\"question-header\">\n");
    card.push_str(&format!(
        "<span class=\"number\">Question {}</span> <span class=\"type\">{}</span>\n",
        q.number,
        q.question_type.label()
    ));
    card.push_str(&format!(
        "<span class=\"points\">{}/{} pts</span>\n",
        r.earned_score, r.max_score
    ));
    if q.has_result {
        let (class, text) = if r.is_correct {
            ("pass", "Correct")
        } else {
            ("fail", "Incorrect")
        };
        card.push_str(&format!("<span class=\"tag {class}\">{text}</span>\n"));
    }
    card.push_str("</div>\n");

    if let Some(content) = &q.content {
        card.push_str(&format!("<p class=\"content\">{}</p>\n", html_escape(content)));
    }

    card.push_str("<dl>\n");
    card.push_str(&format!(
        "<dt>Your answer</dt><dd><pre><code>{}</code></pre></dd>\n",
        html_escape(&q.answer)
    ));
    if let Some(answer) = &q.correct_answer {
        card.push_str(&format!(
            "<dt>Correct answer</dt><dd>{}</dd>\n",
            html_escape(answer)
        ));
    }
    if let Some(feedback) = q.feedback.as_deref().filter(|f| !f.is_empty()) {
        card.push_str(&format!(
            "<dt>Feedback</dt><dd class=\"feedback {}\">{}</dd>\n",
            r.verdict.kind(),
            html_escape(feedback)
        ));
    }
    if let Some(explanation) = q.explanation.as_deref().filter(|e| !e.is_empty()) {
        card.push_str(&format!(
            "<dt>Explanation</dt><dd>{}</dd>\n",
            html_escape(explanation)
        ));
    }
    card.push_str("</dl>\n");
    card.push_str("</article>\n");
    card
}

/// Write the result page to a file.
pub fn write_html_report(report: &ScoreReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --success: #22c55e; --warning: #eab308; --danger: #ef4444; --pass: #dcfce7; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0 auto; max-width: 960px; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.card { border: 1px solid var(--border); border-radius: 8px; padding: 1rem 1.5rem; margin: 1rem 0; }
.score { font-size: 1.5rem; }
.score .earned { font-size: 2.5rem; font-weight: bold; }
.progress { height: 12px; background: var(--border); border-radius: 6px; overflow: hidden; margin: 0.75rem 0; }
.progress .bar { height: 100%; }
.bar.success { background: var(--success); }
.bar.warning { background: var(--warning); }
.bar.danger { background: var(--danger); }
.label { font-weight: bold; margin-left: 0.5rem; }
.label.success { color: var(--success); }
.label.warning { color: var(--warning); }
.label.danger { color: var(--danger); }
.question-header { display: flex; gap: 1rem; align-items: center; }
.question-header .points { margin-left: auto; }
.type { color: #6b7280; }
.tag { padding: 0.1rem 0.5rem; border-radius: 4px; font-size: 0.85rem; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
dt { font-weight: bold; margin-top: 0.5rem; }
dd { margin-left: 0; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
"#;
