//! expscore-report: Rendering evaluated experiments.
//!
//! Produces the student-facing result page as a standalone HTML file.

pub mod html;

pub use html::{generate_html, write_html_report};
