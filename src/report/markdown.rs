//! Markdown report rendering.
//!
//! Turns a finished run into a single Markdown document:
//!
//! ```text
//! # Test Report
//!
//! **Generated:** 2025/1/1 12:00:00
//!
//! ## Summary
//!
//! | Metric | Value |
//! |--------|-------|
//! | **Total Tests** | 1 |
//! ...
//!
//! ## login.spec.ts
//!
//! ### ✅ should login successfully
//!
//! **Status:** PASSED | **Duration:** 1.50s
//!
//! - 🔹 Navigate to login page (500ms)
//!   - 🔹 Type username (150ms)
//!
//! **Screenshots:**
//! - 📸 screenshot: ![screenshot](screenshots/3f1c....png)
//! ```
//!
//! Tests are grouped by the base name of their source file. Groups are
//! sorted by name; tests inside a group keep the order they completed in.
//! Rendering is a pure function of its inputs, so identical runs produce
//! identical bytes.

use std::collections::BTreeMap;
use std::fmt::{self, Write};

use chrono::{DateTime, FixedOffset};

use super::outcome::{StepEntry, TestError, TestOutcome};
use super::summary::{RunMetadata, RunSummary, format_duration};
use crate::host::TestStatus;

/// Group label for tests without a source location.
pub const UNKNOWN_FILE: &str = "Unknown File";

const GENERATED_FORMAT: &str = "%Y/%-m/%-d %-H:%M:%S";

/// Render the report for a finished run.
pub fn render(
    meta: &RunMetadata,
    outcomes: &[TestOutcome],
    generated_at: &DateTime<FixedOffset>,
) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_document(&mut out, meta, outcomes, generated_at);
    out
}

fn write_document(
    out: &mut String,
    meta: &RunMetadata,
    outcomes: &[TestOutcome],
    generated_at: &DateTime<FixedOffset>,
) -> fmt::Result {
    writeln!(out, "# Test Report\n")?;
    writeln!(out, "**Generated:** {}\n", generated_at.format(GENERATED_FORMAT))?;

    write_summary(out, meta, &RunSummary::from_outcomes(meta, outcomes))?;

    for (file_name, tests) in group_by_file(outcomes) {
        writeln!(out, "## {}\n", file_name)?;
        for outcome in tests {
            write_test(out, outcome)?;
        }
    }

    Ok(())
}

fn write_summary(out: &mut String, meta: &RunMetadata, summary: &RunSummary) -> fmt::Result {
    let status = meta
        .status
        .as_ref()
        .map_or_else(|| "UNKNOWN".to_string(), |s| s.as_str().to_uppercase());

    writeln!(out, "## Summary\n")?;
    writeln!(out, "| Metric | Value |")?;
    writeln!(out, "|--------|-------|")?;
    writeln!(out, "| **Total Tests** | {} |", summary.total)?;
    writeln!(out, "| **Passed** | {} |", summary.passed)?;
    writeln!(out, "| **Failed** | {} |", summary.failed)?;
    writeln!(out, "| **Skipped** | {} |", summary.skipped)?;
    writeln!(
        out,
        "| **Duration** | {} |",
        format_duration(summary.duration_ms)
    )?;
    writeln!(out, "| **Status** | {} |\n", status)
}

fn group_by_file(outcomes: &[TestOutcome]) -> BTreeMap<&str, Vec<&TestOutcome>> {
    let mut groups: BTreeMap<&str, Vec<&TestOutcome>> = BTreeMap::new();
    for outcome in outcomes {
        let file_name = outcome.file_name().unwrap_or(UNKNOWN_FILE);
        groups.entry(file_name).or_default().push(outcome);
    }
    groups
}

fn write_test(out: &mut String, outcome: &TestOutcome) -> fmt::Result {
    writeln!(out, "### {} {}\n", status_icon(&outcome.status), outcome.title)?;
    writeln!(
        out,
        "**Status:** {} | **Duration:** {}\n",
        outcome.status.as_str().to_uppercase(),
        format_duration(outcome.duration_ms)
    )?;

    if let Some(error) = &outcome.error {
        write_error(out, error)?;
    }

    if !outcome.steps.is_empty() {
        for step in &outcome.steps {
            write_step(out, step)?;
        }
        writeln!(out)?;
    }

    if !outcome.screenshots.is_empty() {
        writeln!(out, "**Screenshots:**")?;
        for screenshot in &outcome.screenshots {
            writeln!(
                out,
                "- 📸 {name}: ![{name}]({path})",
                name = screenshot.name,
                path = screenshot.path
            )?;
        }
        writeln!(out)?;
    }

    Ok(())
}

fn write_error(out: &mut String, error: &TestError) -> fmt::Result {
    writeln!(out, "**Error:**\n```")?;

    if let Some(message) = non_empty(&error.message) {
        writeln!(out, "{}", message)?;
    }
    if let Some(location) = &error.location {
        writeln!(out, "\nLocation: {}", location)?;
    }
    if let Some(stack) = non_empty(&error.stack) {
        writeln!(out, "\nStack Trace:\n{}", stack)?;
    }

    writeln!(out, "```\n")
}

fn write_step(out: &mut String, step: &StepEntry) -> fmt::Result {
    let indent = "  ".repeat(step.level);
    write!(out, "{}- {} {}", indent, step_icon(&step.category), step.title)?;
    if step.duration_ms > 0 {
        write!(out, " ({})", format_duration(step.duration_ms))?;
    }
    writeln!(out)?;

    if step.error.is_some() {
        writeln!(out, "{}  - ❌ Step failed", indent)?;
    }
    Ok(())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Glyph shown in front of a test title.
pub fn status_icon(status: &TestStatus) -> &'static str {
    match status {
        TestStatus::Passed => "✅",
        TestStatus::Failed => "❌",
        TestStatus::Skipped => "\u{23ed}\u{fe0f}",
        TestStatus::TimedOut => "⏰",
        TestStatus::Interrupted => "\u{23f8}\u{fe0f}",
        TestStatus::Other(_) => "❓",
    }
}

/// Glyph shown in front of a step title.
pub fn step_icon(category: &str) -> &'static str {
    match category {
        "test.step" => "🔹",
        "fixture" => "\u{2699}\u{fe0f}",
        "hook" => "🪝",
        "test" => "🧪",
        _ => "📝",
    }
}
