//! Test reporting and output generation.
//!
//! A [`Reporter`] receives the host's lifecycle events in order. The
//! [`MarkdownReporter`] accumulates every completed test, exports image
//! attachments as it goes, and writes one Markdown document when the run
//! ends:
//!
//! ```text
//! <output_dir>/
//!   index.md
//!   screenshots/
//!     <id>.png | <id>.jpg | <id><original extension>
//! ```
//!
//! # Example
//!
//! ```no_run
//! use mdreport::config::ReportConfig;
//! use mdreport::host::{FullResult, Suite, TestCase, TestResult};
//! use mdreport::report::{MarkdownReporter, Reporter};
//!
//! let mut reporter = MarkdownReporter::new(ReportConfig::default());
//! let test = TestCase::new("t1", "logs in").with_location("tests/login.spec.ts", 3, 1);
//!
//! reporter.on_run_begin(&Suite::new(vec![test.clone()]))?;
//! reporter.on_test_end(&test, &TestResult::new("passed", 120));
//! reporter.on_run_end(&FullResult::new("passed"))?;
//! # Ok::<(), mdreport::report::ReportError>(())
//! ```

pub mod attachments;
pub mod markdown;
pub mod outcome;
pub mod summary;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};

use crate::config::ReportConfig;
use crate::host::{FullResult, RunStatus, Suite, TestCase, TestResult};

pub use attachments::{AttachmentExporter, IdGenerator, SCREENSHOTS_DIR, ScreenshotRef};
pub use outcome::{DuplicatePolicy, OutcomeAccumulator, StepEntry, TestError, TestOutcome};
pub use summary::{RunMetadata, RunSummary, format_duration};

/// Result type for reporter operations.
pub type ReportResult<T> = Result<T, ReportError>;

/// Errors that stop a report from being produced.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Failed to prepare output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write report {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Run ended before it began")]
    NotStarted,
}

/// A test reporter receives events during a test run.
///
/// Events arrive one at a time: `on_run_begin`, then any number of
/// `on_test_begin`/`on_test_end` pairs, then `on_run_end`.
pub trait Reporter {
    /// Called once before any test runs.
    fn on_run_begin(&mut self, suite: &Suite) -> ReportResult<()>;

    /// Called when a test starts running.
    fn on_test_begin(&mut self, test: &TestCase, result: &TestResult);

    /// Called when a test completes.
    fn on_test_end(&mut self, test: &TestCase, result: &TestResult);

    /// Called when all tests have completed.
    fn on_run_end(&mut self, result: &FullResult) -> ReportResult<()>;
}

/// Source of the current time.
pub type Clock = Box<dyn FnMut() -> DateTime<FixedOffset>>;

/// The default clock: local wall-clock time.
pub fn system_clock() -> Clock {
    Box::new(|| chrono::Local::now().fixed_offset())
}

/// Reporter that writes a Markdown document for the run.
///
/// One instance covers one run; `on_run_begin` wipes whatever a previous
/// run left in the output directory.
pub struct MarkdownReporter {
    output_dir: PathBuf,
    filename: String,
    exporter: AttachmentExporter,
    accumulator: OutcomeAccumulator,
    clock: Clock,
    metadata: Option<RunMetadata>,
}

impl MarkdownReporter {
    /// Creates a reporter using random UUIDs for screenshot names and the
    /// system clock.
    pub fn new(config: ReportConfig) -> Self {
        let screenshots_dir = config.output_dir.join(SCREENSHOTS_DIR);
        Self {
            output_dir: config.output_dir,
            filename: config.filename,
            exporter: AttachmentExporter::new(screenshots_dir, attachments::uuid_generator()),
            accumulator: OutcomeAccumulator::new(config.duplicates),
            clock: system_clock(),
            metadata: None,
        }
    }

    /// Replaces the screenshot naming strategy.
    ///
    /// The generator is called once per exported screenshot, across the
    /// whole run.
    pub fn with_id_generator(mut self, generate_id: impl FnMut() -> String + 'static) -> Self {
        self.exporter = AttachmentExporter::new(self.screenshots_dir(), Box::new(generate_id));
        self
    }

    /// Replaces the clock used for run timing and the generation timestamp.
    pub fn with_clock(
        mut self,
        clock: impl FnMut() -> DateTime<FixedOffset> + 'static,
    ) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn screenshots_dir(&self) -> PathBuf {
        self.output_dir.join(SCREENSHOTS_DIR)
    }

    /// Where the Markdown document is written.
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(&self.filename)
    }

    /// Outcomes recorded so far, in arrival order.
    pub fn outcomes(&self) -> &[TestOutcome] {
        self.accumulator.snapshot()
    }

    /// Metadata of the current run, once it has begun.
    pub fn metadata(&self) -> Option<&RunMetadata> {
        self.metadata.as_ref()
    }

    /// Aggregate counts of the current run, once it has begun.
    pub fn summary(&self) -> Option<RunSummary> {
        self.metadata
            .as_ref()
            .map(|meta| RunSummary::from_outcomes(meta, self.accumulator.snapshot()))
    }

    fn recreate_output_dir(&self) -> ReportResult<()> {
        if self.output_dir.exists() {
            tracing::debug!(
                "Removing previous report directory: {}",
                self.output_dir.display()
            );
            fs::remove_dir_all(&self.output_dir).map_err(|source| ReportError::CreateDir {
                path: self.output_dir.clone(),
                source,
            })?;
        }

        create_dir(&self.output_dir)?;
        create_dir(&self.screenshots_dir())
    }

    /// Delete the exported files of an outcome that is no longer reported.
    fn remove_screenshots(&self, outcome: &TestOutcome) {
        for screenshot in &outcome.screenshots {
            let path = self.output_dir.join(&screenshot.path);
            if let Err(e) = fs::remove_file(&path) {
                tracing::warn!("Failed to remove replaced screenshot {}: {}", path.display(), e);
            }
        }
    }
}

fn create_dir(path: &Path) -> ReportResult<()> {
    fs::create_dir_all(path).map_err(|source| ReportError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

impl Reporter for MarkdownReporter {
    fn on_run_begin(&mut self, suite: &Suite) -> ReportResult<()> {
        let started_at = (self.clock)();

        self.accumulator.reset();
        self.recreate_output_dir()?;

        let declared_tests = suite.all_tests().len();
        tracing::info!(
            "Markdown Reporter: Starting test run with {} tests",
            declared_tests
        );
        self.metadata = Some(RunMetadata::begin(started_at, declared_tests));
        Ok(())
    }

    fn on_test_begin(&mut self, _test: &TestCase, _result: &TestResult) {}

    fn on_test_end(&mut self, test: &TestCase, result: &TestResult) {
        let screenshots = self.exporter.export(&result.attachments);
        let outcome = TestOutcome::from_host(test, result, screenshots);

        tracing::debug!(
            "Recorded {} ({}, {} steps, {} screenshots)",
            outcome.title,
            outcome.status,
            outcome.steps.len(),
            outcome.screenshots.len()
        );
        if let Some(replaced) = self.accumulator.record(outcome) {
            self.remove_screenshots(&replaced);
        }
    }

    fn on_run_end(&mut self, result: &FullResult) -> ReportResult<()> {
        let finished_at = (self.clock)();
        let generated_at = (self.clock)();

        let meta = self.metadata.as_mut().ok_or(ReportError::NotStarted)?;
        meta.finish(finished_at, result.status.clone());

        let markdown = markdown::render(meta, self.accumulator.snapshot(), &generated_at);
        let path = self.report_path();
        fs::write(&path, markdown).map_err(|source| ReportError::Write {
            path: path.clone(),
            source,
        })?;

        tracing::info!("Markdown report generated: {}", path.display());
        Ok(())
    }
}

/// Prints a summary of the run to the console.
pub fn print_summary(summary: &RunSummary, status: &RunStatus, report_path: &Path) {
    println!();
    println!("Test Results:");
    println!("  Total:   {}", summary.total);
    println!("  Passed:  {}", console::style(summary.passed).green());
    println!("  Failed:  {}", console::style(summary.failed).red());
    println!("  Skipped: {}", console::style(summary.skipped).yellow());

    if summary.timed_out > 0 {
        println!("  Timed out:   {}", console::style(summary.timed_out).red());
    }

    if summary.interrupted > 0 {
        println!("  Interrupted: {}", console::style(summary.interrupted).yellow());
    }

    println!("  Duration: {}", format_duration(summary.duration_ms));
    println!();

    let status_line = format!("Run {}", status.as_str().to_uppercase());
    if *status == RunStatus::Passed {
        println!("{}", console::style(status_line).green().bold());
    } else {
        println!("{}", console::style(status_line).red().bold());
    }
    println!("Report: {}", report_path.display());
}
