//! Run-level metadata and aggregate counts.

use chrono::{DateTime, FixedOffset};

use super::outcome::TestOutcome;
use crate::host::{RunStatus, TestStatus};

/// Timestamps and status of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunMetadata {
    pub started_at: DateTime<FixedOffset>,

    /// Number of tests the host announced at run begin.
    pub declared_tests: usize,

    pub finished_at: Option<DateTime<FixedOffset>>,
    pub status: Option<RunStatus>,
}

impl RunMetadata {
    pub fn begin(started_at: DateTime<FixedOffset>, declared_tests: usize) -> Self {
        Self {
            started_at,
            declared_tests,
            finished_at: None,
            status: None,
        }
    }

    pub fn finish(&mut self, finished_at: DateTime<FixedOffset>, status: RunStatus) {
        self.finished_at = Some(finished_at);
        self.status = Some(status);
    }

    /// Wall-clock time between run begin and run end, in milliseconds.
    ///
    /// Zero while the run is still in progress or if the clock went backwards.
    pub fn duration_ms(&self) -> u64 {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds().max(0) as u64)
            .unwrap_or(0)
    }
}

/// Aggregate counts over a run's outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub timed_out: usize,
    pub interrupted: usize,

    /// Outcomes with a status this crate does not know.
    pub other: usize,

    pub duration_ms: u64,
}

impl RunSummary {
    pub fn from_outcomes(meta: &RunMetadata, outcomes: &[TestOutcome]) -> Self {
        let mut summary = Self {
            total: outcomes.len(),
            duration_ms: meta.duration_ms(),
            ..Self::default()
        };

        for outcome in outcomes {
            match outcome.status {
                TestStatus::Passed => summary.passed += 1,
                TestStatus::Failed => summary.failed += 1,
                TestStatus::Skipped => summary.skipped += 1,
                TestStatus::TimedOut => summary.timed_out += 1,
                TestStatus::Interrupted => summary.interrupted += 1,
                TestStatus::Other(_) => summary.other += 1,
            }
        }

        summary
    }
}

/// Format milliseconds for display: `999ms`, `1.00s`, `75.25s`.
///
/// Seconds are rounded the way JavaScript's `toFixed(2)` rounds the same
/// `f64`, so reports stay byte-compatible with existing consumers.
pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        return format!("{}ms", ms);
    }

    // `ms / 1000` is an exact binary fraction halfway between two
    // hundredths; `{:.2}` would round it to even, toFixed rounds it up.
    if ms % 250 == 125 {
        let hundredths = ms / 10 + 1;
        return format!("{}.{:02}s", hundredths / 100, hundredths % 100);
    }

    format!("{:.2}s", ms as f64 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{TestCase, TestResult};

    fn at(time: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(time).unwrap()
    }

    #[test]
    fn test_format_duration_boundaries() {
        assert_eq!(format_duration(0), "0ms");
        assert_eq!(format_duration(999), "999ms");
        assert_eq!(format_duration(1000), "1.00s");
        assert_eq!(format_duration(1500), "1.50s");
        assert_eq!(format_duration(125_000), "125.00s");
    }

    #[test]
    fn test_format_duration_rounds_halves_up() {
        assert_eq!(format_duration(1125), "1.13s");
        assert_eq!(format_duration(1375), "1.38s");
        assert_eq!(format_duration(1625), "1.63s");
        assert_eq!(format_duration(1875), "1.88s");
        assert_eq!(format_duration(99_625), "99.63s");
        // Not a tie once converted to f64: 1.005 is stored just below.
        assert_eq!(format_duration(1005), "1.00s");
        assert_eq!(format_duration(1015), "1.01s");
    }

    #[test]
    fn test_duration_uses_wall_clock() {
        let mut meta = RunMetadata::begin(at("2025-01-01T12:00:00Z"), 3);
        assert_eq!(meta.duration_ms(), 0);

        meta.finish(at("2025-01-01T12:00:02.250Z"), RunStatus::Passed);
        assert_eq!(meta.duration_ms(), 2250);
    }

    #[test]
    fn test_duration_never_negative() {
        let mut meta = RunMetadata::begin(at("2025-01-01T12:00:05Z"), 0);
        meta.finish(at("2025-01-01T12:00:00Z"), RunStatus::Passed);
        assert_eq!(meta.duration_ms(), 0);
    }

    #[test]
    fn test_counts_cover_every_outcome() {
        let meta = RunMetadata::begin(at("2025-01-01T12:00:00Z"), 6);
        let statuses = ["passed", "failed", "skipped", "timedOut", "interrupted", "mystery", "passed"];
        let outcomes: Vec<TestOutcome> = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| {
                TestOutcome::from_host(
                    &TestCase::new(format!("t{}", i), "test"),
                    &TestResult::new(*status, 5000),
                    Vec::new(),
                )
            })
            .collect();

        let summary = RunSummary::from_outcomes(&meta, &outcomes);

        assert_eq!(summary.total, 7);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.timed_out, 1);
        assert_eq!(summary.interrupted, 1);
        assert_eq!(summary.other, 1);
        assert_eq!(
            summary.total,
            summary.passed
                + summary.failed
                + summary.skipped
                + summary.timed_out
                + summary.interrupted
                + summary.other
        );
        // Not the sum of test durations.
        assert_eq!(summary.duration_ms, 0);
    }
}
