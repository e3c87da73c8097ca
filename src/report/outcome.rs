//! Normalized test outcomes and the run-scoped accumulator.

use serde::{Deserialize, Serialize};

use super::attachments::ScreenshotRef;
use crate::host::{HostError, Location, TestCase, TestResult, TestStatus, TestStep};

/// Category given to steps the host did not categorize.
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// One step of a flattened step tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEntry {
    pub title: String,
    pub category: String,
    pub duration_ms: u64,

    /// Nesting depth; top-level steps are 0.
    pub level: usize,

    /// Error message, if the step failed.
    pub error: Option<String>,
}

impl StepEntry {
    fn from_step(step: &TestStep, level: usize) -> Self {
        Self {
            title: step.title.clone(),
            category: step
                .category
                .clone()
                .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string()),
            duration_ms: step.duration.map_or(0, clamp_duration),
            level,
            error: step
                .error
                .as_ref()
                .and_then(|e| e.message.clone())
                .filter(|message| !message.is_empty()),
        }
    }
}

/// Negative host durations mean "not measured" and count as zero.
fn clamp_duration(ms: i64) -> u64 {
    u64::try_from(ms).unwrap_or(0)
}

/// Flatten a step tree depth-first, pre-order, starting at `level`.
///
/// Every entry is followed by its children at `level + 1`.
pub fn flatten_steps(steps: &[TestStep], level: usize) -> Vec<StepEntry> {
    let mut flat = Vec::new();
    for step in steps {
        flat.push(StepEntry::from_step(step, level));
        flat.extend(flatten_steps(&step.steps, level + 1));
    }
    flat
}

/// Error details of a failed test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestError {
    pub message: Option<String>,
    pub stack: Option<String>,
    pub location: Option<Location>,
}

impl From<&HostError> for TestError {
    fn from(error: &HostError) -> Self {
        Self {
            message: error.message.clone(),
            stack: error.stack.clone(),
            location: error.location.clone(),
        }
    }
}

/// The recorded result of one test execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub test_id: String,
    pub title: String,
    pub location: Option<Location>,
    pub status: TestStatus,
    pub duration_ms: u64,
    pub error: Option<TestError>,
    pub steps: Vec<StepEntry>,
    pub screenshots: Vec<ScreenshotRef>,
}

impl TestOutcome {
    /// Normalize the host's test and result into an outcome.
    ///
    /// `screenshots` are the already exported attachments of `result`.
    pub fn from_host(test: &TestCase, result: &TestResult, screenshots: Vec<ScreenshotRef>) -> Self {
        Self {
            test_id: test.id.clone(),
            title: test.title.clone(),
            location: test.location.clone(),
            status: result.status.clone(),
            duration_ms: clamp_duration(result.duration),
            error: result.error.as_ref().map(TestError::from),
            steps: flatten_steps(&result.steps, 0),
            screenshots,
        }
    }

    /// Base name of the file the test is defined in.
    pub fn file_name(&self) -> Option<&str> {
        self.location.as_ref().map(Location::file_name)
    }

    /// Identity used to detect repeated reports of the same test.
    fn key(&self) -> String {
        if !self.test_id.is_empty() {
            return self.test_id.clone();
        }
        let file = self.location.as_ref().map_or("", |l| l.file.as_str());
        format!("{}::{}", file, self.title)
    }
}

/// How repeated outcomes for the same test (e.g. retries) are kept.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Keep every reported outcome, in arrival order.
    #[default]
    AppendAll,

    /// Keep only the latest outcome per test, at the position where the
    /// test was first reported. Screenshots of replaced attempts are
    /// removed from the report directory.
    KeepLatest,
}

/// Append-only sequence of outcomes for one run.
#[derive(Debug, Clone, Default)]
pub struct OutcomeAccumulator {
    outcomes: Vec<TestOutcome>,
    policy: DuplicatePolicy,
}

impl OutcomeAccumulator {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            outcomes: Vec::new(),
            policy,
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Drop everything recorded so far.
    pub fn reset(&mut self) {
        self.outcomes.clear();
    }

    /// Record one completed test.
    ///
    /// Returns the earlier outcome this one replaced, if any.
    pub fn record(&mut self, outcome: TestOutcome) -> Option<TestOutcome> {
        if self.policy == DuplicatePolicy::KeepLatest {
            let key = outcome.key();
            if let Some(existing) = self.outcomes.iter_mut().find(|o| o.key() == key) {
                tracing::debug!("Replacing earlier outcome for {}", key);
                return Some(std::mem::replace(existing, outcome));
            }
        }
        self.outcomes.push(outcome);
        None
    }

    /// All outcomes in arrival order.
    pub fn snapshot(&self) -> &[TestOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login_steps() -> Vec<TestStep> {
        vec![
            TestStep::new("Navigate to login page", "test.step", 500),
            TestStep::new("Fill username and password", "test.step", 300)
                .with_step(TestStep::new("Type username", "test.step", 150))
                .with_step(TestStep::new("Type password", "test.step", 150)),
            TestStep::new("Click login button", "test.step", 700),
        ]
    }

    fn outcome(id: &str, title: &str, status: &str) -> TestOutcome {
        let test = TestCase::new(id, title).with_location("/tests/a.spec.ts", 1, 1);
        TestOutcome::from_host(&test, &TestResult::new(status, 10), Vec::new())
    }

    #[test]
    fn test_flatten_is_pre_order_with_levels() {
        let flat = flatten_steps(&login_steps(), 0);

        let shape: Vec<(&str, usize, u64)> = flat
            .iter()
            .map(|s| (s.title.as_str(), s.level, s.duration_ms))
            .collect();
        assert_eq!(
            shape,
            vec![
                ("Navigate to login page", 0, 500),
                ("Fill username and password", 0, 300),
                ("Type username", 1, 150),
                ("Type password", 1, 150),
                ("Click login button", 0, 700),
            ]
        );
    }

    #[test]
    fn test_flatten_is_idempotent() {
        let steps = login_steps();
        assert_eq!(flatten_steps(&steps, 0), flatten_steps(&steps, 0));
    }

    #[test]
    fn test_flatten_deep_nesting_and_start_level() {
        let tree = vec![TestStep::new("a", "hook", 1).with_step(
            TestStep::new("b", "fixture", 2).with_step(TestStep::new("c", "test.step", 3)),
        )];

        let levels: Vec<usize> = flatten_steps(&tree, 2).iter().map(|s| s.level).collect();
        assert_eq!(levels, vec![2, 3, 4]);
    }

    #[test]
    fn test_step_defaults() {
        let step = TestStep {
            title: "bare".to_string(),
            category: None,
            duration: None,
            error: Some(HostError::default()),
            steps: Vec::new(),
        };

        let flat = flatten_steps(&[step], 0);
        assert_eq!(flat[0].category, UNKNOWN_CATEGORY);
        assert_eq!(flat[0].duration_ms, 0);
        // An error without a message does not mark the step failed.
        assert_eq!(flat[0].error, None);
    }

    #[test]
    fn test_unfinished_durations_count_as_zero() {
        let test = TestCase::new("t1", "running");
        let result = TestResult::new("passed", -1).with_step(TestStep::new("pending", "test.step", -1));

        let outcome = TestOutcome::from_host(&test, &result, Vec::new());
        assert_eq!(outcome.duration_ms, 0);
        assert_eq!(outcome.steps[0].duration_ms, 0);
    }

    #[test]
    fn test_step_error_message() {
        let step = TestStep::new("Click submit button", "test.step", 500)
            .with_error(HostError::new("Element not found: #submit"));

        let flat = flatten_steps(&[step], 0);
        assert_eq!(flat[0].error.as_deref(), Some("Element not found: #submit"));
    }

    #[test]
    fn test_from_host_copies_error_verbatim() {
        let test = TestCase::new("t1", "should fail").with_location("/tests/failed.spec.ts", 15, 3);
        let result = TestResult::new("failed", 800).with_error(
            HostError::new("Expected true to be false")
                .with_stack("Error: Expected true to be false\n    at x")
                .with_location("/tests/failed.spec.ts", 16, 20),
        );

        let outcome = TestOutcome::from_host(&test, &result, Vec::new());

        let error = outcome.error.clone().unwrap();
        assert_eq!(error.message.as_deref(), Some("Expected true to be false"));
        assert_eq!(
            error.stack.as_deref(),
            Some("Error: Expected true to be false\n    at x")
        );
        assert_eq!(error.location, Some(Location::new("/tests/failed.spec.ts", 16, 20)));
        assert_eq!(outcome.status, TestStatus::Failed);
        assert_eq!(outcome.file_name(), Some("failed.spec.ts"));
    }

    #[test]
    fn test_append_all_keeps_retries() {
        let mut accumulator = OutcomeAccumulator::new(DuplicatePolicy::AppendAll);
        accumulator.record(outcome("t1", "flaky", "failed"));
        accumulator.record(outcome("t2", "steady", "passed"));
        accumulator.record(outcome("t1", "flaky", "passed"));

        let statuses: Vec<&str> = accumulator
            .snapshot()
            .iter()
            .map(|o| o.status.as_str())
            .collect();
        assert_eq!(statuses, vec!["failed", "passed", "passed"]);
        assert_eq!(accumulator.len(), 3);
    }

    #[test]
    fn test_keep_latest_replaces_in_place() {
        let mut accumulator = OutcomeAccumulator::new(DuplicatePolicy::KeepLatest);
        accumulator.record(outcome("t1", "flaky", "failed"));
        accumulator.record(outcome("t2", "steady", "passed"));
        let replaced = accumulator.record(outcome("t1", "flaky", "passed"));
        assert_eq!(replaced.map(|o| o.status), Some(TestStatus::Failed));

        let seen: Vec<(&str, &str)> = accumulator
            .snapshot()
            .iter()
            .map(|o| (o.test_id.as_str(), o.status.as_str()))
            .collect();
        assert_eq!(seen, vec![("t1", "passed"), ("t2", "passed")]);
    }

    #[test]
    fn test_keep_latest_without_ids_uses_file_and_title() {
        let mut accumulator = OutcomeAccumulator::new(DuplicatePolicy::KeepLatest);
        accumulator.record(outcome("", "same", "failed"));
        accumulator.record(outcome("", "other", "passed"));
        accumulator.record(outcome("", "same", "passed"));

        assert_eq!(accumulator.len(), 2);
        assert_eq!(accumulator.snapshot()[0].status, TestStatus::Passed);
    }

    #[test]
    fn test_reset_clears_outcomes() {
        let mut accumulator = OutcomeAccumulator::default();
        accumulator.record(outcome("t1", "one", "passed"));
        assert!(!accumulator.is_empty());

        accumulator.reset();
        assert!(accumulator.is_empty());
        assert_eq!(accumulator.policy(), DuplicatePolicy::AppendAll);
    }
}
