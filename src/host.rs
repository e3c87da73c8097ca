//! Data delivered by the test-execution host.
//!
//! These types mirror the host's reporter API: a suite enumerating every
//! declared test, one [`TestCase`] plus [`TestResult`] per completed test,
//! and a [`FullResult`] when the run ends. They deserialize from the host's
//! camelCase JSON so a recorded run can be replayed through a reporter
//! (see [`events`]).

pub mod events;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A source location reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Path of the source file, as reported by the host.
    pub file: String,

    /// 1-based line number.
    #[serde(default)]
    pub line: u32,

    /// 1-based column number.
    #[serde(default)]
    pub column: u32,
}

impl Location {
    /// Create a new location.
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// The final path segment of the source file.
    pub fn file_name(&self) -> &str {
        Path::new(&self.file)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.file)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// A group of declared tests, possibly nested.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Suite {
    /// Suite title.
    #[serde(default)]
    pub title: String,

    /// Tests declared directly in this suite.
    #[serde(default)]
    pub tests: Vec<TestCase>,

    /// Child suites.
    #[serde(default)]
    pub suites: Vec<Suite>,
}

impl Suite {
    /// Create a flat suite from a list of tests.
    pub fn new(tests: Vec<TestCase>) -> Self {
        Self {
            title: String::new(),
            tests,
            suites: Vec::new(),
        }
    }

    /// Every test declared in this suite and its descendants.
    pub fn all_tests(&self) -> Vec<&TestCase> {
        let mut tests: Vec<&TestCase> = self.tests.iter().collect();
        for suite in &self.suites {
            tests.extend(suite.all_tests());
        }
        tests
    }
}

/// A declared test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    /// Host-assigned identifier, stable across retries of the same test.
    #[serde(default)]
    pub id: String,

    /// Test title.
    pub title: String,

    /// Where the test is defined.
    pub location: Option<Location>,
}

impl TestCase {
    /// Create a new test case with no location.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            location: None,
        }
    }

    /// Set the source location.
    pub fn with_location(mut self, file: impl Into<String>, line: u32, column: u32) -> Self {
        self.location = Some(Location::new(file, line, column));
        self
    }
}

/// Final status of a single test.
///
/// Statuses the host may add later are kept verbatim in [`TestStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TestStatus {
    /// Hosts report `passed` until a test finishes otherwise.
    #[default]
    Passed,
    Failed,
    Skipped,
    TimedOut,
    Interrupted,
    Other(String),
}

impl TestStatus {
    /// The host's spelling of this status.
    pub fn as_str(&self) -> &str {
        match self {
            TestStatus::Passed => "passed",
            TestStatus::Failed => "failed",
            TestStatus::Skipped => "skipped",
            TestStatus::TimedOut => "timedOut",
            TestStatus::Interrupted => "interrupted",
            TestStatus::Other(status) => status,
        }
    }
}

impl From<&str> for TestStatus {
    fn from(status: &str) -> Self {
        match status {
            "passed" => TestStatus::Passed,
            "failed" => TestStatus::Failed,
            "skipped" => TestStatus::Skipped,
            "timedOut" => TestStatus::TimedOut,
            "interrupted" => TestStatus::Interrupted,
            other => TestStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for TestStatus {
    fn from(status: String) -> Self {
        TestStatus::from(status.as_str())
    }
}

impl From<TestStatus> for String {
    fn from(status: TestStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall status of a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunStatus {
    Passed,
    Failed,
    TimedOut,
    Interrupted,
    Other(String),
}

impl RunStatus {
    /// The host's spelling of this status.
    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Passed => "passed",
            RunStatus::Failed => "failed",
            RunStatus::TimedOut => "timedout",
            RunStatus::Interrupted => "interrupted",
            RunStatus::Other(status) => status,
        }
    }
}

impl From<&str> for RunStatus {
    fn from(status: &str) -> Self {
        match status {
            "passed" => RunStatus::Passed,
            "failed" => RunStatus::Failed,
            "timedout" => RunStatus::TimedOut,
            "interrupted" => RunStatus::Interrupted,
            other => RunStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for RunStatus {
    fn from(status: String) -> Self {
        RunStatus::from(status.as_str())
    }
}

impl From<RunStatus> for String {
    fn from(status: RunStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error raised by a test or one of its steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostError {
    pub message: Option<String>,
    pub stack: Option<String>,
    pub location: Option<Location>,
}

impl HostError {
    /// An error carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Set the stack text.
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Set the location the error was raised at.
    pub fn with_location(mut self, file: impl Into<String>, line: u32, column: u32) -> Self {
        self.location = Some(Location::new(file, line, column));
        self
    }
}

/// A (possibly nested) step recorded while a test ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestStep {
    pub title: String,

    /// Origin of the step, e.g. `test.step`, `fixture`, `hook`.
    pub category: Option<String>,

    /// Duration in milliseconds; hosts report `-1` for unfinished steps.
    pub duration: Option<i64>,

    pub error: Option<HostError>,

    /// Child steps, in execution order.
    #[serde(default)]
    pub steps: Vec<TestStep>,
}

impl TestStep {
    /// Create a leaf step.
    pub fn new(title: impl Into<String>, category: impl Into<String>, duration: i64) -> Self {
        Self {
            title: title.into(),
            category: Some(category.into()),
            duration: Some(duration),
            error: None,
            steps: Vec::new(),
        }
    }

    /// Add a child step.
    pub fn with_step(mut self, step: TestStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Mark the step as failed.
    pub fn with_error(mut self, error: HostError) -> Self {
        self.error = Some(error);
        self
    }
}

/// Declared content type of an attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentType {
    Png,
    Jpeg,
    Other(String),
}

impl ContentType {
    /// The MIME type string.
    pub fn as_str(&self) -> &str {
        match self {
            ContentType::Png => "image/png",
            ContentType::Jpeg => "image/jpeg",
            ContentType::Other(mime) => mime,
        }
    }

    /// Whether attachments of this type are exported as screenshots.
    pub fn is_image(&self) -> bool {
        matches!(self, ContentType::Png | ContentType::Jpeg)
    }
}

impl From<&str> for ContentType {
    fn from(mime: &str) -> Self {
        match mime {
            "image/png" => ContentType::Png,
            "image/jpeg" => ContentType::Jpeg,
            other => ContentType::Other(other.to_string()),
        }
    }
}

impl From<String> for ContentType {
    fn from(mime: String) -> Self {
        ContentType::from(mime.as_str())
    }
}

impl From<ContentType> for String {
    fn from(content_type: ContentType) -> Self {
        content_type.as_str().to_string()
    }
}

/// A binary artifact attached to a test result.
///
/// The bytes live either inline in `body` or in an external file at `path`;
/// `body` wins when both are present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub name: Option<String>,
    pub content_type: ContentType,
    pub body: Option<Vec<u8>>,
    pub path: Option<PathBuf>,
}

/// Where an attachment's bytes come from.
#[derive(Debug, Clone, Copy)]
pub enum AttachmentSource<'a> {
    Inline(&'a [u8]),
    File(&'a Path),
}

impl Attachment {
    /// An attachment carrying its bytes inline.
    pub fn inline(
        name: impl Into<String>,
        content_type: impl Into<ContentType>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            content_type: content_type.into(),
            body: Some(body.into()),
            path: None,
        }
    }

    /// An attachment referencing a file on disk.
    pub fn file(
        name: impl Into<String>,
        content_type: impl Into<ContentType>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            content_type: content_type.into(),
            body: None,
            path: Some(path.into()),
        }
    }

    /// The attachment's byte source, if it has one.
    pub fn source(&self) -> Option<AttachmentSource<'_>> {
        match (&self.body, &self.path) {
            (Some(body), _) => Some(AttachmentSource::Inline(body)),
            (None, Some(path)) => Some(AttachmentSource::File(path)),
            (None, None) => None,
        }
    }
}

/// Result of running one test.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestResult {
    #[serde(default)]
    pub status: TestStatus,

    /// Duration in milliseconds; `-1` while the test is still running.
    #[serde(default)]
    pub duration: i64,

    pub error: Option<HostError>,

    #[serde(default)]
    pub attachments: Vec<Attachment>,

    /// Top-level steps, in execution order.
    #[serde(default)]
    pub steps: Vec<TestStep>,
}

impl TestResult {
    /// Create a result with no error, attachments, or steps.
    pub fn new(status: impl Into<TestStatus>, duration: i64) -> Self {
        Self {
            status: status.into(),
            duration,
            ..Self::default()
        }
    }

    /// Set the test-level error.
    pub fn with_error(mut self, error: HostError) -> Self {
        self.error = Some(error);
        self
    }

    /// Add a top-level step.
    pub fn with_step(mut self, step: TestStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Add an attachment.
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Result of the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullResult {
    pub status: RunStatus,
}

impl FullResult {
    pub fn new(status: impl Into<RunStatus>) -> Self {
        Self {
            status: status.into(),
        }
    }
}
