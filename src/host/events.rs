//! Recorded host event streams.
//!
//! A run can be captured as newline-delimited JSON, one [`HostEvent`] per
//! line, and replayed through any [`Reporter`] later:
//!
//! ```text
//! {"event":"runBegin","suite":{"tests":[{"id":"t1","title":"logs in"}]}}
//! {"event":"testEnd","test":{"id":"t1","title":"logs in"},"result":{"status":"passed","duration":12}}
//! {"event":"runEnd","result":{"status":"passed"}}
//! ```

use std::io::BufRead;

use serde::{Deserialize, Serialize};

use super::{FullResult, Suite, TestCase, TestResult};
use crate::report::{ReportResult, Reporter};

/// Errors that can occur while reading an event stream.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Invalid event on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One lifecycle event emitted by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum HostEvent {
    RunBegin {
        suite: Suite,
    },
    TestBegin {
        test: TestCase,
        #[serde(default)]
        result: TestResult,
    },
    TestEnd {
        test: TestCase,
        result: TestResult,
    },
    RunEnd {
        result: FullResult,
    },
}

/// Parse a newline-delimited JSON event stream. Blank lines are skipped.
pub fn read_events<R: BufRead>(reader: R) -> Result<Vec<HostEvent>, EventError> {
    let mut events = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let event = serde_json::from_str(&line).map_err(|source| EventError::Parse {
            line: idx + 1,
            source,
        })?;
        events.push(event);
    }

    Ok(events)
}

/// Deliver events to a reporter in order.
///
/// Stops at the first error a handler reports.
pub fn replay<R, I>(events: I, reporter: &mut R) -> ReportResult<()>
where
    R: Reporter + ?Sized,
    I: IntoIterator<Item = HostEvent>,
{
    for event in events {
        match event {
            HostEvent::RunBegin { suite } => reporter.on_run_begin(&suite)?,
            HostEvent::TestBegin { test, result } => reporter.on_test_begin(&test, &result),
            HostEvent::TestEnd { test, result } => reporter.on_test_end(&test, &result),
            HostEvent::RunEnd { result } => reporter.on_run_end(&result)?,
        }
    }

    Ok(())
}
