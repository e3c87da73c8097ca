//! mdreport: Markdown reports for test runs.
//!
//! This crate listens to the lifecycle events of a test-execution host and
//! writes one human-readable, diffable Markdown document per run, with the
//! run's screenshots exported next to it.
//!
//! # Architecture
//!
//! The main components are:
//!
//! - **Host**: The data the host delivers and recorded event streams
//! - **Report**: Screenshot export, outcome accumulation, Markdown rendering
//! - **Config**: TOML settings for the report location and duplicate handling
//!
//! # Example
//!
//! ```no_run
//! use mdreport::config::load_config;
//! use mdreport::host::events::{read_events, replay};
//! use mdreport::report::MarkdownReporter;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = load_config(std::path::Path::new("mdreport.toml"))?;
//!     let events = read_events(std::io::stdin().lock())?;
//!
//!     let mut reporter = MarkdownReporter::new(config.report);
//!     replay(events, &mut reporter)?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod host;
pub mod report;

// Re-export commonly used types
pub use config::{Config, load_config};
pub use host::{FullResult, Suite, TestCase, TestResult};
pub use report::{MarkdownReporter, Reporter};
