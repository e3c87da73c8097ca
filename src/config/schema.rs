//! Configuration schema definitions for mdreport.
//!
//! ```text
//! Config (root)
//! └── ReportConfig   - Output location, file name, duplicate handling
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::report::DuplicatePolicy;

/// Root configuration structure.
///
/// Every section is optional; an empty file yields the defaults.
///
/// # Example
///
/// ```
/// use mdreport::config::Config;
///
/// let config: Config = toml::from_str(r#"
///     [report]
///     output_dir = "reports/e2e"
/// "#).unwrap();
///
/// assert_eq!(config.report.filename, "index.md");
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Markdown report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Markdown report settings.
///
/// # Defaults
///
/// | Field | Default |
/// |-------|---------|
/// | `output_dir` | `playwright-md-report` |
/// | `filename` | `index.md` |
/// | `duplicates` | `append-all` |
///
/// # Example
///
/// ```toml
/// [report]
/// output_dir = "test-results/markdown"
/// filename = "report.md"
/// duplicates = "keep-latest"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    /// Directory the report and its `screenshots/` folder are written to.
    ///
    /// Removed and recreated at the start of every run.
    ///
    /// Default: `"playwright-md-report"`
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// File name of the Markdown document inside `output_dir`.
    ///
    /// Default: `"index.md"`
    #[serde(default = "default_filename")]
    pub filename: String,

    /// What to do when the host reports the same test more than once,
    /// e.g. on retries.
    ///
    /// Default: `"append-all"`
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("playwright-md-report")
}

fn default_filename() -> String {
    "index.md".to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            filename: default_filename(),
            duplicates: DuplicatePolicy::default(),
        }
    }
}
