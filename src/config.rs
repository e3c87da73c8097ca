//! Configuration loading and schema definitions for mdreport.
//!
//! Configuration lives in a small TOML file; see [`schema`] for the fields
//! and their defaults.

pub mod schema;

pub use schema::*;

use std::path::Path;

use anyhow::{Context, Result};

/// Loads configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read (e.g., doesn't exist or permission denied)
/// - The file contains invalid TOML syntax
/// - The configuration doesn't match the expected schema
///
/// # Example
///
/// ```no_run
/// use mdreport::config::load_config;
/// use std::path::Path;
///
/// let config = load_config(Path::new("mdreport.toml"))?;
/// println!("Report directory: {}", config.report.output_dir.display());
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}

/// Loads configuration from a TOML string.
///
/// # Example
///
/// ```
/// use mdreport::config::load_config_str;
///
/// let config = load_config_str(r#"
///     [report]
///     filename = "e2e.md"
/// "#)?;
///
/// assert_eq!(config.report.filename, "e2e.md");
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn load_config_str(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse config")?;

    Ok(config)
}
