//! mdreport CLI - Markdown reports from recorded test runs.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{Level, debug, info};
use tracing_subscriber::FmtSubscriber;

use mdreport::config::{self, Config};
use mdreport::host::events::{HostEvent, read_events, replay};
use mdreport::report::{self, DuplicatePolicy, MarkdownReporter};

#[derive(Parser)]
#[command(name = "mdreport")]
#[command(about = "Markdown reports for test runs", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "mdreport.toml")]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded event stream (NDJSON) and write the report
    Replay {
        /// Event file, or `-` for stdin
        events: PathBuf,

        /// Override the report directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Override the report file name
        #[arg(short, long)]
        filename: Option<String>,

        /// Keep only the latest outcome of each test
        #[arg(long)]
        keep_latest: bool,
    },

    /// Validate configuration file
    Validate,

    /// Initialize a new configuration file
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Replay {
            events,
            output_dir,
            filename,
            keep_latest,
        } => replay_events(&cli.config, &events, output_dir, filename, keep_latest),
        Commands::Validate => validate_config(&cli.config),
        Commands::Init => init_config(&cli.config),
    }
}

fn replay_events(
    config_path: &Path,
    events_path: &Path,
    output_dir: Option<PathBuf>,
    filename: Option<String>,
    keep_latest: bool,
) -> Result<()> {
    let mut config = if config_path.exists() {
        info!("Loaded configuration from {}", config_path.display());
        config::load_config(config_path)?
    } else {
        debug!(
            "No configuration at {}, using defaults",
            config_path.display()
        );
        Config::default()
    };

    // Apply overrides
    if let Some(output_dir) = output_dir {
        config.report.output_dir = output_dir;
    }
    if let Some(filename) = filename {
        config.report.filename = filename;
    }
    if keep_latest {
        config.report.duplicates = DuplicatePolicy::KeepLatest;
    }

    let events = load_events(events_path)?;
    let run_status = events.iter().rev().find_map(|event| match event {
        HostEvent::RunEnd { result } => Some(result.status.clone()),
        _ => None,
    });

    let mut reporter = MarkdownReporter::new(config.report);
    replay(events, &mut reporter).context("Failed to replay events")?;

    match (reporter.summary(), run_status) {
        (Some(summary), Some(status)) => {
            report::print_summary(&summary, &status, &reporter.report_path());
        }
        _ => {
            eprintln!("Event stream ended before the run finished; no report was written.");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn load_events(path: &Path) -> Result<Vec<HostEvent>> {
    if path == Path::new("-") {
        return read_events(io::stdin().lock()).context("Failed to read events from stdin");
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open event file: {}", path.display()))?;
    read_events(BufReader::new(file))
        .with_context(|| format!("Failed to read events from {}", path.display()))
}

fn validate_config(config_path: &Path) -> Result<()> {
    match config::load_config(config_path) {
        Ok(config) => {
            let duplicates = match config.report.duplicates {
                DuplicatePolicy::AppendAll => "append-all",
                DuplicatePolicy::KeepLatest => "keep-latest",
            };

            println!("Configuration is valid!");
            println!();
            println!("Settings:");
            println!("  Output dir: {}", config.report.output_dir.display());
            println!("  Filename: {}", config.report.filename);
            println!("  Duplicates: {}", duplicates);

            Ok(())
        }
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_config(config_path: &Path) -> Result<()> {
    let config = r#"# mdreport configuration file

[report]
# Removed and recreated on every run
output_dir = "playwright-md-report"
filename = "index.md"
# "append-all" keeps every retry, "keep-latest" only the final attempt
duplicates = "append-all"
"#;

    if config_path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit manually.",
            config_path.display()
        );
        std::process::exit(1);
    }

    std::fs::write(config_path, config)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("Created {}", config_path.display());
    println!();
    println!("Edit the configuration as needed, then run:");
    println!("  mdreport replay events.ndjson");

    Ok(())
}
