use anyhow::Context;
use clap::{Parser, Subcommand};
use extractors::{Extractor, GradesTableExtractor, StudentMetadataExtractor};
use history::{store_path, HistoryStore};
use shared_types::{ExtractionResult, NOT_AVAILABLE};
use std::path::{Path, PathBuf};
use tracing_subscriber::prelude::*;

mod config;

use config::GradewatchConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long)]
    log_file_path: Option<String>,

    /// Configuration file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract a saved grades page, record it and print the changes found
    Check {
        html_file: PathBuf,
        /// History to record into; defaults to the extracted student id
        #[arg(long)]
        identity: Option<String>,
    },
    /// Print history statistics
    Stats {
        #[arg(long)]
        identity: String,
    },
    /// Print the most recent changes
    Changes {
        #[arg(long)]
        identity: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Delete every snapshot and change of a history
    Clear {
        #[arg(long)]
        identity: String,
    },
    /// Copy a history to another file
    Export {
        #[arg(long)]
        identity: String,
        path: PathBuf,
    },
    /// Print the effective configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = args.log_file_path {
        let log_path = Path::new(&log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("gradewatch.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter.clone())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let (config, config_path) =
        GradewatchConfig::load(args.config.as_deref()).context("Failed to load config")?;
    tracing::info!("Config loaded from {}", config_path.display());

    match args.command {
        Command::Check {
            html_file,
            identity,
        } => check(&config, &html_file, identity),
        Command::Stats { identity } => {
            let store = open_store(&config, &identity)?;
            print_json(&store.get_statistics())
        }
        Command::Changes { identity, limit } => {
            let store = open_store(&config, &identity)?;
            print_json(&store.recent_changes(limit))
        }
        Command::Clear { identity } => {
            let mut store = open_store(&config, &identity)?;
            store.clear()?;
            println!("Cleared {}", store.path().display());
            Ok(())
        }
        Command::Export { identity, path } => {
            let store = open_store(&config, &identity)?;
            store.export_to(&path)?;
            println!("Exported {} to {}", store.path().display(), path.display());
            Ok(())
        }
        Command::Config => {
            print!("{}", toml::to_string(&config)?);
            Ok(())
        }
    }
}

fn check(
    config: &GradewatchConfig,
    html_file: &Path,
    identity: Option<String>,
) -> anyhow::Result<()> {
    let html = std::fs::read_to_string(html_file)
        .with_context(|| format!("Failed to read {}", html_file.display()))?;

    let extractor = GradesTableExtractor::new(config.table_scoring(), StudentMetadataExtractor::new());
    let result = extractor.extract(&html)?;
    tracing::info!(
        "Extracted {} subjects for {}",
        result.subjects.len(),
        result.student_id
    );

    let identity = identity.unwrap_or_else(|| identity_of(&result));
    let mut store = open_store(config, &identity)?;
    let changes = store.record(result);
    store.save()?;

    print_json(&changes)
}

/// Student id of an extraction, or an empty identity when it was not found
fn identity_of(result: &ExtractionResult) -> String {
    if result.student_id == NOT_AVAILABLE {
        String::new()
    } else {
        result.student_id.clone()
    }
}

fn open_store(config: &GradewatchConfig, identity: &str) -> anyhow::Result<HistoryStore> {
    let path = store_path(config.storage_dir(), identity);
    let store = HistoryStore::open(&path, config.history.clone())?;
    Ok(store)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn result(student_id: &str) -> ExtractionResult {
        ExtractionResult {
            student_name: NOT_AVAILABLE.to_string(),
            student_id: student_id.to_string(),
            period: NOT_AVAILABLE.to_string(),
            queried_at: Utc::now(),
            subjects: vec![],
        }
    }

    #[test]
    fn test_identity_defaults_to_student_id() {
        assert_eq!(identity_of(&result("123456789")), "123456789");
        assert_eq!(identity_of(&result(NOT_AVAILABLE)), "");
    }

    #[test]
    fn test_cli_parses_check() {
        let args = Args::parse_from(["gradewatch", "check", "page.html", "--identity", "42"]);
        match args.command {
            Command::Check {
                html_file,
                identity,
            } => {
                assert_eq!(html_file, PathBuf::from("page.html"));
                assert_eq!(identity.as_deref(), Some("42"));
            }
            other => panic!("Expected Check, got {:?}", other),
        }
    }
}
