//! Logging setup for the CLI.
//!
//! Two sinks share one [`EnvFilter`]:
//! - stderr, human-readable, limited to warnings unless `-v` is given
//! - an optional JSONL file, written through a non-blocking appender, when a
//!   log path or directory is configured

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_PATH_ENV: &str = "YMLINT_LOG_PATH";
const LOG_DIR_ENV: &str = "YMLINT_LOG_DIR";
const LOG_FILE_NAME: &str = "ymlint.jsonl";

/// Where log files go.
#[derive(Debug, Clone, Default)]
pub struct ObservabilityConfig {
    /// Explicit log file.
    pub log_path: Option<PathBuf>,
    /// Directory for a daily-rotated log file.
    pub log_dir: Option<PathBuf>,
    /// Level shown on stderr.
    pub console_level: Option<LevelFilter>,
}

impl ObservabilityConfig {
    /// Read `YMLINT_LOG_PATH` / `YMLINT_LOG_DIR`; `log_dir` from configuration
    /// applies when the environment does not name a directory.
    pub fn from_env_with_overrides(log_dir: Option<PathBuf>) -> Self {
        Self {
            log_path: std::env::var_os(LOG_PATH_ENV).map(PathBuf::from),
            log_dir: std::env::var_os(LOG_DIR_ENV)
                .map(PathBuf::from)
                .or(log_dir),
            console_level: None,
        }
    }

    /// Set the stderr level.
    #[must_use]
    pub const fn with_console_level(mut self, level: LevelFilter) -> Self {
        self.console_level = Some(level);
        self
    }
}

/// Stderr level for the `-q` / `-v` flags.
pub const fn console_level(quiet: bool, verbose: u8) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::ERROR,
        (false, 0) => LevelFilter::WARN,
        (false, 1) => LevelFilter::DEBUG,
        (false, _) => LevelFilter::TRACE,
    }
}

/// Event filter: flags first, then `RUST_LOG`, then the configured level.
pub fn env_filter(quiet: bool, verbose: u8, default_level: &str) -> EnvFilter {
    if quiet {
        return EnvFilter::new("error");
    }
    match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

/// Install the global subscriber.
///
/// Keep the returned guard alive until exit so buffered file output is flushed.
pub fn init_observability(
    config: &ObservabilityConfig,
    filter: EnvFilter,
) -> anyhow::Result<Option<WorkerGuard>> {
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_filter(config.console_level.unwrap_or(LevelFilter::WARN));

    let (file, guard) = match file_writer(config)? {
        Some((writer, guard)) => {
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_current_span(true)
                .with_span_list(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .context("a global tracing subscriber is already installed")?;
    Ok(guard)
}

fn file_writer(
    config: &ObservabilityConfig,
) -> anyhow::Result<Option<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)>> {
    let appender = if let Some(ref path) = config.log_path {
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let name = path
            .file_name()
            .with_context(|| format!("log path has no file name: {}", path.display()))?;
        ensure_dir(dir)?;
        tracing_appender::rolling::never(dir, name)
    } else if let Some(ref dir) = config.log_dir {
        ensure_dir(dir)?;
        tracing_appender::rolling::daily(dir, LOG_FILE_NAME)
    } else {
        return Ok(None);
    };
    Ok(Some(tracing_appender::non_blocking(appender)))
}

fn ensure_dir(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))
}
