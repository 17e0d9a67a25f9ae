//! Shared logging setup for tambo binaries.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const DEFAULT_LOG_FILTER: &str = "tambo=info,tambo_db=info";

/// Logging configuration shared by tambo binaries.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub log_dir: &'a Path,
    pub verbose: bool,
    /// Filter used when `RUST_LOG` is unset. Falls back to [`DEFAULT_LOG_FILTER`].
    pub filter: Option<&'a str>,
}

/// Initialize tracing with a daily rolling file writer and stderr output.
///
/// The returned guard flushes the file writer on drop; keep it alive for the
/// lifetime of the process.
pub fn init_logging(config: LogConfig<'_>) -> Result<WorkerGuard> {
    fs::create_dir_all(config.log_dir).with_context(|| {
        format!(
            "Failed to create logs directory: {}",
            config.log_dir.display()
        )
    })?;

    let file_appender =
        tracing_appender::rolling::daily(config.log_dir, log_file_name(config.app_name));
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_filter = resolve_filter(config.filter);
    // stderr stays quiet unless asked; the file always gets the full filter
    let console_filter = if config.verbose {
        resolve_filter(config.filter)
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

fn resolve_filter(configured: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(configured.unwrap_or(DEFAULT_LOG_FILTER)))
}

/// File name for the rolling log of `app_name` (`tambo` -> `tambo.log`).
pub fn log_file_name(app_name: &str) -> String {
    format!("{}.log", sanitize_name(app_name))
}

fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "tambo".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_name_sanitizes() {
        assert_eq!(log_file_name("tambo"), "tambo.log");
        assert_eq!(log_file_name("tambo cli/v2"), "tambo_cli_v2.log");
        assert_eq!(log_file_name(""), "tambo.log");
    }

    #[test]
    fn test_init_logging_creates_log_dir() {
        let tmp = tempfile::TempDir::new().unwrap();
        let log_dir = tmp.path().join("nested").join("logs");

        let guard = init_logging(LogConfig {
            app_name: "tambo-test",
            log_dir: &log_dir,
            verbose: false,
            filter: Some("tambo=debug"),
        })
        .unwrap();

        assert!(log_dir.is_dir());
        drop(guard);
    }
}
