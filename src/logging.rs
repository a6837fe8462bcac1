//! File-based tracing setup.
//!
//! The terminal owns stdout, so every event goes to a log file through a
//! non-blocking writer. `RUST_LOG` wins over the configured level.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Keep the returned guard alive for the
/// lifetime of the process or buffered lines are lost on exit.
pub fn init(level: &str, log_file: &Path) -> Result<WorkerGuard> {
    let level = normalize_level(level)?;
    let file_name = log_file
        .file_name()
        .ok_or_else(|| anyhow!("log file path `{}` has no file name", log_file.display()))?;
    let dir = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory `{}`", dir.display()))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("invalid log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_file = %log_file.display(),
        "logging initialized"
    );

    Ok(guard)
}

fn normalize_level(level: &str) -> Result<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(anyhow!(
            "unsupported log level `{other}`, expected trace|debug|info|warn|error"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_levels_case_insensitively() {
        assert_eq!(normalize_level("INFO").unwrap(), "info");
        assert_eq!(normalize_level(" warning ").unwrap(), "warn");
        assert!(normalize_level("verbose").is_err());
    }

    #[test]
    fn creates_the_log_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("taskboard.log");

        let guard = init("debug", &path).unwrap();
        tracing::info!("written from the test");
        drop(guard);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("logging initialized"));
    }

    #[test]
    fn rejects_paths_without_file_name() {
        let err = init("info", Path::new("/")).unwrap_err();
        assert!(err.to_string().contains("no file name"));
    }
}
