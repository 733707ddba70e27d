//! Tracing setup.
//!
//! stdout is never logged to: lemonbar and herbstclient talk to the panel
//! over pipes. Diagnostics go to stderr in compact form and to a daily
//! JSON file under [`default_log_dir`].

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::{BarError, Result};

const LOG_FILE_PREFIX: &str = "barpyrus.log";

/// Flushes the log file when dropped; hold it until `main` returns.
pub struct LogGuard {
    _file: WorkerGuard,
}

/// `RUST_LOG` wins; otherwise barpyrus crates log at info, or debug when
/// `verbose`.
fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("barpyrus={level}"))
    })
}

fn prepare_dir(log_dir: Option<PathBuf>) -> Result<PathBuf> {
    let dir = match log_dir {
        Some(dir) => dir,
        None => default_log_dir()?,
    };
    std::fs::create_dir_all(&dir).map_err(|e| BarError::io("creating log directory", &dir, e))?;
    Ok(dir)
}

/// Install the global subscriber: stderr plus a rolling JSON file in
/// `log_dir` (or [`default_log_dir`]).
pub fn init_logging(log_dir: Option<PathBuf>, verbose: bool) -> Result<LogGuard> {
    let dir = prepare_dir(log_dir)?;
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX));

    let json = fmt::layer()
        .json()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .with_current_span(true)
        .with_span_list(true);
    let stderr = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_file(verbose)
        .with_line_number(verbose);

    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(json)
        .with(stderr)
        .init();

    tracing::debug!(log_dir = %dir.display(), verbose, "logging initialized");
    Ok(LogGuard { _file: guard })
}

/// `$XDG_STATE_HOME/barpyrus/logs`, or `~/.local/state/barpyrus/logs`.
pub fn default_log_dir() -> Result<PathBuf> {
    let state = match dirs::state_dir() {
        Some(state) => state,
        None => dirs::home_dir()
            .ok_or_else(|| BarError::internal("home directory not found"))?
            .join(".local")
            .join("state"),
    };
    Ok(state.join("barpyrus").join("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_default_log_dir_uses_state_home() {
        // SAFETY: serialized test, no other thread reads the environment
        unsafe { std::env::set_var("XDG_STATE_HOME", "/tmp/test-state") };
        let dir = default_log_dir().unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/test-state/barpyrus/logs"));
        unsafe { std::env::remove_var("XDG_STATE_HOME") };
    }

    #[test]
    #[serial]
    fn test_verbose_raises_default_level() {
        // SAFETY: serialized test, no other thread reads the environment
        unsafe { std::env::remove_var("RUST_LOG") };
        assert_eq!(env_filter(false).to_string(), "barpyrus=info");
        assert_eq!(env_filter(true).to_string(), "barpyrus=debug");
    }

    #[test]
    fn test_prepare_dir_creates_missing_directory() {
        let root = tempfile::tempdir().unwrap();
        let dir = prepare_dir(Some(root.path().join("nested"))).unwrap();
        assert!(dir.is_dir());
    }
}
