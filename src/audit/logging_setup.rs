//! Tracing bootstrap: a timestamped debug-level log file, plus an optional
//! console layer when running verbose.
//!
//! Port of `original_source/litassist/logging/config.py`'s `setup_logging`,
//! using `tracing-subscriber`'s layered registry the way
//! `vinhnx-VTCode/src/main_helpers.rs`'s `initialize_tracing` does, rather
//! than stdlib `logging.Handler`s.

use std::path::{Path, PathBuf};

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::error::AuditError;

/// Initializes a process-wide tracing subscriber writing DEBUG-level spans
/// and events to a timestamped file under `log_dir` (default `logs/`), with
/// an additional stderr layer when `verbose` is set. Returns the log file
/// path. Safe to call more than once per process (later calls are no-ops,
/// matching `try_init`'s semantics); the original clears and rebuilds
/// `logging` handlers on each call, which `tracing`'s global-subscriber
/// model doesn't support.
pub fn setup_logging(verbose: bool, log_dir: Option<&Path>) -> Result<PathBuf, AuditError> {
    let log_dir = log_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("logs"));

    std::fs::create_dir_all(&log_dir).map_err(|e| AuditError::WriteFailed {
        path: log_dir.display().to_string(),
        source: e,
    })?;

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    let log_file = log_dir.join(format!("litassist_{timestamp}.log"));

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .map_err(|e| AuditError::WriteFailed {
            path: log_file.display().to_string(),
            source: e,
        })?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::sync::Arc::new(file))
        .with_ansi(false);

    let init_result = if verbose {
        let console_layer = tracing_subscriber::fmt::layer().with_target(false);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .with(console_layer)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .try_init()
    };

    if let Err(err) = init_result {
        tracing::warn!(error = %err, "tracing already initialized; skipping logging setup");
    }

    Ok(log_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_name_is_timestamped_under_log_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = setup_logging(false, Some(dir.path())).unwrap();
        assert!(path.starts_with(dir.path()));
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("litassist_"));
        assert!(path.exists());
    }
}
