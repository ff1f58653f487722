//! Logging initialisation via tracing-subscriber.
//!
//! Call [`init`] once at startup, after the config is resolved.

use std::path::Path;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::error::AppError;

/// Initialise the global tracing subscriber.
///
/// `level` accepts standard level strings or full `EnvFilter` directives
/// (`"doubao_client=debug,warn"`).
///
/// If `prefer_level` is `true`, `level` takes precedence and `RUST_LOG` is only
/// used as a fallback when `level` is invalid. If `prefer_level` is `false`,
/// `RUST_LOG` takes precedence and `level` is the fallback.
///
/// Output goes to stderr unless `log_file` is given, in which case lines are
/// appended to that file.
pub fn init(level: &str, prefer_level: bool, log_file: Option<&Path>) -> Result<(), AppError> {
    let filter = if prefer_level {
        match EnvFilter::try_new(level) {
            Ok(filter) => filter,
            Err(level_err) => EnvFilter::try_from_default_env().map_err(|env_err| {
                AppError::Logger(format!(
                    "invalid log level '{level}': {level_err}; RUST_LOG parse failed: {env_err}"
                ))
            })?,
        }
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .map_err(|e| AppError::Logger(format!("invalid log level '{level}': {e}")))?
    };

    let writer = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    AppError::Logger(format!("failed to open log file '{}': {e}", path.display()))
                })?;
            BoxMakeWriter::new(file)
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))?;

    Ok(())
}

/// [`init`], falling back to `info` on stderr when the requested setup fails.
///
/// Returns the original error so the caller can report it; logging is
/// always usable afterwards.
pub fn init_best_effort(
    level: &str,
    prefer_level: bool,
    log_file: Option<&Path>,
) -> Option<AppError> {
    let err = init(level, prefer_level, log_file).err()?;
    // Fails only when a subscriber is already installed, which is fine.
    let _ = init("info", true, None);
    Some(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_strings_are_accepted() {
        for l in ["error", "warn", "info", "debug", "trace", "off", "doubao_client=debug,warn"] {
            assert!(EnvFilter::try_new(l).is_ok(), "expected '{l}' to be valid");
        }
    }

    #[test]
    fn missing_log_dir_errors() {
        let result = init("info", true, Some(Path::new("/nonexistent/dir/doubao.log")));
        match result {
            Err(AppError::Logger(msg)) => assert!(msg.contains("failed to open log file")),
            other => panic!("expected logger error, got {other:?}"),
        }
    }

    #[test]
    fn init_info_succeeds_or_already_init() {
        // A prior test in this process may already have installed a subscriber.
        let result = init("info", false, None);
        match result {
            Ok(()) => {}
            Err(AppError::Logger(msg)) if msg.contains("set subscriber") => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn best_effort_reports_bad_log_file_and_continues() {
        let err = init_best_effort("info", true, Some(Path::new("/nonexistent/dir/doubao.log")));
        match err {
            Some(AppError::Logger(msg)) => assert!(msg.contains("failed to open log file")),
            other => panic!("expected logger error, got {other:?}"),
        }
        // The stderr fallback (or an earlier subscriber) is now in place.
        assert!(init("info", true, None).is_err());
    }

    #[test]
    fn best_effort_is_silent_when_setup_works_or_already_done() {
        match init_best_effort("info", true, None) {
            None => {}
            Some(AppError::Logger(msg)) if msg.contains("set subscriber") => {}
            Some(e) => panic!("unexpected error: {e}"),
        }
    }
}
