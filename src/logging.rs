//! Tracing configuration and log routing.
//!
//! Logs go to stdout through a compact formatter and to the file named by
//! [`Config::log_file`](crate::config::Config::log_file), written through a non-blocking
//! appender. A log file that cannot be opened leaves stdout logging in place.
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Configure tracing subscribers for stdout and `log_file`.
///
/// - Respects `RUST_LOG` for filtering (defaults to `info`).
/// - Keeps the non-blocking writer guard alive for the process lifetime.
///
/// Later calls leave the first subscriber in place.
pub fn init_tracing(log_file: &Path) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(false).compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer);

    let file_writer = open_log_writer(log_file);
    let has_file = file_writer.is_some();
    let installed = match file_writer {
        Some(writer) => {
            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .compact();
            registry.with(file_layer).try_init()
        }
        None => registry.try_init(),
    };

    match installed {
        Ok(()) if has_file => {
            tracing::debug!(log_file = %log_file.display(), "Docquality logging initialised");
        }
        Ok(()) => tracing::debug!("Docquality logging initialised without a log file"),
        Err(_) => tracing::debug!("Tracing subscriber already installed"),
    }
}

/// Open `log_file` for appending, creating its directory first.
fn open_log_writer(log_file: &Path) -> Option<NonBlocking> {
    let dir = log_file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = log_file.file_name()?.to_string_lossy().into_owned();

    if let Err(err) = fs::create_dir_all(dir) {
        eprintln!("Failed to create log directory {}: {err}", dir.display());
        return None;
    }
    let appender = match RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
    {
        Ok(appender) => appender,
        Err(err) => {
            eprintln!("Failed to open log file {}: {err}", log_file.display());
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    Some(non_blocking)
}
