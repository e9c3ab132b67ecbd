//! Logger configuration.

use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use tracing::{Level, debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::ApiConfig;

/// Sets the global logger for the application.
/// * stdout: compact, ANSI colored (when `log_to_stdout`).
/// * file: one JSON object per line in `log_dir/log_file` (when `log_to_file`).
///
/// `RUST_LOG` takes precedence over `log_level` when it is set.
/// # Errors
/// 1) Returns an error if the log directory cannot be created or the log file cannot be opened.
/// 2) Returns an error if the global subscriber cannot be set.
pub fn set_logger(cfg: &ApiConfig) -> anyhow::Result<()> {
    let level = cfg.log_level;

    let stdout_layer = cfg.log_to_stdout.then(|| {
        fmt::layer()
            .compact()
            .with_ansi(true)
            .with_filter(filter(level))
    });

    let path = cfg.log_dir.join(&cfg.log_file);
    let file_layer = if cfg.log_to_file {
        fs::create_dir_all(&cfg.log_dir)?;
        let file = OpenOptions::new().append(true).create(true).open(&path)?;
        Some(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_filter(filter(level)),
        )
    } else {
        None
    };

    let subscriber = Registry::default().with(stdout_layer).with(file_layer);
    tracing::subscriber::set_global_default(subscriber)?;

    info!(version = env!("CARGO_PKG_VERSION"), "form-relay logger initialized, level {level}");
    if cfg.log_to_stdout {
        debug!("Logging to stdout.");
    }
    if cfg.log_to_file {
        debug!("Logging to file: {}", path.display());
    }
    Ok(())
}

fn filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()))
}
