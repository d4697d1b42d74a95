//! Logging initialisation via tracing-subscriber.
//!
//! The terminal is owned by the UI, so logs never go to stdout or stderr:
//! they are appended to a file, or dropped when no file is configured.

use std::path::Path;

use anyhow::Context;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Build the event filter
///
/// `RUST_LOG` wins when set and valid; otherwise `default_filter` is used.
pub fn build_filter(default_filter: &str) -> anyhow::Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .with_context(|| format!("invalid log filter '{default_filter}'"))
}

/// Install the global subscriber
pub fn init(default_filter: &str, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = build_filter(default_filter)?;

    let writer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create log directory '{}'", parent.display())
                })?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file '{}'", path.display()))?;
            BoxMakeWriter::new(file)
        }
        None => BoxMakeWriter::new(std::io::sink),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to set subscriber: {e}"))?;

    Ok(())
}
