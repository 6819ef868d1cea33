//! `tracing` subscriber setup for the trendscope CLI.
//!
//! Every [`QueryPipeline::resolve`](crate::pipeline::QueryPipeline::resolve)
//! call runs inside a `query` span carrying a fresh `request_id`. Events in
//! that span report the rule-based `kind`, `confidence` and `entities` count,
//! the merged `provenance` after a secondary parse, and `warn` on secondary
//! parser errors, timeouts (`timeout_ms`) and discarded responses.
//!
//! With `[logging] dir` set, events go to stderr and as JSON lines to a
//! daily file under that directory; the JSON records include the enclosing
//! span so each line can be tied back to its `request_id`. Without it,
//! stderr only.

use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// File name prefix; the appender adds a `.YYYY-MM-DD` suffix.
pub const LOG_FILE_PREFIX: &str = "trendscope.log";

/// Keeps the file writer alive. Dropping it flushes buffered lines.
pub struct LoggingGuard {
    _worker: WorkerGuard,
}

/// `RUST_LOG` if set, else the configured level.
fn level_filter(configured: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured))
}

/// Stderr plus daily JSON files under `dir`.
///
/// # Errors
///
/// Fails when `dir` cannot be created or a subscriber is already installed.
pub fn init_production(dir: &Path, level: &str) -> anyhow::Result<LoggingGuard> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create logs directory {}", dir.display()))?;

    let (file_writer, worker) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX));

    tracing_subscriber::registry()
        .with(level_filter(level))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_writer(file_writer),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(LoggingGuard { _worker: worker })
}

/// Stderr only. Calling it again keeps the first subscriber.
pub fn init_cli(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level_filter(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
