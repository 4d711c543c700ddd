use std::fs;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

fn env_filter(filter: &str) -> Result<EnvFilter> {
    let directive: Directive = filter
        .parse()
        .with_context(|| format!("invalid log directive '{filter}'"))?;
    Ok(EnvFilter::builder()
        .with_default_directive(directive)
        .from_env_lossy())
}

/// Log to stderr for one-shot commands so stdout stays clean.
pub fn init_stderr(config: &AppConfig) -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config.log_filter())?)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
    Ok(())
}

/// Log to `<data_dir>/tareas.log`; the terminal belongs to the form.
/// Hold the returned guard until shutdown so buffered lines are flushed.
pub fn init_file(config: &AppConfig) -> Result<WorkerGuard> {
    let log_path = config.log_path();
    let dir = config.data_dir();
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create data dir {}", dir.display()))?;
    let file_name = log_path
        .file_name()
        .context("log path has no file name")?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config.log_filter())?)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    Ok(guard)
}
