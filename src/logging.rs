use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

fn env_filter(config: &Config) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}

/// Log to stderr, for one-shot commands.
pub fn init_stderr(config: &Config) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Log to a file in the data directory; the dashboard owns the terminal.
pub fn init_file(config: &Config) -> Result<()> {
    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("Failed to create data directory {}", config.data_dir.display()))?;

    let path = config.log_path();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();

    Ok(())
}

/// Dashboard logging. An unusable data directory disables logging with a
/// warning instead of keeping the dashboard from starting.
pub fn init_dashboard(config: &Config) {
    if let Err(e) = init_file(config) {
        eprintln!("Warning: {:#}; dashboard logging is disabled", e);
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter(config))
            .with_writer(std::io::sink)
            .try_init();
    }
}
