use anyhow::{Context, Result};
use std::io;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber, fmt, prelude::*};

/// Console output belongs to the REPL, so logs go to stderr or a file.
pub fn init_logging(level: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            let file = std::sync::Arc::new(
                std::fs::File::create(path)
                    .with_context(|| format!("create log file {}", path.display()))?,
            );
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_writer(file)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stderr))
                .try_init()?;
        }
    }
    info!(level, "logging initialized");
    Ok(())
}
