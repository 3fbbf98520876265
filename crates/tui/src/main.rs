use std::{fs::OpenOptions, sync::Mutex};

use tracing_subscriber::EnvFilter;

mod app;
mod client;
mod config;
mod error;
mod ui;

use crate::{config::AppConfig, error::Result};

/// Logs go to `log_file` when set and are dropped otherwise, the terminal
/// belongs to the UI.
fn init_logging(config: &AppConfig) -> Result<()> {
    let Some(path) = config.log_file.as_deref() else {
        return Ok(());
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tally_tui=info,engine=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load()?;
    init_logging(&config)?;
    let mut app = app::App::new(config)?;
    app.run().await?;
    Ok(())
}
