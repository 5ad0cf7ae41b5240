mod app;

use anyhow::Result;
use std::fs::{self, OpenOptions};

use aerolines_core::{
    config::{self, AppConfig},
    BookingSession,
};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config_path = config::ensure_default_config()?;
    let config = AppConfig::load()?;
    tracing::info!(
        config = %config_path.display(),
        store = %config.users_path().display(),
        "Configuration loaded"
    );

    let session = BookingSession::bootstrap(&config);
    let mut app = app::AerolinesApp::new(session);
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("aerolines.log");

    let env_filter = EnvFilter::from_default_env();

    // The alternate screen owns stdout, so events only go to the file.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
