//! Hent server entry point.

use anyhow::Result;
use clap::Parser;
use hent::cli::{preflight, Cli, Output};
use hent::config::Settings;
use hent::server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("hent={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Ensure data directories exist
    std::fs::create_dir_all(settings.data_dir())?;
    std::fs::create_dir_all(settings.work_dir())?;
    std::fs::create_dir_all(settings.serve_dir())?;

    if let Err(e) = preflight::check() {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    server::run_serve(&cli.host, cli.port, settings).await?;

    Ok(())
}
