pub mod cli;
pub mod clients;
pub mod config;
pub mod fetch;
pub mod models;
pub mod parser;
pub mod session;
pub mod web;

use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;
use web::AppState;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    config.validate()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve) | None => serve(config).await,

        Some(Commands::Check) => run_check(config).await,

        Some(Commands::Init) => {
            if Config::create_default_if_missing()? {
                println!("✓ Config file created. Edit config.toml and run again.");
            } else {
                println!("Config file already exists, leaving it untouched.");
            }
            Ok(())
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    info!(
        "Cinedeck v{} starting, catalog API at {}",
        env!("CARGO_PKG_VERSION"),
        config.api_base()
    );

    let port = config.server.port;
    let state = Arc::new(AppState::new(config)?);
    let app = web::router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let server_handle = tokio::spawn(async move {
        info!("Dashboard running at http://0.0.0.0:{port}");
        if let Err(e) = axum::serve(listener, app).await {
            error!("Web server error: {e}");
        }
    });

    info!("Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {e}"),
    }

    server_handle.abort();
    info!("Dashboard stopped");

    Ok(())
}

/// Hit the catalog API once to confirm the configured base URL answers.
async fn run_check(config: Config) -> anyhow::Result<()> {
    let state = AppState::new(config)?;
    let cancel = state.cancel_token();

    println!("Checking catalog API at {}...", state.config.api_base());

    match state.catalog.list_movies(1, 1, None, &cancel).await {
        Ok(listing) => {
            println!("✓ Catalog API reachable ({} movies)", listing.total);
            Ok(())
        }
        Err(e) => {
            println!("✗ Catalog API check failed: {e}");
            Err(e.into())
        }
    }
}
