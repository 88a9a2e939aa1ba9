mod auth;
mod bootstrap;
mod health;
mod notifications;
mod requests;
mod routes;
mod subroles;
mod users;

use anyhow::Result;
use portico_core::config::{AppConfig, LoadOptions};

use crate::routes::AppState;

fn init_logging(config: &AppConfig) {
    use portico_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    // Now bootstrap using the same config we already loaded
    let app = bootstrap::bootstrap_with_config(config)?;

    health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_port,
        app.client.clone(),
    )
    .await?;

    let state = AppState { config: app.config.clone(), client: app.client };
    let api = routes::api_router(state);

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "portico.server.started",
        bind_address = %address,
        upstream = %app.config.upstream.base_url,
        "portico gateway started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, api).await {
            tracing::error!(
                event_name = "portico.server.error",
                error = %error,
                "api server terminated unexpectedly"
            );
        }
    });

    wait_for_shutdown().await?;
    tracing::info!(event_name = "portico.server.stopping", "portico gateway stopping");

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
