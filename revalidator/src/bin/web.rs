//! Revalidate Web Server - Kontent webhook receiver.
//!
//! This binary provides the webhook endpoint that:
//! - Verifies the Kontent signature on each delivery
//! - Resolves changed post codenames to their public paths
//! - Asks the site origin to regenerate those paths

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use revalidator::{app, AppState, Config, DeliveryClient, OriginRevalidator};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        webhook_secret_configured = config.is_signature_verification_enabled(),
        project_id = %config.project_id,
        preview = config.preview_api_key.is_some(),
        delivery_url = %config.delivery_url,
        site_origin = %config.site_origin,
        revalidate_token_configured = config.revalidate_token.is_some(),
        post_path_prefix = %config.post_path_prefix,
        "config_loaded"
    );

    if !config.is_signature_verification_enabled() {
        warn!("webhook_secret_missing_all_deliveries_rejected");
    }

    // One HTTP client shared by lookups and revalidations
    let client = Client::builder()
        .timeout(Duration::from_millis(config.request_timeout_ms))
        .build()
        .context("Failed to create HTTP client")?;

    let lookup = DeliveryClient::from_config(client.clone(), &config)
        .context("Failed to create Delivery API client")?;
    let cache = OriginRevalidator::from_config(client, &config)
        .context("Failed to create origin revalidator (is REVALIDATE_TOKEN set?)")?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(config, lookup, cache);

    // Build the router
    let router = app(state);

    // Bind to address
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
