//! Binary entrypoint: loads config, sets up logging, builds the Axum app, and serves the
//! form relay endpoints.

use std::{net::SocketAddr, sync::Arc};

use dotenvy::dotenv;
use tracing::{info, warn};

mod compose;
mod config;
mod cors;
mod email;
mod error;
mod forms;
mod logger;
mod response;
mod routes;
mod validation;

use crate::{config::ApiConfig, logger::set_logger, routes::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1) Load environment (.env is optional)
    dotenv().ok();

    // 2) Configuration + logging
    let config = ApiConfig::from_env()?;
    set_logger(&config)?;

    if config.missing_smtp_credentials() {
        warn!("SMTP_USERNAME or SMTP_PASSWORD is not set, sends will likely be rejected");
    }

    // 3) App state (transport, addresses, CORS origin)
    let state = Arc::new(AppState::from_config(&config)?);
    info!(
        environment = ?config.environment,
        origin = ?state.cors.origin(),
        "Allowed CORS origin"
    );
    if config.smtp_verify_on_start {
        state.email.verify().await;
    }

    // 4) Router
    let app = routes::router(state);

    // 5) Bind address
    let addr: SocketAddr = format!("{}:{}", config.listen_addr, config.listen_port).parse()?;
    info!("Starting server on {addr}");

    // 6) Serve until Ctrl-C / SIGTERM; in-flight sends are allowed to finish
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
