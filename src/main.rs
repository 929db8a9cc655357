use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use midwifery_core::config::{
    admin_seed_from_env_values, flag_from_env_value, password_iterations_from_env_value,
    session_ttl_from_env_value, snapshot_path_from_env_value,
};
use midwifery_core::constants::DEFAULT_REST_ADDR;
use midwifery_core::{ClinicServices, CoreConfig};

/// Main entry point for the midwifery clinic server
///
/// Resolves configuration from the environment, opens the clinic store and serves the RPC API.
///
/// # Environment Variables
/// - `CLINIC_REST_ADDR`: bind address (wins over `SERVER_PORT`)
/// - `SERVER_PORT`: port to bind on `0.0.0.0` (default address: "0.0.0.0:2022")
/// - `CLINIC_DATA_FILE`: JSON snapshot file; memory only when unset
/// - `CLINIC_PASSWORD_ITERATIONS`: PBKDF2 iteration count
/// - `CLINIC_REJECT_PAST_BOOKINGS`: reject appointments dated before now
/// - `CLINIC_SESSION_TTL_HOURS`: session token lifetime (default: one week)
/// - `CLINIC_ADMIN_EMAIL` / `CLINIC_ADMIN_PASSWORD`: admin account seeded at startup
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("midwifery=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = rest_addr(
        std::env::var("CLINIC_REST_ADDR").ok(),
        std::env::var("SERVER_PORT").ok(),
    )?;

    let cfg = CoreConfig::new(
        snapshot_path_from_env_value(std::env::var("CLINIC_DATA_FILE").ok()),
        password_iterations_from_env_value(std::env::var("CLINIC_PASSWORD_ITERATIONS").ok())?,
        flag_from_env_value(
            "CLINIC_REJECT_PAST_BOOKINGS",
            std::env::var("CLINIC_REJECT_PAST_BOOKINGS").ok(),
        )?,
        admin_seed_from_env_values(
            std::env::var("CLINIC_ADMIN_EMAIL").ok(),
            std::env::var("CLINIC_ADMIN_PASSWORD").ok(),
        )?,
    )?
    .with_session_ttl(session_ttl_from_env_value(
        std::env::var("CLINIC_SESSION_TTL_HOURS").ok(),
    )?)?;

    match cfg.snapshot_path() {
        Some(path) => tracing::info!("++ Clinic data file {}", path.display()),
        None => tracing::info!("++ Clinic data held in memory only"),
    }

    let services = ClinicServices::open(Arc::new(cfg)).context("failed to open clinic store")?;
    let app = api_rest::router(AppState::new(services));

    tracing::info!("++ Starting midwifery RPC on {}", rest_addr);

    let listener = tokio::net::TcpListener::bind(&rest_addr)
        .await
        .with_context(|| format!("failed to bind {rest_addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// `CLINIC_REST_ADDR` wins; otherwise `SERVER_PORT` binds every interface.
fn rest_addr(addr: Option<String>, port: Option<String>) -> anyhow::Result<String> {
    if let Some(addr) = addr.map(|a| a.trim().to_string()).filter(|a| !a.is_empty()) {
        return Ok(addr);
    }
    match port.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()) {
        Some(port) => {
            let port: u16 = port
                .parse()
                .with_context(|| format!("SERVER_PORT must be a port number, got {port:?}"))?;
            Ok(format!("0.0.0.0:{port}"))
        }
        None => Ok(DEFAULT_REST_ADDR.to_string()),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {:?}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("-- Shutting down");
}
