//! # civic-api: Binary Entry Point
//!
//! Starts the Axum HTTP server for the civic grievance service.
//! Binds to `0.0.0.0:$PORT` (default 8080).

use civic_api::auth::SecretToken;
use civic_api::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let jwt_secret = match std::env::var("JWT_SECRET") {
        Ok(raw) => Some(SecretToken::new(raw).map_err(|e| {
            tracing::error!("Invalid JWT_SECRET: {e}");
            e
        })?),
        Err(_) => None,
    };
    let config = AppConfig { port, jwt_secret };
    tracing::debug!(?config, "configuration loaded");

    // Absent DATABASE_URL means in-memory only.
    let db_pool = civic_api::db::init_pool().await.map_err(|e| {
        tracing::error!("Database initialization failed: {e}");
        e
    })?;

    let state = AppState::with_config(config, db_pool);
    if state.secret_ephemeral {
        tracing::warn!(
            "JWT_SECRET not set, generating ephemeral secret. \
             Tokens issued before a restart will be rejected."
        );
    }

    state.hydrate_from_db().await.map_err(|e| {
        tracing::error!("Database hydration failed: {e}");
        e
    })?;

    civic_api::bootstrap::bootstrap(&state).await.map_err(|e| {
        tracing::error!("Bootstrap failed: {e}");
        e
    })?;

    let app = civic_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Civic API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
