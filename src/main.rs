use anyhow::Context;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod db;
mod dto;
mod error;
mod extract;
mod handlers;
mod models;
mod services;
#[cfg(test)]
mod test_support;

use auth::rate_limit::RateLimitState;
use config::Config;
use db::{HealthLogStore, MemoryHealthLogStore, PgHealthLogStore, ProfileStore};
use handlers::ws::LiveEvent;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn HealthLogStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub config: Arc<Config>,
    pub ws_tx: Option<broadcast::Sender<LiveEvent>>,
    pub rate_limiter: RateLimitState,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "equinox_wellness_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env()?);

    let (store, profiles): (Arc<dyn HealthLogStore>, Arc<dyn ProfileStore>) = match config
        .database_url
        .as_deref()
    {
        Some(url) => {
            let db = db::create_pool(url)
                .await
                .context("Failed to create database pool")?;
            sqlx::migrate!("./migrations")
                .run(&db)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");
            let pg = PgHealthLogStore::new(db);
            (Arc::new(pg.clone()), Arc::new(pg))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, health logs are kept in memory only");
            let memory = MemoryHealthLogStore::new();
            (Arc::new(memory.clone()), Arc::new(memory))
        }
    };

    // WebSocket broadcast channel
    let (ws_tx, _) = broadcast::channel::<LiveEvent>(256);

    let rate_limiter = RateLimitState::new(
        config.write_rate_limit_max,
        config.write_rate_limit_window_secs,
    );
    rate_limiter.spawn_cleanup_worker();

    let state = AppState {
        store,
        profiles,
        config: config.clone(),
        ws_tx: Some(ws_tx),
        rate_limiter,
    };

    let app = build_router(state);

    let addr = config.listen_addr();
    tracing::info!(
        addr = %addr,
        weights = ?config.scoring.weights(),
        "Starting server"
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/livez", get(handlers::probes::livez))
        .route("/readyz", get(handlers::probes::readyz))
        .route("/ws", get(handlers::ws::ws_handler));

    // Writes are limited per user, so the limiter runs inside auth.
    let write_routes = Router::new()
        .route("/health/log", post(handlers::health_logs::upsert_health_log))
        .route("/health/profile", put(handlers::profile::put_profile))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::rate_limit_writes,
        ));

    let protected_routes = Router::new()
        .route("/health/today", get(handlers::health_logs::get_today))
        .route("/health/readiness", get(handlers::health_logs::get_readiness))
        .route("/health/history", get(handlers::health_logs::get_history))
        .route("/health/sleep-debt", get(handlers::insights::get_sleep_debt))
        .route("/health/trends", get(handlers::insights::get_trends))
        .route("/health/streak", get(handlers::insights::get_streak))
        .route("/health/profile", get(handlers::profile::get_profile))
        .merge(write_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    let allowed_origins: Vec<axum::http::HeaderValue> =
        std::iter::once(&state.config.frontend_url)
            .chain(state.config.cors_extra_origins.iter())
            .filter_map(|o| match o.parse::<axum::http::HeaderValue>() {
                Ok(hv) => Some(hv),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
