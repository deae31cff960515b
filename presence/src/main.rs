use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wardboard_presence::{
    config::Config,
    docs, handlers,
    middleware::{logging, request_id},
    state::AppState,
    store::{PgPresenceStore, PresenceStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wardboard_presence=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    tracing::info!(
        store_url = %config.store_url,
        bind_addr = %config.bind_addr,
        heartbeat_interval_secs = config.heartbeat_interval_secs,
        abandoned_after_secs = config.abandoned_after_secs,
        session_log_page_size = config.session_log_page_size,
        "Loaded configuration from environment/.env"
    );

    // Initialize the shared store
    let pool = sqlx::PgPool::connect(&config.store_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    let store: Arc<dyn PresenceStore> = Arc::new(PgPresenceStore::connect(pool).await?);
    let state = AppState::new(store, config.clone());

    let app = Router::new()
        .route(
            "/api/presence/sessions",
            get(handlers::sessions::list_sessions),
        )
        .route(
            "/api/presence/sessions/{id}",
            delete(handlers::sessions::terminate_session),
        )
        .route(
            "/api/presence/sessions/sweep",
            post(handlers::sessions::sweep_sessions),
        )
        .route(
            "/api/presence/session-logs",
            get(handlers::session_logs::list_session_logs),
        )
        .route("/api/docs/openapi.json", get(docs::openapi_json))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(axum_middleware::from_fn(request_id::request_id))
                .layer(axum_middleware::from_fn(logging::log_error_responses)),
        )
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "Presence service listening");
    axum::serve(listener, app).await?;
    Ok(())
}
