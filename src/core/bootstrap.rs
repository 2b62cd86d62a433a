use anyhow::{Context, Result};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::core::{app_state::AppState, config, db};

pub fn init_tracing() {
    tracing_subscriber::fmt::init();
}

pub fn init_env() {
    dotenvy::dotenv().ok();
}

/// Builds the shared state, attaches it to the router and serves until
/// shutdown.
pub async fn bootstrap(service_name: &str, app: Router<AppState>) -> Result<()> {
    let config = config::load()?;

    let db_pool = db::build_pool(&config.database.url).await?;
    let state = AppState { db_pool };

    let app = app.with_state(state).layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("{} listening on {}", service_name, addr);

    axum::serve(listener, app)
        .await
        .context("Server stopped unexpectedly")?;
    Ok(())
}
