use anyhow::Result;
use axum::Router;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use tavola_pos::core::{
    bootstrap::{self, bootstrap},
    config, db, swagger,
};
use tavola_pos::routes;

/// Migrations are embedded into the binary so deployments never need a
/// migrations directory on disk
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_tracing();
    bootstrap::init_env();

    let routes = routes::auth::routes_with_openapi()
        .merge(routes::categories::routes_with_openapi())
        .merge(routes::menu::routes_with_openapi())
        .merge(routes::inventory::routes_with_openapi())
        .merge(routes::tables::routes_with_openapi())
        .merge(routes::orders::routes_with_openapi())
        .merge(routes::staff::routes_with_openapi())
        .merge(routes::reports::routes_with_openapi());

    let mut openapi = routes.get_openapi().clone();
    openapi.info = utoipa::openapi::InfoBuilder::new()
        .title("Tavola POS API")
        .version("1.0.0")
        .build();
    let swagger_ui = swagger::create_swagger_ui(openapi)?;

    let app = Router::new().merge(routes).merge(swagger_ui);

    tracing::info!("Running migrations...");
    let config = config::load()?;
    let migrations_count = db::run_migrations_blocking(MIGRATIONS, &config.database.url).await?;
    tracing::info!("Run {} new migrations successfully", migrations_count);

    tracing::info!("Bootstrapping...");
    bootstrap("Tavola POS", app).await?;
    Ok(())
}
