use crate::core::db::DbPool;

/// Shared handler state. Cloned per request by axum.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
}
