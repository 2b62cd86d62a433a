use anyhow::{Context, Result};
use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use diesel::{AsChangeset, ExpressionMethods, QueryDsl, QueryResult, SelectableHelper};
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    availability::{self, SyncReport},
    core::{
        aliases::DieselError,
        app_error::{AppError, StdResponse},
        app_state::AppState,
        config, middleware,
    },
    models::{CreateIngredientEntity, IngredientEntity},
    schema::ingredients,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/ingredients",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_ingredients))
            .routes(utoipa_axum::routes!(create_ingredient))
            .routes(utoipa_axum::routes!(get_low_stock))
            .routes(utoipa_axum::routes!(get_ingredient))
            .routes(utoipa_axum::routes!(update_ingredient))
            .routes(utoipa_axum::routes!(adjust_stock))
            .routes(utoipa_axum::routes!(delete_ingredient))
            .route_layer(axum::middleware::from_fn(middleware::staff_authorization)),
    )
}

/// Fetch all ingredients.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Inventory"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List all ingredients", body = StdResponse<Vec<IngredientEntity>, String>)
    )
)]
async fn get_ingredients(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let ingredients: Vec<IngredientEntity> = ingredients::table
        .order_by(ingredients::name.asc())
        .get_results(conn)
        .await
        .context("Failed to get ingredients")?;

    Ok(StdResponse {
        data: Some(ingredients),
        message: Some("Get ingredients successfully"),
    })
}

/// Ingredients at or below the configured low-stock threshold.
#[utoipa::path(
    get,
    path = "/low-stock",
    tags = ["Inventory"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List low-stock ingredients", body = StdResponse<Vec<IngredientEntity>, String>)
    )
)]
async fn get_low_stock(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let ingredients: Vec<IngredientEntity> = ingredients::table
        .filter(ingredients::stock.le(config::low_stock_threshold()))
        .order_by(ingredients::stock.asc())
        .get_results(conn)
        .await
        .context("Failed to get low-stock ingredients")?;

    Ok(StdResponse {
        data: Some(ingredients),
        message: Some("Get low-stock ingredients successfully"),
    })
}

/// Create an ingredient.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Inventory"],
    security(("bearerAuth" = [])),
    request_body = CreateIngredientEntity,
    responses(
        (status = 200, description = "Created ingredient successfully", body = StdResponse<IngredientEntity, String>)
    )
)]
async fn create_ingredient(
    State(state): State<AppState>,
    Json(body): Json<CreateIngredientEntity>,
) -> Result<impl IntoResponse, AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::BadRequest("Ingredient name must not be empty".to_string()));
    }
    if body.stock < 0.0 {
        return Err(AppError::BadRequest("Stock must not be negative".to_string()));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let ingredient: IngredientEntity = diesel::insert_into(ingredients::table)
        .values(body)
        .returning(IngredientEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create ingredient")?;

    Ok(StdResponse {
        data: Some(ingredient),
        message: Some("Created ingredient successfully"),
    })
}

/// Fetch a specific ingredient.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Inventory"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Ingredient ID to fetch")
    ),
    responses(
        (status = 200, description = "Get ingredient successfully", body = StdResponse<IngredientEntity, String>)
    )
)]
async fn get_ingredient(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let ingredient: QueryResult<IngredientEntity> =
        ingredients::table.find(id).get_result(conn).await;

    match ingredient {
        Ok(ingredient) => Ok(StdResponse {
            data: Some(ingredient),
            message: Some("Get ingredient successfully"),
        }),
        Err(DieselError::NotFound) => Err(AppError::NotFound),
        Err(err) => Err(AppError::Other(err.into())),
    }
}

#[derive(AsChangeset, Deserialize, ToSchema)]
#[diesel(table_name = crate::schema::ingredients)]
struct UpdateIngredientReq {
    name: Option<String>,
    unit: Option<String>,
}

/// Update an ingredient's name or unit.
#[utoipa::path(
    patch,
    path = "/{id}",
    tags = ["Inventory"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Ingredient ID to update")
    ),
    request_body = UpdateIngredientReq,
    responses(
        (status = 200, description = "Updated ingredient successfully", body = StdResponse<IngredientEntity, String>)
    )
)]
async fn update_ingredient(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<UpdateIngredientReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let ingredient: QueryResult<IngredientEntity> = diesel::update(ingredients::table.find(id))
        .set((body, ingredients::updated_at.eq(diesel::dsl::now)))
        .returning(IngredientEntity::as_returning())
        .get_result(conn)
        .await;

    match ingredient {
        Ok(ingredient) => Ok(StdResponse {
            data: Some(ingredient),
            message: Some("Updated ingredient successfully"),
        }),
        Err(DieselError::NotFound) => Err(AppError::NotFound),
        Err(err) => Err(AppError::Other(err.into())),
    }
}

#[derive(Deserialize, ToSchema)]
struct AdjustStockReq {
    /// Positive for restock, negative for spoilage or correction.
    delta: f32,
}

#[derive(Serialize, ToSchema)]
struct AdjustStockRes {
    ingredient: IngredientEntity,
    availability: SyncReport,
}

/// Adjust an ingredient's stock and re-sync menu availability.
#[utoipa::path(
    patch,
    path = "/{id}/stock",
    tags = ["Inventory"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Ingredient ID to adjust")
    ),
    request_body = AdjustStockReq,
    responses(
        (status = 200, description = "Adjusted stock successfully", body = StdResponse<AdjustStockRes, String>)
    )
)]
async fn adjust_stock(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<AdjustStockReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let (ingredient, report) = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let ingredient: IngredientEntity = ingredients::table
                    .find(id)
                    .get_result(conn)
                    .await
                    .map_err(|_| AppError::NotFound)?;

                let new_stock = (ingredient.stock + body.delta).max(0.0);
                let ingredient: IngredientEntity = diesel::update(ingredients::table.find(id))
                    .set((
                        ingredients::stock.eq(new_stock),
                        ingredients::updated_at.eq(diesel::dsl::now),
                    ))
                    .returning(IngredientEntity::as_returning())
                    .get_result(conn)
                    .await
                    .context("Failed to adjust stock")?;

                let report = availability::sync_menu_availability(conn).await?;

                Ok::<(IngredientEntity, SyncReport), AppError>((ingredient, report))
            })
        })
        .await?;

    Ok(StdResponse {
        data: Some(AdjustStockRes {
            ingredient,
            availability: report,
        }),
        message: Some("Adjusted stock successfully"),
    })
}

/// Delete an ingredient. Recipe lines referencing it are removed and menu
/// availability is recomputed.
#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Inventory"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Ingredient ID to delete")
    ),
    responses(
        (status = 200, description = "Deleted ingredient successfully", body = StdResponse<IngredientEntity, String>)
    )
)]
async fn delete_ingredient(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let ingredient = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let ingredient: IngredientEntity = diesel::delete(ingredients::table.find(id))
                    .returning(IngredientEntity::as_returning())
                    .get_result(conn)
                    .await
                    .map_err(|err| match err {
                        DieselError::NotFound => AppError::NotFound,
                        _ => AppError::Other(err.into()),
                    })?;

                availability::sync_menu_availability(conn).await?;

                Ok::<IngredientEntity, AppError>(ingredient)
            })
        })
        .await?;

    Ok(StdResponse {
        data: Some(ingredient),
        message: Some("Deleted ingredient successfully"),
    })
}
