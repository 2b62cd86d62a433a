use anyhow::{Context, Result};
use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use diesel::{AsChangeset, ExpressionMethods, QueryDsl, QueryResult, SelectableHelper};
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    core::{
        aliases::DieselError,
        app_error::{AppError, StdResponse},
        app_state::AppState,
        middleware,
    },
    models::{CreateDiningTableEntity, DiningTableEntity},
    schema::dining_tables,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/tables",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_tables))
            .routes(utoipa_axum::routes!(create_table))
            .routes(utoipa_axum::routes!(update_table))
            .routes(utoipa_axum::routes!(delete_table))
            .routes(utoipa_axum::routes!(occupy_table))
            .routes(utoipa_axum::routes!(release_table))
            .route_layer(axum::middleware::from_fn(middleware::staff_authorization)),
    )
}

/// Fetch all dining tables.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Tables"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List all dining tables", body = StdResponse<Vec<DiningTableEntity>, String>)
    )
)]
async fn get_tables(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let tables: Vec<DiningTableEntity> = dining_tables::table
        .order_by(dining_tables::name.asc())
        .get_results(conn)
        .await
        .context("Failed to get dining tables")?;

    Ok(StdResponse {
        data: Some(tables),
        message: Some("Get dining tables successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct CreateTableReq {
    name: String,
    /// Seats at the table, defaults to 4.
    capacity: Option<i32>,
}

/// Create a dining table.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Tables"],
    security(("bearerAuth" = [])),
    request_body = CreateTableReq,
    responses(
        (status = 200, description = "Created dining table successfully", body = StdResponse<DiningTableEntity, String>)
    )
)]
async fn create_table(
    State(state): State<AppState>,
    Json(body): Json<CreateTableReq>,
) -> Result<impl IntoResponse, AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::BadRequest("Table name must not be empty".to_string()));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let table: DiningTableEntity = diesel::insert_into(dining_tables::table)
        .values(CreateDiningTableEntity {
            name: body.name,
            capacity: body.capacity.unwrap_or(4),
        })
        .returning(DiningTableEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create dining table")?;

    Ok(StdResponse {
        data: Some(table),
        message: Some("Created dining table successfully"),
    })
}

#[derive(AsChangeset, Deserialize, ToSchema)]
#[diesel(table_name = crate::schema::dining_tables)]
struct UpdateTableReq {
    name: Option<String>,
    capacity: Option<i32>,
}

/// Update a dining table's name or capacity.
#[utoipa::path(
    patch,
    path = "/{id}",
    tags = ["Tables"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Table ID to update")
    ),
    request_body = UpdateTableReq,
    responses(
        (status = 200, description = "Updated dining table successfully", body = StdResponse<DiningTableEntity, String>)
    )
)]
async fn update_table(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<UpdateTableReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let table: QueryResult<DiningTableEntity> = diesel::update(dining_tables::table.find(id))
        .set((body, dining_tables::updated_at.eq(diesel::dsl::now)))
        .returning(DiningTableEntity::as_returning())
        .get_result(conn)
        .await;

    match table {
        Ok(table) => Ok(StdResponse {
            data: Some(table),
            message: Some("Updated dining table successfully"),
        }),
        Err(DieselError::NotFound) => Err(AppError::NotFound),
        Err(err) => Err(AppError::Other(err.into())),
    }
}

/// Delete a dining table. Past orders keep their receipts; the reference is
/// simply cleared.
#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Tables"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Table ID to delete")
    ),
    responses(
        (status = 200, description = "Deleted dining table successfully", body = StdResponse<DiningTableEntity, String>)
    )
)]
async fn delete_table(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let table: QueryResult<DiningTableEntity> = diesel::delete(dining_tables::table.find(id))
        .returning(DiningTableEntity::as_returning())
        .get_result(conn)
        .await;

    match table {
        Ok(table) => Ok(StdResponse {
            data: Some(table),
            message: Some("Deleted dining table successfully"),
        }),
        Err(DieselError::NotFound) => Err(AppError::NotFound),
        Err(err) => Err(AppError::Other(err.into())),
    }
}

/// Mark a table occupied for walk-ins seated before an order is rung up.
#[utoipa::path(
    patch,
    path = "/{id}/occupy",
    tags = ["Tables"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Table ID to occupy")
    ),
    responses(
        (status = 200, description = "Occupied dining table successfully", body = StdResponse<DiningTableEntity, String>)
    )
)]
async fn occupy_table(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    set_occupancy(state, id, true, "Occupied dining table successfully").await
}

/// Free a table after the party settles and leaves.
#[utoipa::path(
    patch,
    path = "/{id}/release",
    tags = ["Tables"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Table ID to release")
    ),
    responses(
        (status = 200, description = "Released dining table successfully", body = StdResponse<DiningTableEntity, String>)
    )
)]
async fn release_table(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    set_occupancy(state, id, false, "Released dining table successfully").await
}

async fn set_occupancy(
    state: AppState,
    id: i32,
    is_occupied: bool,
    message: &'static str,
) -> Result<StdResponse<DiningTableEntity, &'static str>, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let table: QueryResult<DiningTableEntity> = diesel::update(dining_tables::table.find(id))
        .set((
            dining_tables::is_occupied.eq(is_occupied),
            dining_tables::updated_at.eq(diesel::dsl::now),
        ))
        .returning(DiningTableEntity::as_returning())
        .get_result(conn)
        .await;

    match table {
        Ok(table) => Ok(StdResponse {
            data: Some(table),
            message: Some(message),
        }),
        Err(DieselError::NotFound) => Err(AppError::NotFound),
        Err(err) => Err(AppError::Other(err.into())),
    }
}
