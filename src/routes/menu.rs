use anyhow::{Context, Result};
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use diesel::{
    AsChangeset, ExpressionMethods, QueryDsl, QueryResult, SelectableHelper,
    result::DatabaseErrorKind,
};
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    availability::{self, SyncReport},
    core::{
        aliases::DieselError,
        app_error::{AppError, StdResponse},
        app_state::AppState,
        middleware,
    },
    models::{CreateMenuItemEntity, MenuItemEntity},
    schema::{categories, ingredients, menu_ingredients, menu_items},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/menu-items",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_menu_items))
            .routes(utoipa_axum::routes!(create_menu_item))
            .routes(utoipa_axum::routes!(sync_availability))
            .routes(utoipa_axum::routes!(get_menu_item))
            .routes(utoipa_axum::routes!(update_menu_item))
            .routes(utoipa_axum::routes!(delete_menu_item))
            .routes(utoipa_axum::routes!(replace_recipe))
            .route_layer(axum::middleware::from_fn(middleware::staff_authorization)),
    )
}

#[derive(Deserialize, IntoParams)]
struct MenuItemFilter {
    /// Restrict the listing to one category.
    category_id: Option<i32>,
}

/// Fetch menu items, optionally filtered by category.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Menu"],
    security(("bearerAuth" = [])),
    params(MenuItemFilter),
    responses(
        (status = 200, description = "List menu items", body = StdResponse<Vec<MenuItemEntity>, String>)
    )
)]
async fn get_menu_items(
    Query(filter): Query<MenuItemFilter>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let mut query = menu_items::table.into_boxed();
    if let Some(category_id) = filter.category_id {
        query = query.filter(menu_items::category_id.eq(category_id));
    }

    let items: Vec<MenuItemEntity> = query
        .order_by(menu_items::name.asc())
        .get_results(conn)
        .await
        .context("Failed to get menu items")?;

    Ok(StdResponse {
        data: Some(items),
        message: Some("Get menu items successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct CreateMenuItemReq {
    name: String,
    price: f32,
    /// Undiscounted price; defaults to `price`.
    regular_price: Option<f32>,
    category_id: Option<i32>,
    image_url: Option<String>,
}

/// Create a menu item. New items start unavailable until a recipe is set and
/// availability is synced.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Menu"],
    security(("bearerAuth" = [])),
    request_body = CreateMenuItemReq,
    responses(
        (status = 200, description = "Created menu item successfully", body = StdResponse<MenuItemEntity, String>)
    )
)]
async fn create_menu_item(
    State(state): State<AppState>,
    Json(body): Json<CreateMenuItemReq>,
) -> Result<impl IntoResponse, AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::BadRequest("Menu item name must not be empty".to_string()));
    }
    if body.price <= 0.0 {
        return Err(AppError::BadRequest("Price must be positive".to_string()));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    if let Some(category_id) = body.category_id {
        let known: i64 = categories::table
            .find(category_id)
            .count()
            .get_result(conn)
            .await
            .context("Failed to check category")?;
        if known == 0 {
            return Err(AppError::BadRequest(format!(
                "{category_id} is not a known category"
            )));
        }
    }

    let item: MenuItemEntity = diesel::insert_into(menu_items::table)
        .values(CreateMenuItemEntity {
            name: body.name,
            price: body.price,
            regular_price: body.regular_price.unwrap_or(body.price),
            category_id: body.category_id,
            image_url: body.image_url,
        })
        .returning(MenuItemEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create menu item")?;

    Ok(StdResponse {
        data: Some(item),
        message: Some("Created menu item successfully"),
    })
}

#[derive(Serialize, ToSchema)]
struct RecipeLineRes {
    ingredient_id: i32,
    ingredient_name: String,
    unit: String,
    quantity: f32,
    stock: f32,
}

#[derive(Serialize, ToSchema)]
struct GetMenuItemRes {
    menu_item: MenuItemEntity,
    recipe: Vec<RecipeLineRes>,
}

/// Fetch a menu item together with its recipe.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Menu"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Menu item ID to fetch")
    ),
    responses(
        (status = 200, description = "Get menu item successfully", body = StdResponse<GetMenuItemRes, String>)
    )
)]
async fn get_menu_item(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let item: QueryResult<MenuItemEntity> = menu_items::table.find(id).get_result(conn).await;

    let item = match item {
        Ok(item) => item,
        Err(DieselError::NotFound) => return Err(AppError::NotFound),
        Err(err) => return Err(AppError::Other(err.into())),
    };

    let recipe = fetch_recipe(conn, item.id).await?;

    Ok(StdResponse {
        data: Some(GetMenuItemRes {
            menu_item: item,
            recipe,
        }),
        message: Some("Get menu item successfully"),
    })
}

#[derive(AsChangeset, Deserialize, ToSchema)]
#[diesel(table_name = crate::schema::menu_items)]
struct UpdateMenuItemReq {
    name: Option<String>,
    price: Option<f32>,
    regular_price: Option<f32>,
    category_id: Option<i32>,
    image_url: Option<String>,
}

/// Update a menu item's listing fields.
#[utoipa::path(
    patch,
    path = "/{id}",
    tags = ["Menu"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Menu item ID to update")
    ),
    request_body = UpdateMenuItemReq,
    responses(
        (status = 200, description = "Updated menu item successfully", body = StdResponse<MenuItemEntity, String>)
    )
)]
async fn update_menu_item(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<UpdateMenuItemReq>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(price) = body.price {
        if price <= 0.0 {
            return Err(AppError::BadRequest("Price must be positive".to_string()));
        }
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let item: QueryResult<MenuItemEntity> = diesel::update(menu_items::table.find(id))
        .set((body, menu_items::updated_at.eq(diesel::dsl::now)))
        .returning(MenuItemEntity::as_returning())
        .get_result(conn)
        .await;

    match item {
        Ok(item) => Ok(StdResponse {
            data: Some(item),
            message: Some("Updated menu item successfully"),
        }),
        Err(DieselError::NotFound) => Err(AppError::NotFound),
        Err(err) => Err(AppError::Other(err.into())),
    }
}

/// Delete a menu item. Items that already appear on orders are kept for
/// reporting and cannot be removed.
#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Menu"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Menu item ID to delete")
    ),
    responses(
        (status = 200, description = "Deleted menu item successfully", body = StdResponse<MenuItemEntity, String>)
    )
)]
async fn delete_menu_item(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let item: QueryResult<MenuItemEntity> = diesel::delete(menu_items::table.find(id))
        .returning(MenuItemEntity::as_returning())
        .get_result(conn)
        .await;

    match item {
        Ok(item) => Ok(StdResponse {
            data: Some(item),
            message: Some("Deleted menu item successfully"),
        }),
        Err(DieselError::NotFound) => Err(AppError::NotFound),
        Err(DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)) => {
            Err(AppError::BadRequest(
                "Menu item has recorded sales and cannot be deleted".to_string(),
            ))
        }
        Err(err) => Err(AppError::Other(err.into())),
    }
}

#[derive(Deserialize, ToSchema)]
struct ReplaceRecipeReq {
    lines: Vec<ReplaceRecipeReqLine>,
}

#[derive(Deserialize, ToSchema)]
struct ReplaceRecipeReqLine {
    ingredient_id: i32,
    quantity: f32,
}

#[derive(Serialize, ToSchema)]
struct ReplaceRecipeRes {
    menu_item: MenuItemEntity,
    recipe: Vec<RecipeLineRes>,
    availability: SyncReport,
}

/// Replace a menu item's recipe: lines absent from the payload are deleted,
/// the rest are upserted. Availability is re-synced afterwards.
#[utoipa::path(
    put,
    path = "/{id}/recipe",
    tags = ["Menu"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Menu item ID whose recipe to replace")
    ),
    request_body = ReplaceRecipeReq,
    responses(
        (status = 200, description = "Replaced recipe successfully", body = StdResponse<ReplaceRecipeRes, String>)
    )
)]
async fn replace_recipe(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<ReplaceRecipeReq>,
) -> Result<impl IntoResponse, AppError> {
    if body.lines.iter().any(|line| line.quantity <= 0.0) {
        return Err(AppError::BadRequest(
            "Recipe quantities must be positive".to_string(),
        ));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let item = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let known: i64 = menu_items::table
                    .find(id)
                    .count()
                    .get_result(conn)
                    .await
                    .context("Failed to check menu item")?;
                if known == 0 {
                    return Err(AppError::NotFound);
                }

                let new_ingredient_ids: Vec<i32> =
                    body.lines.iter().map(|line| line.ingredient_id).collect();

                let known_ingredients: i64 = ingredients::table
                    .filter(ingredients::id.eq_any(&new_ingredient_ids))
                    .count()
                    .get_result(conn)
                    .await
                    .context("Failed to check ingredients")?;
                if known_ingredients as usize != new_ingredient_ids.len() {
                    return Err(AppError::BadRequest(
                        "Recipe references an unknown ingredient".to_string(),
                    ));
                }

                diesel::delete(
                    menu_ingredients::table
                        .filter(menu_ingredients::menu_item_id.eq(id))
                        .filter(menu_ingredients::ingredient_id.ne_all(&new_ingredient_ids)),
                )
                .execute(conn)
                .await
                .context("Failed to delete recipe lines")?;

                for line in &body.lines {
                    diesel::insert_into(menu_ingredients::table)
                        .values((
                            menu_ingredients::menu_item_id.eq(id),
                            menu_ingredients::ingredient_id.eq(line.ingredient_id),
                            menu_ingredients::quantity.eq(line.quantity),
                        ))
                        .on_conflict((
                            menu_ingredients::menu_item_id,
                            menu_ingredients::ingredient_id,
                        ))
                        .do_update()
                        .set((
                            menu_ingredients::quantity.eq(line.quantity),
                            menu_ingredients::updated_at.eq(diesel::dsl::now),
                        ))
                        .execute(conn)
                        .await
                        .context("Failed to upsert recipe line")?;
                }

                let report = availability::sync_menu_availability(conn).await?;

                let item: MenuItemEntity = menu_items::table
                    .find(id)
                    .get_result(conn)
                    .await
                    .context("Failed to reload menu item")?;

                Ok::<(MenuItemEntity, SyncReport), AppError>((item, report))
            })
        })
        .await;

    let (item, report) = match item {
        Ok(result) => result,
        Err(err) => return Err(err),
    };

    let recipe = fetch_recipe(conn, item.id).await?;

    Ok(StdResponse {
        data: Some(ReplaceRecipeRes {
            menu_item: item,
            recipe,
            availability: report,
        }),
        message: Some("Replaced recipe successfully"),
    })
}

/// Recompute every menu item's availability from recipes and stock.
#[utoipa::path(
    post,
    path = "/sync-availability",
    tags = ["Menu"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Synced availability successfully", body = StdResponse<SyncReport, String>)
    )
)]
async fn sync_availability(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let report = availability::sync_menu_availability(conn).await?;

    Ok(StdResponse {
        data: Some(report),
        message: Some("Synced availability successfully"),
    })
}

async fn fetch_recipe(
    conn: &mut diesel_async::AsyncPgConnection,
    menu_item_id: i32,
) -> Result<Vec<RecipeLineRes>, AppError> {
    let rows: Vec<(i32, f32, String, String, f32)> = menu_ingredients::table
        .inner_join(ingredients::table)
        .filter(menu_ingredients::menu_item_id.eq(menu_item_id))
        .select((
            menu_ingredients::ingredient_id,
            menu_ingredients::quantity,
            ingredients::name,
            ingredients::unit,
            ingredients::stock,
        ))
        .order_by(ingredients::name.asc())
        .get_results(conn)
        .await
        .context("Failed to get recipe lines")?;

    Ok(rows
        .into_iter()
        .map(
            |(ingredient_id, quantity, ingredient_name, unit, stock)| RecipeLineRes {
                ingredient_id,
                ingredient_name,
                unit,
                quantity,
                stock,
            },
        )
        .collect())
}
