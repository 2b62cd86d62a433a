use std::collections::HashMap;

use anyhow::{Context, Result};
use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use diesel::{ExpressionMethods, QueryDsl, QueryResult, SelectableHelper};
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
        config,
        middleware::{self, CurrentStaff},
    },
    models::{
        CreateOrderEntity, CreateOrderItemEntity, MenuIngredientEntity, MenuItemEntity,
        OrderEntity, OrderItemEntity,
    },
    pricing,
    schema::{dining_tables, ingredients, menu_ingredients, menu_items, order_items, orders},
};

const PAYMENT_METHODS: [&str; 3] = ["cash", "card", "e_wallet"];

/// Cash amounts arrive rounded to the displayed total, so allow a half-cent
/// of float drift before calling a payment short.
const PAYMENT_TOLERANCE: f32 = 0.005;

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/orders",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_orders))
            .routes(utoipa_axum::routes!(create_order))
            .routes(utoipa_axum::routes!(get_order))
            .route_layer(axum::middleware::from_fn(middleware::staff_authorization)),
    )
}

#[derive(Deserialize, ToSchema)]
struct CreateOrderReq {
    items: Vec<CreateOrderReqItem>,
    payment_method: String,
    amount_paid: f32,
    table_id: Option<i32>,
}

#[derive(Deserialize, ToSchema)]
struct CreateOrderReqItem {
    menu_item_id: i32,
    quantity: i32,
}

#[derive(Serialize, ToSchema)]
struct CreateOrderRes {
    order: OrderEntity,
    order_items: Vec<OrderItemEntity>,
    availability: SyncReport,
}

/// Place and settle an order: price the cart, record the payment, snapshot
/// the lines, consume ingredient stock and re-sync menu availability, all in
/// one transaction.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    request_body = CreateOrderReq,
    responses(
        (status = 200, description = "Created order successfully", body = StdResponse<CreateOrderRes, String>),
        (status = 400, description = "Empty cart, unavailable item, unknown payment method or short payment")
    )
)]
async fn create_order(
    State(state): State<AppState>,
    Extension(staff): Extension<CurrentStaff>,
    Json(body): Json<CreateOrderReq>,
) -> Result<impl IntoResponse, AppError> {
    if body.items.is_empty() {
        return Err(AppError::BadRequest(
            "Order must contain at least one item".to_string(),
        ));
    }
    if body.items.iter().any(|item| item.quantity <= 0) {
        return Err(AppError::BadRequest(
            "Item quantities must be positive".to_string(),
        ));
    }
    if !PAYMENT_METHODS.contains(&body.payment_method.as_str()) {
        return Err(AppError::BadRequest(format!(
            "{} is not a valid payment method",
            body.payment_method
        )));
    }

    // Collapse duplicate lines so the composite order_items key holds.
    let mut quantities: HashMap<i32, i32> = HashMap::new();
    for item in &body.items {
        *quantities.entry(item.menu_item_id).or_default() += item.quantity;
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let placed_by = staff.id;
    let (order, placed_items, report) = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let ordered_ids: Vec<i32> = quantities.keys().copied().collect();

                let menu_rows: Vec<MenuItemEntity> = menu_items::table
                    .filter(menu_items::id.eq_any(&ordered_ids))
                    .get_results(conn)
                    .await
                    .context("Failed to get menu items")?;

                if menu_rows.len() != ordered_ids.len() {
                    return Err(AppError::BadRequest(
                        "Order references an unknown menu item".to_string(),
                    ));
                }
                if let Some(unavailable) = menu_rows.iter().find(|item| !item.is_available) {
                    return Err(AppError::BadRequest(format!(
                        "{} is not available",
                        unavailable.name
                    )));
                }

                let priced_lines: Vec<(f32, i32)> = menu_rows
                    .iter()
                    .map(|item| (item.price, quantities.get(&item.id).copied().unwrap_or(0)))
                    .collect();
                let totals = pricing::order_totals(&priced_lines, config::tax_rate());

                if totals.total - body.amount_paid > PAYMENT_TOLERANCE {
                    return Err(AppError::BadRequest(format!(
                        "Amount paid {:.2} does not cover the total {:.2}",
                        body.amount_paid, totals.total
                    )));
                }

                if let Some(table_id) = body.table_id {
                    let occupied = diesel::update(dining_tables::table.find(table_id))
                        .set((
                            dining_tables::is_occupied.eq(true),
                            dining_tables::updated_at.eq(diesel::dsl::now),
                        ))
                        .execute(conn)
                        .await
                        .context("Failed to occupy dining table")?;
                    if occupied == 0 {
                        return Err(AppError::BadRequest(format!(
                            "{table_id} is not a known dining table"
                        )));
                    }
                }

                let order: OrderEntity = diesel::insert_into(orders::table)
                    .values(CreateOrderEntity {
                        subtotal: totals.subtotal,
                        tax: totals.tax,
                        amount: totals.total,
                        amount_paid: body.amount_paid,
                        change: pricing::change_due(body.amount_paid, totals.total),
                        payment_method: body.payment_method,
                        table_id: body.table_id,
                        placed_by,
                    })
                    .returning(OrderEntity::as_returning())
                    .get_result(conn)
                    .await
                    .context("Failed to create order")?;

                let line_values: Vec<CreateOrderItemEntity> = menu_rows
                    .iter()
                    .map(|item| CreateOrderItemEntity {
                        order_id: order.id,
                        menu_item_id: item.id,
                        quantity: quantities.get(&item.id).copied().unwrap_or(0),
                        unit_price: item.price,
                    })
                    .collect();

                let placed_items: Vec<OrderItemEntity> =
                    diesel::insert_into(order_items::table)
                        .values(line_values)
                        .returning(OrderItemEntity::as_returning())
                        .get_results(conn)
                        .await
                        .context("Failed to create order items")?;

                consume_stock(conn, &quantities).await?;
                let report = availability::sync_menu_availability(conn).await?;

                Ok::<(OrderEntity, Vec<OrderItemEntity>, SyncReport), AppError>((
                    order,
                    placed_items,
                    report,
                ))
            })
        })
        .await?;

    tracing::info!(
        "Order #{} settled: {:.2} via {}",
        order.id,
        order.amount,
        order.payment_method
    );

    Ok(StdResponse {
        data: Some(CreateOrderRes {
            order,
            order_items: placed_items,
            availability: report,
        }),
        message: Some("Created order successfully"),
    })
}

/// Subtracts the recipe requirements of the ordered quantities from stock,
/// flooring at zero.
async fn consume_stock(
    conn: &mut diesel_async::AsyncPgConnection,
    quantities: &HashMap<i32, i32>,
) -> Result<(), AppError> {
    let ordered_ids: Vec<i32> = quantities.keys().copied().collect();

    let recipe_lines: Vec<MenuIngredientEntity> = menu_ingredients::table
        .filter(menu_ingredients::menu_item_id.eq_any(&ordered_ids))
        .get_results(conn)
        .await
        .context("Failed to get recipe lines")?;

    let mut needed: HashMap<i32, f32> = HashMap::new();
    for line in recipe_lines {
        let portions = quantities.get(&line.menu_item_id).copied().unwrap_or(0);
        *needed.entry(line.ingredient_id).or_default() += line.quantity * portions as f32;
    }

    if needed.is_empty() {
        return Ok(());
    }

    let ingredient_ids: Vec<i32> = needed.keys().copied().collect();
    let stocks: Vec<(i32, f32)> = ingredients::table
        .filter(ingredients::id.eq_any(&ingredient_ids))
        .select((ingredients::id, ingredients::stock))
        .get_results(conn)
        .await
        .context("Failed to get ingredient stocks")?;

    for (ingredient_id, stock) in stocks {
        let new_stock = (stock - needed.get(&ingredient_id).copied().unwrap_or(0.0)).max(0.0);
        diesel::update(ingredients::table.find(ingredient_id))
            .set((
                ingredients::stock.eq(new_stock),
                ingredients::updated_at.eq(diesel::dsl::now),
            ))
            .execute(conn)
            .await
            .context("Failed to consume stock")?;
    }

    Ok(())
}

#[derive(Serialize, ToSchema)]
struct GetOrderRes {
    order: OrderEntity,
    order_items: Vec<OrderItemEntity>,
}

/// Fetch a specific order with its lines.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Order ID to fetch")
    ),
    responses(
        (status = 200, description = "Get order successfully", body = StdResponse<GetOrderRes, String>)
    )
)]
async fn get_order(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let order: QueryResult<OrderEntity> = orders::table.find(id).get_result(conn).await;

    let order = match order {
        Ok(order) => order,
        Err(DieselError::NotFound) => return Err(AppError::NotFound),
        Err(err) => return Err(AppError::Other(err.into())),
    };

    let lines: Vec<OrderItemEntity> = order_items::table
        .filter(order_items::order_id.eq(order.id))
        .get_results(conn)
        .await
        .context("Failed to get order items")?;

    Ok(StdResponse {
        data: Some(GetOrderRes {
            order,
            order_items: lines,
        }),
        message: Some("Get order successfully"),
    })
}

/// Fetch all orders, newest first, with their lines.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List all orders", body = StdResponse<Vec<GetOrderRes>, String>)
    )
)]
async fn get_orders(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let order_rows: Vec<OrderEntity> = orders::table
        .order_by(orders::created_at.desc())
        .get_results(conn)
        .await
        .context("Failed to get orders")?;

    let order_ids: Vec<i32> = order_rows.iter().map(|order| order.id).collect();
    let lines: Vec<OrderItemEntity> = order_items::table
        .filter(order_items::order_id.eq_any(&order_ids))
        .get_results(conn)
        .await
        .context("Failed to get order items")?;

    let mut group: HashMap<i32, Vec<OrderItemEntity>> = HashMap::new();
    for line in lines {
        group.entry(line.order_id).or_default().push(line);
    }

    let orders_with_items: Vec<GetOrderRes> = order_rows
        .into_iter()
        .map(|order| {
            let order_items = group.remove(&order.id).unwrap_or_default();
            GetOrderRes { order, order_items }
        })
        .collect();

    Ok(StdResponse {
        data: Some(orders_with_items),
        message: Some("Get orders successfully"),
    })
}
