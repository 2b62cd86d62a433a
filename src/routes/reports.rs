use std::collections::HashMap;

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use diesel::{ExpressionMethods, QueryDsl};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    core::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        config, middleware,
    },
    models::{IngredientEntity, OrderEntity, OrderItemEntity},
    schema::{dining_tables, ingredients, menu_items, order_items, orders},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/reports",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_dashboard))
            .routes(utoipa_axum::routes!(get_sales))
            .routes(utoipa_axum::routes!(get_eod))
            .route_layer(axum::middleware::from_fn(middleware::staff_authorization)),
    )
}

fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
    (start, start + Duration::days(1))
}

#[derive(Serialize, ToSchema)]
struct DashboardRes {
    orders_today: usize,
    gross_today: f32,
    tax_today: f32,
    unavailable_menu_items: i64,
    occupied_tables: i64,
    low_stock_ingredients: Vec<IngredientEntity>,
}

/// Today's headline numbers for the dashboard page.
#[utoipa::path(
    get,
    path = "/dashboard",
    tags = ["Reports"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Dashboard metrics", body = StdResponse<DashboardRes, String>)
    )
)]
async fn get_dashboard(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let (start, end) = day_bounds(Utc::now().date_naive());

    let today: Vec<OrderEntity> = orders::table
        .filter(orders::created_at.ge(start))
        .filter(orders::created_at.lt(end))
        .get_results(conn)
        .await
        .context("Failed to get today's orders")?;

    let unavailable_menu_items: i64 = menu_items::table
        .filter(menu_items::is_available.eq(false))
        .count()
        .get_result(conn)
        .await
        .context("Failed to count unavailable menu items")?;

    let occupied_tables: i64 = dining_tables::table
        .filter(dining_tables::is_occupied.eq(true))
        .count()
        .get_result(conn)
        .await
        .context("Failed to count occupied tables")?;

    let low_stock_ingredients: Vec<IngredientEntity> = ingredients::table
        .filter(ingredients::stock.le(config::low_stock_threshold()))
        .order_by(ingredients::stock.asc())
        .get_results(conn)
        .await
        .context("Failed to get low-stock ingredients")?;

    Ok(StdResponse {
        data: Some(DashboardRes {
            orders_today: today.len(),
            gross_today: today.iter().map(|order| order.amount).sum(),
            tax_today: today.iter().map(|order| order.tax).sum(),
            unavailable_menu_items,
            occupied_tables,
            low_stock_ingredients,
        }),
        message: Some("Get dashboard successfully"),
    })
}

#[derive(Deserialize, IntoParams)]
struct SalesRangeQuery {
    /// First day of the range, inclusive.
    from: NaiveDate,
    /// Last day of the range, inclusive.
    to: NaiveDate,
}

#[derive(Serialize, ToSchema)]
struct SalesDayRes {
    date: NaiveDate,
    orders: usize,
    gross: f32,
    tax: f32,
}

/// Per-day sales over a date range.
#[utoipa::path(
    get,
    path = "/sales",
    tags = ["Reports"],
    security(("bearerAuth" = [])),
    params(SalesRangeQuery),
    responses(
        (status = 200, description = "Per-day sales", body = StdResponse<Vec<SalesDayRes>, String>)
    )
)]
async fn get_sales(
    Query(range): Query<SalesRangeQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    if range.from > range.to {
        return Err(AppError::BadRequest(
            "Range start must not be after range end".to_string(),
        ));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let (start, _) = day_bounds(range.from);
    let (_, end) = day_bounds(range.to);

    let rows: Vec<OrderEntity> = orders::table
        .filter(orders::created_at.ge(start))
        .filter(orders::created_at.lt(end))
        .get_results(conn)
        .await
        .context("Failed to get orders in range")?;

    let mut days: HashMap<NaiveDate, SalesDayRes> = HashMap::new();
    for order in rows {
        let date = order.created_at.date_naive();
        let day = days.entry(date).or_insert(SalesDayRes {
            date,
            orders: 0,
            gross: 0.0,
            tax: 0.0,
        });
        day.orders += 1;
        day.gross += order.amount;
        day.tax += order.tax;
    }

    let mut report: Vec<SalesDayRes> = days.into_values().collect();
    report.sort_by_key(|day| day.date);

    Ok(StdResponse {
        data: Some(report),
        message: Some("Get sales report successfully"),
    })
}

#[derive(Deserialize, IntoParams)]
struct EodQuery {
    /// Business day to close out.
    date: NaiveDate,
}

#[derive(Serialize, ToSchema)]
struct PaymentMethodTakings {
    payment_method: String,
    orders: usize,
    amount: f32,
}

#[derive(Serialize, ToSchema)]
struct ItemSales {
    menu_item_id: i32,
    name: String,
    quantity_sold: i32,
    gross: f32,
}

#[derive(Serialize, ToSchema)]
struct EodRes {
    date: NaiveDate,
    orders: usize,
    gross: f32,
    tax_collected: f32,
    by_payment_method: Vec<PaymentMethodTakings>,
    items_sold: Vec<ItemSales>,
}

/// End-of-day closeout for one business day.
#[utoipa::path(
    get,
    path = "/eod",
    tags = ["Reports"],
    security(("bearerAuth" = [])),
    params(EodQuery),
    responses(
        (status = 200, description = "End-of-day report", body = StdResponse<EodRes, String>)
    )
)]
async fn get_eod(
    Query(query): Query<EodQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let (start, end) = day_bounds(query.date);

    let day_orders: Vec<OrderEntity> = orders::table
        .filter(orders::created_at.ge(start))
        .filter(orders::created_at.lt(end))
        .get_results(conn)
        .await
        .context("Failed to get the day's orders")?;

    let order_ids: Vec<i32> = day_orders.iter().map(|order| order.id).collect();
    let lines: Vec<OrderItemEntity> = order_items::table
        .filter(order_items::order_id.eq_any(&order_ids))
        .get_results(conn)
        .await
        .context("Failed to get the day's order items")?;

    let item_ids: Vec<i32> = lines.iter().map(|line| line.menu_item_id).collect();
    let names: HashMap<i32, String> = menu_items::table
        .filter(menu_items::id.eq_any(&item_ids))
        .select((menu_items::id, menu_items::name))
        .get_results::<(i32, String)>(conn)
        .await
        .context("Failed to get menu item names")?
        .into_iter()
        .collect();

    let mut takings: HashMap<String, PaymentMethodTakings> = HashMap::new();
    for order in &day_orders {
        let entry = takings
            .entry(order.payment_method.clone())
            .or_insert(PaymentMethodTakings {
                payment_method: order.payment_method.clone(),
                orders: 0,
                amount: 0.0,
            });
        entry.orders += 1;
        entry.amount += order.amount;
    }

    let mut sold: HashMap<i32, ItemSales> = HashMap::new();
    for line in &lines {
        let entry = sold.entry(line.menu_item_id).or_insert(ItemSales {
            menu_item_id: line.menu_item_id,
            name: names
                .get(&line.menu_item_id)
                .cloned()
                .unwrap_or("(removed item)".to_string()),
            quantity_sold: 0,
            gross: 0.0,
        });
        entry.quantity_sold += line.quantity;
        entry.gross += line.unit_price * line.quantity as f32;
    }

    let mut by_payment_method: Vec<PaymentMethodTakings> = takings.into_values().collect();
    by_payment_method.sort_by(|a, b| a.payment_method.cmp(&b.payment_method));

    let mut items_sold: Vec<ItemSales> = sold.into_values().collect();
    items_sold.sort_by(|a, b| b.quantity_sold.cmp(&a.quantity_sold));

    Ok(StdResponse {
        data: Some(EodRes {
            date: query.date,
            orders: day_orders.len(),
            gross: day_orders.iter().map(|order| order.amount).sum(),
            tax_collected: day_orders.iter().map(|order| order.tax).sum(),
            by_payment_method,
            items_sold,
        }),
        message: Some("Get end-of-day report successfully"),
    })
}
