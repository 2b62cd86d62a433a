use anyhow::{Context, Result};
use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use diesel::{
    ExpressionMethods, QueryDsl, QueryResult, SelectableHelper, result::DatabaseErrorKind,
};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    core::{
        aliases::DieselError,
        app_error::{AppError, StdResponse},
        app_state::AppState,
        middleware::{self, CurrentStaff},
    },
    models::{RoleEntity, UserAccountEntity},
    schema::{roles, users_accounts},
};

/// Staff administration is admin-only; accounts are created through
/// `/api/auth/register`.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new()
        .nest(
            "/staff",
            OpenApiRouter::new()
                .routes(utoipa_axum::routes!(get_staff))
                .routes(utoipa_axum::routes!(get_staff_member))
                .routes(utoipa_axum::routes!(update_staff_member))
                .routes(utoipa_axum::routes!(delete_staff_member))
                .route_layer(axum::middleware::from_fn(middleware::admin_authorization)),
        )
        .nest(
            "/roles",
            OpenApiRouter::new()
                .routes(utoipa_axum::routes!(get_roles))
                .route_layer(axum::middleware::from_fn(middleware::admin_authorization)),
        )
}

#[derive(Serialize, ToSchema)]
struct StaffRow {
    id: i32,
    username: String,
    full_name: String,
    role: String,
}

impl From<(UserAccountEntity, RoleEntity)> for StaffRow {
    fn from((account, role): (UserAccountEntity, RoleEntity)) -> Self {
        Self {
            id: account.id,
            username: account.username,
            full_name: account.full_name,
            role: role.name,
        }
    }
}

/// Fetch all staff accounts.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Staff"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List all staff", body = StdResponse<Vec<StaffRow>, String>)
    )
)]
async fn get_staff(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let rows: Vec<(UserAccountEntity, RoleEntity)> = users_accounts::table
        .inner_join(roles::table)
        .order_by(users_accounts::username.asc())
        .select((UserAccountEntity::as_select(), RoleEntity::as_select()))
        .get_results(conn)
        .await
        .context("Failed to get staff")?;

    let staff: Vec<StaffRow> = rows.into_iter().map(StaffRow::from).collect();

    Ok(StdResponse {
        data: Some(staff),
        message: Some("Get staff successfully"),
    })
}

/// Fetch a specific staff account.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Staff"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Staff ID to fetch")
    ),
    responses(
        (status = 200, description = "Get staff member successfully", body = StdResponse<StaffRow, String>)
    )
)]
async fn get_staff_member(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let row: QueryResult<(UserAccountEntity, RoleEntity)> = users_accounts::table
        .inner_join(roles::table)
        .filter(users_accounts::id.eq(id))
        .select((UserAccountEntity::as_select(), RoleEntity::as_select()))
        .get_result(conn)
        .await;

    match row {
        Ok(row) => Ok(StdResponse {
            data: Some(StaffRow::from(row)),
            message: Some("Get staff member successfully"),
        }),
        Err(DieselError::NotFound) => Err(AppError::NotFound),
        Err(err) => Err(AppError::Other(err.into())),
    }
}

#[derive(Deserialize, ToSchema)]
struct UpdateStaffReq {
    full_name: Option<String>,
    /// Role name to reassign, e.g. `cashier`.
    role: Option<String>,
}

/// Update a staff member's name or role.
#[utoipa::path(
    patch,
    path = "/{id}",
    tags = ["Staff"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Staff ID to update")
    ),
    request_body = UpdateStaffReq,
    responses(
        (status = 200, description = "Updated staff member successfully", body = StdResponse<StaffRow, String>)
    )
)]
async fn update_staff_member(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<UpdateStaffReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let role_id = match body.role {
        Some(role_name) => {
            let role: RoleEntity = roles::table
                .filter(roles::name.eq(&role_name))
                .get_result(conn)
                .await
                .map_err(|_| AppError::BadRequest(format!("{role_name} is not a valid role")))?;
            Some(role.id)
        }
        None => None,
    };

    let updated = match (body.full_name, role_id) {
        (Some(full_name), Some(role_id)) => {
            diesel::update(users_accounts::table.find(id))
                .set((
                    users_accounts::full_name.eq(full_name),
                    users_accounts::role_id.eq(role_id),
                    users_accounts::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)
                .await
        }
        (Some(full_name), None) => {
            diesel::update(users_accounts::table.find(id))
                .set((
                    users_accounts::full_name.eq(full_name),
                    users_accounts::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)
                .await
        }
        (None, Some(role_id)) => {
            diesel::update(users_accounts::table.find(id))
                .set((
                    users_accounts::role_id.eq(role_id),
                    users_accounts::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)
                .await
        }
        (None, None) => {
            return Err(AppError::BadRequest("Nothing to update".to_string()));
        }
    }
    .context("Failed to update staff member")?;

    if updated == 0 {
        return Err(AppError::NotFound);
    }

    let row: (UserAccountEntity, RoleEntity) = users_accounts::table
        .inner_join(roles::table)
        .filter(users_accounts::id.eq(id))
        .select((UserAccountEntity::as_select(), RoleEntity::as_select()))
        .get_result(conn)
        .await
        .context("Failed to reload staff member")?;

    Ok(StdResponse {
        data: Some(StaffRow::from(row)),
        message: Some("Updated staff member successfully"),
    })
}

/// Delete a staff account. The authenticated admin cannot delete themselves,
/// and accounts with recorded sales are kept for reporting.
#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Staff"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Staff ID to delete")
    ),
    responses(
        (status = 200, description = "Deleted staff member successfully", body = StdResponse<StaffRow, String>)
    )
)]
async fn delete_staff_member(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(staff): Extension<CurrentStaff>,
) -> Result<impl IntoResponse, AppError> {
    if staff.id == id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let row: QueryResult<(UserAccountEntity, RoleEntity)> = users_accounts::table
        .inner_join(roles::table)
        .filter(users_accounts::id.eq(id))
        .select((UserAccountEntity::as_select(), RoleEntity::as_select()))
        .get_result(conn)
        .await;

    let row = match row {
        Ok(row) => row,
        Err(DieselError::NotFound) => return Err(AppError::NotFound),
        Err(err) => return Err(AppError::Other(err.into())),
    };

    let deleted = diesel::delete(users_accounts::table.find(id))
        .execute(conn)
        .await;

    match deleted {
        Ok(_) => Ok(StdResponse {
            data: Some(StaffRow::from(row)),
            message: Some("Deleted staff member successfully"),
        }),
        Err(DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)) => {
            Err(AppError::BadRequest(
                "Staff member has recorded sales and cannot be deleted".to_string(),
            ))
        }
        Err(err) => Err(AppError::Other(err.into())),
    }
}

/// Fetch the assignable roles.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Staff"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List all roles", body = StdResponse<Vec<RoleEntity>, String>)
    )
)]
async fn get_roles(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let role_rows: Vec<RoleEntity> = roles::table
        .order_by(roles::name.asc())
        .get_results(conn)
        .await
        .context("Failed to get roles")?;

    Ok(StdResponse {
        data: Some(role_rows),
        message: Some("Get roles successfully"),
    })
}
