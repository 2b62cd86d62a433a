use anyhow::{Context, Result};
use axum::{Extension, Json, extract::State, response::IntoResponse};
use diesel::{ExpressionMethods, QueryDsl, QueryResult, SelectableHelper};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    core::{
        aliases::DieselError,
        app_error::{AppError, StdResponse},
        app_state::AppState,
        config,
        middleware::{self, CurrentStaff},
        security,
    },
    models::{CreateUserAccountEntity, RoleEntity, UserAccountEntity},
    schema::{roles, users_accounts},
};

/// Defines the authentication routes. Login and registration are public;
/// `/me` requires a bearer token.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/api/auth",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(login))
            .routes(utoipa_axum::routes!(register))
            .merge(
                OpenApiRouter::new()
                    .routes(utoipa_axum::routes!(me))
                    .route_layer(axum::middleware::from_fn(middleware::staff_authorization)),
            ),
    )
}

/// Navigation sections a role is entitled to reach.
pub fn navigation_for_role(role: &str) -> Vec<&'static str> {
    match role {
        "admin" => vec![
            "dashboard",
            "orders",
            "tables",
            "menu",
            "categories",
            "inventory",
            "staff",
            "reports",
        ],
        _ => vec!["dashboard", "orders", "tables", "menu"],
    }
}

#[derive(Serialize, ToSchema)]
pub struct StaffProfile {
    pub id: i32,
    pub username: String,
    pub full_name: String,
    pub role: String,
    pub navigation: Vec<String>,
}

impl StaffProfile {
    fn from_account(account: UserAccountEntity, role: RoleEntity) -> Self {
        let navigation = navigation_for_role(&role.name)
            .into_iter()
            .map(String::from)
            .collect();
        Self {
            id: account.id,
            username: account.username,
            full_name: account.full_name,
            role: role.name,
            navigation,
        }
    }
}

#[derive(Deserialize, ToSchema)]
struct LoginReq {
    username: String,
    password: String,
}

#[derive(Serialize, ToSchema)]
struct LoginRes {
    token: String,
    user: StaffProfile,
}

/// Verify credentials and issue a bearer token.
#[utoipa::path(
    post,
    path = "/login",
    tags = ["Auth"],
    request_body = LoginReq,
    responses(
        (status = 200, description = "Logged in successfully", body = StdResponse<LoginRes, String>),
        (status = 401, description = "Invalid credentials")
    )
)]
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let account: QueryResult<(UserAccountEntity, RoleEntity)> = users_accounts::table
        .inner_join(roles::table)
        .filter(users_accounts::username.eq(&body.username))
        .select((UserAccountEntity::as_select(), RoleEntity::as_select()))
        .get_result(conn)
        .await;

    let (account, role) = match account {
        Ok(found) => found,
        Err(DieselError::NotFound) => {
            return Err(AppError::Unauthorized(
                "Invalid username or password".to_string(),
            ));
        }
        Err(err) => return Err(AppError::Other(err.into())),
    };

    let verified = security::verify_password(&body.password, &account.password_hash)?;
    if !verified {
        return Err(AppError::Unauthorized(
            "Invalid username or password".to_string(),
        ));
    }

    let token = security::generate_token(
        &config::jwt_secret(),
        account.id,
        &role.name,
        config::token_ttl_seconds(),
    )?;

    Ok(StdResponse {
        data: Some(LoginRes {
            token,
            user: StaffProfile::from_account(account, role),
        }),
        message: Some("Logged in successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct RegisterReq {
    username: String,
    password: String,
    full_name: String,
    /// Role name, defaults to `cashier`.
    role: Option<String>,
}

/// Create a staff account.
#[utoipa::path(
    post,
    path = "/register",
    tags = ["Auth"],
    request_body = RegisterReq,
    responses(
        (status = 200, description = "Registered successfully", body = StdResponse<StaffProfile, String>),
        (status = 400, description = "Duplicate username or invalid payload")
    )
)]
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterReq>,
) -> Result<impl IntoResponse, AppError> {
    if body.username.trim().is_empty() {
        return Err(AppError::BadRequest("Username must not be empty".to_string()));
    }
    if body.password.len() < 8 {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let taken: i64 = users_accounts::table
        .filter(users_accounts::username.eq(&body.username))
        .count()
        .get_result(conn)
        .await
        .context("Failed to check username")?;

    if taken > 0 {
        return Err(AppError::BadRequest(
            "Username is already taken".to_string(),
        ));
    }

    let role_name = body.role.unwrap_or("cashier".to_string());
    let role: RoleEntity = roles::table
        .filter(roles::name.eq(&role_name))
        .get_result(conn)
        .await
        .map_err(|_| AppError::BadRequest(format!("{role_name} is not a valid role")))?;

    let password_hash = security::hash_password(&body.password)?;

    let account: UserAccountEntity = diesel::insert_into(users_accounts::table)
        .values(CreateUserAccountEntity {
            username: body.username,
            password_hash,
            full_name: body.full_name,
            role_id: role.id,
        })
        .returning(UserAccountEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create staff account")?;

    Ok(StdResponse {
        data: Some(StaffProfile::from_account(account, role)),
        message: Some("Registered successfully"),
    })
}

/// Fetch the authenticated staff member's profile and navigation.
#[utoipa::path(
    get,
    path = "/me",
    tags = ["Auth"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Current staff profile", body = StdResponse<StaffProfile, String>)
    )
)]
async fn me(
    State(state): State<AppState>,
    Extension(staff): Extension<CurrentStaff>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let account: QueryResult<(UserAccountEntity, RoleEntity)> = users_accounts::table
        .inner_join(roles::table)
        .filter(users_accounts::id.eq(staff.id))
        .select((UserAccountEntity::as_select(), RoleEntity::as_select()))
        .get_result(conn)
        .await;

    match account {
        Ok((account, role)) => Ok(StdResponse {
            data: Some(StaffProfile::from_account(account, role)),
            message: Some("Get profile successfully"),
        }),
        Err(DieselError::NotFound) => Err(AppError::NotFound),
        Err(err) => Err(AppError::Other(err.into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_reaches_every_section() {
        let nav = navigation_for_role("admin");
        assert!(nav.contains(&"staff"));
        assert!(nav.contains(&"reports"));
        assert!(nav.contains(&"inventory"));
    }

    #[test]
    fn cashier_is_limited_to_the_sales_floor() {
        let nav = navigation_for_role("cashier");
        assert!(nav.contains(&"orders"));
        assert!(nav.contains(&"tables"));
        assert!(!nav.contains(&"staff"));
        assert!(!nav.contains(&"reports"));
    }

    #[test]
    fn unknown_roles_get_the_restricted_set() {
        assert_eq!(navigation_for_role("dishwasher"), navigation_for_role("cashier"));
    }
}
