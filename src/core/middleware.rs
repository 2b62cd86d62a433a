use axum::{
    extract::Request,
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

use crate::core::{app_error::AppError, config, security};

/// Authenticated staff identity, injected as a request extension by the
/// authorization middleware.
#[derive(Clone, Debug)]
pub struct CurrentStaff {
    pub id: i32,
    pub role: String,
}

/// Requires a valid bearer token. Every staff role passes.
pub async fn staff_authorization(mut req: Request, next: Next) -> Result<Response, AppError> {
    let staff = authenticate(req.headers())?;
    req.extensions_mut().insert(staff);
    Ok(next.run(req).await)
}

/// Requires a valid bearer token carrying the admin role.
pub async fn admin_authorization(mut req: Request, next: Next) -> Result<Response, AppError> {
    let staff = authenticate(req.headers())?;
    if staff.role != "admin" {
        return Err(AppError::ForbiddenResource(
            "Admin role is required".to_string(),
        ));
    }
    req.extensions_mut().insert(staff);
    Ok(next.run(req).await)
}

fn authenticate(headers: &HeaderMap) -> Result<CurrentStaff, AppError> {
    let header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Authorization header is not a bearer token".to_string()))?;

    let claims = security::validate_token(&config::jwt_secret(), token)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

    Ok(CurrentStaff {
        id: claims.sub,
        role: claims.role,
    })
}
