use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::jwt::validate_token;

// Middleware for authentication
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    if !auth_value.starts_with("Bearer ") {
        return Err(AppError::Auth("Invalid authorization header format".to_string()));
    }

    let token = &auth_value[7..];

    let user = validate_token(token, &config.jwt_secret).map_err(AppError::Auth)?;

    // Add user to request extensions
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Role guard used at the top of handlers that are restricted to one role.
pub fn ensure_role(user: &User, role: &str) -> Result<(), AppError> {
    if user.has_role(role) {
        Ok(())
    } else {
        Err(AppError::Auth(format!("Requires {} role", role)))
    }
}

/// Guard for handlers shared between roles.
pub fn ensure_any_role(user: &User, roles: &[&str]) -> Result<(), AppError> {
    if roles.iter().any(|role| user.has_role(role)) {
        Ok(())
    } else {
        Err(AppError::Auth(format!(
            "Requires one of the roles: {}",
            roles.join(", ")
        )))
    }
}
