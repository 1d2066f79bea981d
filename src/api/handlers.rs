//! HTTP request handlers.

use axum::{extract::State, Extension, Json};
use serde_json::Value;

use crate::api::types::*;
use crate::auth::Principal;
use crate::error::{AppError, AppResult};
use crate::AppState;

/// Health check endpoint.
///
/// GET /api/v1/health
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        strategies: state
            .registry
            .names()
            .into_iter()
            .map(String::from)
            .collect(),
    }))
}

// ==================== Authentication Endpoints ====================

/// Check a username/password pair.
///
/// POST /api/v1/auth/login
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials valid", body = UserInfo),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(principal): Extension<Principal>,
) -> AppResult<Json<ApiResponse<UserInfo>>> {
    let Principal::User(user) = principal else {
        return Err(AppError::Internal(
            "login route expects a user principal".to_string(),
        ));
    };

    tracing::info!(user_id = %user.id, email = %user.email, "User logged in");

    Ok(Json(ApiResponse::success(UserInfo {
        id: user.id,
        email: user.email,
        name: user.name,
    })))
}

/// Get the claims of the presented bearer token.
///
/// GET /api/v1/auth/me
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current principal", body = TokenPrincipal),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn get_current_user(
    Extension(principal): Extension<Principal>,
) -> AppResult<Json<ApiResponse<TokenPrincipal>>> {
    let id = principal.id();
    let Principal::Claims(claims) = principal else {
        return Err(AppError::Internal(
            "token route expects a claims principal".to_string(),
        ));
    };

    Ok(Json(ApiResponse::success(TokenPrincipal {
        id,
        claims: Value::Object(claims),
    })))
}

/// Fallback for unmatched routes.
pub async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}
