//! API request and response types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Success envelope wrapped around every JSON payload.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Always `success`.
    pub status: String,
    pub message: String,
    pub data: T,
    /// RFC 3339 timestamp.
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: "Request successful".to_string(),
            data,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

// ==================== Health ====================

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Registered authentication strategies.
    pub strategies: Vec<String>,
}

// ==================== Authentication ====================

/// Login request.
///
/// Field names follow `auth.local`; these are the defaults.
/// Read by the `local` strategy, not by the handler.
#[allow(dead_code)]
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// User email.
    pub email: String,
    /// User password.
    pub password: String,
}

/// User information.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserInfo {
    /// User ID.
    pub id: String,
    /// User email.
    pub email: String,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Claims of the presented bearer token.
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPrincipal {
    /// Identifier claim.
    pub id: Option<String>,
    /// Full decoded claims.
    #[schema(value_type = Object)]
    pub claims: Value,
}
