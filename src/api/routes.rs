//! Route definitions for the API.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::handlers;
use crate::auth::{authenticate, AuthGuard, JWT_STRATEGY, LOCAL_STRATEGY};
use crate::AppState;

/// Security scheme modifier for OpenAPI.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health_check,
        handlers::login,
        handlers::get_current_user,
    ),
    components(schemas(
        crate::api::types::HealthResponse,
        crate::api::types::LoginRequest,
        crate::api::types::UserInfo,
        crate::api::types::TokenPrincipal,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "health", description = "Health and status endpoints")
    ),
    info(
        title = "Warden Core API",
        version = "0.1.0",
        description = "HTTP service scaffold with pluggable authentication strategies",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Build the API router.
///
/// The registry's `initialize()` layer is mounted once around everything;
/// guarded routes pick their strategy by name.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let deadline = state.verify_timeout;
    let initialize = state.registry.initialize();

    // Username/password
    let local_routes = Router::new()
        .route("/auth/login", post(handlers::login))
        .route_layer(middleware::from_fn_with_state(
            AuthGuard::new(LOCAL_STRATEGY, deadline),
            authenticate,
        ));

    // Bearer token
    let token_routes = Router::new()
        .route("/auth/me", get(handlers::get_current_user))
        .route_layer(middleware::from_fn_with_state(
            AuthGuard::new(JWT_STRATEGY, deadline),
            authenticate,
        ));

    let api = Router::new()
        .route("/health", get(handlers::health_check))
        .merge(local_routes)
        .merge(token_routes)
        .with_state(state);

    Router::new()
        .nest("/api/v1", api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(handlers::not_found)
        .layer(initialize)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
