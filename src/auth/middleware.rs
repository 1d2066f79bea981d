//! Authentication middleware for axum.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Request, State},
    http::{header::CONTENT_TYPE, HeaderMap, HeaderValue, Method},
    middleware::Next,
    response::Response,
    Form,
};
use serde_json::Value;

use crate::auth::outcome::{RejectionKind, VerificationOutcome};
use crate::auth::registry::Registry;
use crate::auth::strategy::CredentialRequest;
use crate::error::{AppError, AppResult};

/// Upper bound on request bodies buffered for credential extraction.
const MAX_CREDENTIAL_BODY: usize = 64 * 1024;

const JSON_CONTENT: &str = "application/json";
const FORM_CONTENT: &str = "application/x-www-form-urlencoded";

/// Per-route selection of a strategy plus the verify deadline.
#[derive(Debug, Clone, Copy)]
pub struct AuthGuard {
    strategy: &'static str,
    deadline: Duration,
}

impl AuthGuard {
    pub fn new(strategy: &'static str, deadline: Duration) -> Self {
        Self { strategy, deadline }
    }
}

/// Authenticate the request with the guard's strategy.
///
/// On success the [`Principal`](crate::auth::Principal) is added to the
/// request extensions. Missing credentials become 400s, other rejections
/// 401s; system errors and a missed deadline go to the global error handler.
pub async fn authenticate(
    State(guard): State<AuthGuard>,
    request: Request<Body>,
    next: Next,
) -> AppResult<Response> {
    let registry = request
        .extensions()
        .get::<Arc<Registry>>()
        .cloned()
        .ok_or_else(|| {
            AppError::Internal("authentication registry is not initialized".to_string())
        })?;
    let strategy = registry.resolve(guard.strategy)?;

    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_CREDENTIAL_BODY)
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read request body: {}", e)))?;
    let payload = credential_payload(&parts.headers, &bytes).await?;
    let credentials = CredentialRequest::new(parts.headers.clone(), payload);

    let outcome = tokio::time::timeout(guard.deadline, strategy.authenticate(&credentials))
        .await
        .unwrap_or_else(|_| {
            VerificationOutcome::system_error(format!(
                "verification did not complete within {}ms",
                guard.deadline.as_millis()
            ))
        });

    match outcome {
        VerificationOutcome::Authenticated { principal } => {
            tracing::debug!(
                strategy = guard.strategy,
                principal_id = ?principal.id(),
                "Request authenticated"
            );
            let mut request = Request::from_parts(parts, Body::from(bytes));
            request.extensions_mut().insert(principal);
            Ok(next.run(request).await)
        }
        VerificationOutcome::Rejected { reason, kind } => {
            tracing::debug!(strategy = guard.strategy, reason = %reason, "Authentication rejected");
            Err(match kind {
                RejectionKind::Missing => AppError::BadRequest(reason),
                RejectionKind::Invalid => AppError::Unauthorized(reason),
            })
        }
        VerificationOutcome::SystemError { cause } => Err(AppError::Internal(format!(
            "strategy '{}' failed: {}",
            guard.strategy, cause
        ))),
    }
}

/// Parse JSON and URL-encoded form bodies into a JSON value.
///
/// Other content types carry no credentials and yield `None`.
async fn credential_payload(headers: &HeaderMap, bytes: &Bytes) -> AppResult<Option<Value>> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if bytes.is_empty() {
        return Ok(None);
    }

    if content_type.starts_with(JSON_CONTENT) {
        return serde_json::from_slice(bytes)
            .map(Some)
            .map_err(|e| AppError::BadRequest(format!("Malformed JSON body: {}", e)));
    }

    if content_type.starts_with(FORM_CONTENT) {
        let mut request = Request::new(Body::from(bytes.clone()));
        *request.method_mut() = Method::POST;
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT));

        let Form(fields) = Form::<HashMap<String, String>>::from_request(request, &())
            .await
            .map_err(|e| AppError::BadRequest(format!("Malformed form body: {}", e)))?;

        let fields = fields
            .into_iter()
            .map(|(name, value)| (name, Value::String(value)))
            .collect();
        return Ok(Some(Value::Object(fields)));
    }

    Ok(None)
}
