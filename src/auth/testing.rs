//! Shared fixtures for authentication tests.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderValue};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;

use crate::auth::outcome::{Completion, VerificationOutcome};
use crate::auth::registry::StrategyContext;
use crate::auth::strategy::{AuthStrategy, CredentialEngine, CredentialRequest};
use crate::auth::users::{hash_secret, InMemoryUserStore, LookupError, UserLookup, UserRecord};
use crate::config::{AuthConfig, JwtConfig};

pub const TEST_SECRET: &str = "test-secret-key-12345";

/// Sign claims with HS256. Adds a one-hour `exp` when absent.
pub fn sign_token(secret: &str, mut claims: Value) -> String {
    if let Some(map) = claims.as_object_mut() {
        map.entry("exp")
            .or_insert_with(|| Value::from(chrono::Utc::now().timestamp() + 3600));
    }
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn bearer_request(token: &str) -> CredentialRequest {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    CredentialRequest::new(headers, None)
}

pub fn json_request(body: Value) -> CredentialRequest {
    CredentialRequest::new(HeaderMap::new(), Some(body))
}

/// Call a strategy's verify step directly and collect its outcome.
pub async fn run_verify<S: AuthStrategy>(
    strategy: &S,
    credentials: <S::Engine as CredentialEngine>::Credentials,
) -> VerificationOutcome {
    let (complete, pending) = Completion::channel();
    strategy.verify(credentials, complete).await;
    pending.outcome().await
}

pub fn test_user(email: &str, secret: &str) -> UserRecord {
    UserRecord {
        id: format!("id-{email}"),
        email: email.to_string(),
        name: Some("Test User".to_string()),
        password_hash: hash_secret(secret),
    }
}

/// A user store whose backend is always down.
pub struct FailingLookup;

#[async_trait]
impl UserLookup for FailingLookup {
    async fn find_user_by_identifier(&self, _: &str) -> Result<Option<UserRecord>, LookupError> {
        Err(LookupError::Unavailable("connection refused".to_string()))
    }
}

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            ..JwtConfig::default()
        },
        users: vec![test_user("a@b.com", "s3cr3t")],
        ..AuthConfig::default()
    }
}

/// Context with the test config and an in-memory store holding its users.
pub fn test_context() -> StrategyContext {
    let auth = test_auth_config();
    let users = Arc::new(InMemoryUserStore::new(auth.users.clone()));
    StrategyContext { auth, users }
}
