//! Bearer-token claims strategy.
//!
//! The engine reads `Authorization: Bearer <token>`, checks the signature and
//! expiry with `jsonwebtoken`, and hands the decoded claims to the strategy.
//! The strategy accepts any claims carrying a usable `id`.

use async_trait::async_trait;
use axum::http::header::{HeaderName, AUTHORIZATION};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::Value;

use crate::auth::error::{AuthError, AuthResult};
use crate::auth::outcome::{Completion, Principal, VerificationOutcome};
use crate::auth::registry::StrategyContext;
use crate::auth::strategy::{
    AuthStrategy, CredentialEngine, CredentialRequest, EngineStrategy,
};
use crate::config::JwtConfig;

/// Registry name of the token strategy.
pub const JWT_STRATEGY: &str = "jwt";

/// Claim holding the principal identifier.
pub const ID_CLAIM: &str = "id";

const BEARER_SCHEME: &str = "Bearer";

/// Decoded token payload.
pub type Claims = serde_json::Map<String, Value>;

/// Read the identifier claim.
///
/// `Ok(None)` when absent, null or blank. Types other than string or number
/// are a malformed payload.
pub fn claim_identifier(claims: &Claims) -> Result<Option<String>, String> {
    match claims.get(ID_CLAIM) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(id)) if id.trim().is_empty() => Ok(None),
        Some(Value::String(id)) => Ok(Some(id.clone())),
        Some(Value::Number(id)) => Ok(Some(id.to_string())),
        Some(other) => Err(format!(
            "malformed '{}' claim: expected string or number, found {}",
            ID_CLAIM,
            json_type(other)
        )),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Options for the bearer-token engine.
#[derive(Debug, Clone)]
pub struct BearerOptions {
    /// Header carrying the token.
    pub header: String,
    /// HMAC secret. Required.
    pub secret: String,
    /// Required issuer, if any.
    pub issuer: Option<String>,
    /// Leeway in seconds for `exp`/`nbf`.
    pub leeway_secs: u64,
}

/// Extracts and validates bearer tokens.
pub struct BearerTokenEngine {
    header: HeaderName,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl CredentialEngine for BearerTokenEngine {
    type Options = BearerOptions;
    type Credentials = Claims;

    fn from_options(options: BearerOptions) -> AuthResult<Self> {
        if options.secret.trim().is_empty() {
            return Err(AuthError::Configuration(format!(
                "auth.jwt.secret is required by the '{}' strategy",
                JWT_STRATEGY
            )));
        }

        let header = HeaderName::from_bytes(options.header.as_bytes()).map_err(|e| {
            AuthError::Configuration(format!(
                "invalid token header '{}': {}",
                options.header, e
            ))
        })?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = options.leeway_secs;
        if let Some(issuer) = &options.issuer {
            validation.set_issuer(&[issuer]);
        }

        Ok(Self {
            header,
            decoding_key: DecodingKey::from_secret(options.secret.as_bytes()),
            validation,
        })
    }

    fn extract(&self, request: &CredentialRequest) -> Result<Claims, VerificationOutcome> {
        let token = request
            .headers()
            .get(&self.header)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim_start().split_once(char::is_whitespace))
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case(BEARER_SCHEME))
            .map(|(_, token)| token.trim())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| VerificationOutcome::rejected("missing bearer token"))?;

        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "JWT validation failed");
                VerificationOutcome::rejected("invalid token")
            })
    }
}

/// Token-claims strategy, registered as `"jwt"`.
pub struct JwtStrategy {
    config: JwtConfig,
}

impl JwtStrategy {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl AuthStrategy for JwtStrategy {
    type Engine = BearerTokenEngine;

    fn name(&self) -> &str {
        JWT_STRATEGY
    }

    fn resolve_options(&self) -> BearerOptions {
        BearerOptions {
            header: self
                .config
                .header
                .clone()
                .unwrap_or_else(|| AUTHORIZATION.as_str().to_string()),
            secret: self.config.secret.clone(),
            issuer: self.config.issuer.clone(),
            leeway_secs: self.config.leeway_secs,
        }
    }

    async fn verify(&self, claims: Claims, complete: Completion) {
        match claim_identifier(&claims) {
            Ok(Some(_)) => complete.authenticated(Principal::Claims(claims)),
            Ok(None) => complete.rejected("missing identifier"),
            Err(cause) => complete.system_error(cause),
        }
    }
}

/// Registry constructor for the token strategy.
pub fn construct(context: &StrategyContext) -> AuthResult<EngineStrategy> {
    std::sync::Arc::new(JwtStrategy::new(context.auth.jwt.clone())).build_engine_strategy()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::auth::testing::{bearer_request, sign_token, run_verify, TEST_SECRET};

    fn claims(value: Value) -> Claims {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: TEST_SECRET.to_string(),
            ..JwtConfig::default()
        }
    }

    #[tokio::test]
    async fn test_claims_with_id_authenticate() {
        let strategy = JwtStrategy::new(test_config());
        let payload = claims(json!({ "id": "u1" }));

        let outcome = run_verify(&strategy, payload.clone()).await;
        assert_eq!(
            outcome,
            VerificationOutcome::authenticated(Principal::Claims(payload))
        );
    }

    #[tokio::test]
    async fn test_numeric_id_authenticates() {
        let strategy = JwtStrategy::new(test_config());
        let outcome = run_verify(&strategy, claims(json!({ "id": 42 }))).await;
        assert!(outcome.is_authenticated());
    }

    #[tokio::test]
    async fn test_missing_id_is_rejected() {
        let strategy = JwtStrategy::new(test_config());

        for payload in [json!({}), json!({ "id": null }), json!({ "id": "  " })] {
            let outcome = run_verify(&strategy, claims(payload)).await;
            assert_eq!(outcome, VerificationOutcome::rejected("missing identifier"));
        }
    }

    #[tokio::test]
    async fn test_malformed_id_is_system_error() {
        let strategy = JwtStrategy::new(test_config());

        let outcome = run_verify(&strategy, claims(json!({ "id": { "nested": true } }))).await;
        assert!(outcome.is_system_error());

        let outcome = run_verify(&strategy, claims(json!({ "id": ["u1"] }))).await;
        assert!(outcome.is_system_error());
    }

    #[tokio::test]
    async fn test_engine_accepts_valid_token() {
        let engine = Arc::new(JwtStrategy::new(test_config()))
            .build_engine_strategy()
            .unwrap();
        let token = sign_token(TEST_SECRET, json!({ "id": "u1", "email": "a@b.com" }));

        let outcome = engine.authenticate(&bearer_request(&token)).await;
        match outcome {
            VerificationOutcome::Authenticated {
                principal: Principal::Claims(claims),
            } => {
                assert_eq!(claims.get("id"), Some(&json!("u1")));
                assert_eq!(claims.get("email"), Some(&json!("a@b.com")));
            }
            other => panic!("unexpected outcome: {other}"),
        }
    }

    #[tokio::test]
    async fn test_engine_rejects_bad_tokens() {
        let engine = Arc::new(JwtStrategy::new(test_config()))
            .build_engine_strategy()
            .unwrap();

        // No header
        let outcome = engine.authenticate(&CredentialRequest::default()).await;
        assert_eq!(outcome, VerificationOutcome::rejected("missing bearer token"));

        // Wrong signature
        let token = sign_token("another-secret", json!({ "id": "u1" }));
        let outcome = engine.authenticate(&bearer_request(&token)).await;
        assert_eq!(outcome, VerificationOutcome::rejected("invalid token"));

        // Expired
        let expired = chrono::Utc::now().timestamp() - 3600;
        let token = sign_token(TEST_SECRET, json!({ "id": "u1", "exp": expired }));
        let outcome = engine.authenticate(&bearer_request(&token)).await;
        assert_eq!(outcome, VerificationOutcome::rejected("invalid token"));

        // Garbage
        let outcome = engine.authenticate(&bearer_request("not-a-jwt")).await;
        assert!(outcome.is_rejected());
    }

    fn authorization_request(value: &str) -> CredentialRequest {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            axum::http::HeaderValue::from_str(value).unwrap(),
        );
        CredentialRequest::new(headers, None)
    }

    #[tokio::test]
    async fn test_engine_scheme_is_case_insensitive() {
        let engine = Arc::new(JwtStrategy::new(test_config()))
            .build_engine_strategy()
            .unwrap();
        let token = sign_token(TEST_SECRET, json!({ "id": "u1" }));

        for value in [
            format!("bearer {token}"),
            format!("BEARER {token}"),
            format!("Bearer   {token}"),
            format!("  bEaReR\t{token}"),
        ] {
            let outcome = engine.authenticate(&authorization_request(&value)).await;
            assert!(outcome.is_authenticated(), "{value}: {outcome}");
        }

        for value in [
            format!("Basic {token}"),
            format!("Bearer{token}"),
            "Bearer ".to_string(),
            token.clone(),
        ] {
            assert_eq!(
                engine.authenticate(&authorization_request(&value)).await,
                VerificationOutcome::rejected("missing bearer token")
            );
        }
    }

    #[tokio::test]
    async fn test_engine_checks_issuer() {
        let config = JwtConfig {
            issuer: Some("warden".to_string()),
            ..test_config()
        };
        let engine = Arc::new(JwtStrategy::new(config))
            .build_engine_strategy()
            .unwrap();

        let token = sign_token(TEST_SECRET, json!({ "id": "u1", "iss": "someone-else" }));
        assert!(engine.authenticate(&bearer_request(&token)).await.is_rejected());

        let token = sign_token(TEST_SECRET, json!({ "id": "u1", "iss": "warden" }));
        assert!(engine
            .authenticate(&bearer_request(&token))
            .await
            .is_authenticated());
    }

    #[test]
    fn test_missing_secret_is_configuration_error() {
        let err = Arc::new(JwtStrategy::new(JwtConfig::default()))
            .build_engine_strategy()
            .unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));
    }
}
