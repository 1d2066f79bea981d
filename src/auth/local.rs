//! Username/password strategy.
//!
//! The engine reads an identifier and a secret from the JSON request body
//! (field names are configurable). The strategy looks the user up through
//! the injected [`UserLookup`] and checks the secret digest.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::error::{AuthError, AuthResult};
use crate::auth::outcome::{Completion, Principal, VerificationOutcome};
use crate::auth::registry::StrategyContext;
use crate::auth::strategy::{
    AuthStrategy, CredentialEngine, CredentialRequest, EngineStrategy,
};
use crate::auth::users::UserLookup;
use crate::config::LocalConfig;

/// Registry name of the password strategy.
pub const LOCAL_STRATEGY: &str = "local";

/// Options for the request-body credentials engine.
#[derive(Debug, Clone)]
pub struct FieldOptions {
    pub username_field: String,
    pub password_field: String,
}

/// An identifier and the presented secret.
pub struct PasswordCredentials {
    pub identifier: String,
    pub secret: String,
}

impl fmt::Debug for PasswordCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordCredentials")
            .field("identifier", &self.identifier)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Pulls a credential pair out of the JSON body.
pub struct BodyCredentialsEngine {
    username_field: String,
    password_field: String,
}

impl CredentialEngine for BodyCredentialsEngine {
    type Options = FieldOptions;
    type Credentials = PasswordCredentials;

    fn from_options(options: FieldOptions) -> AuthResult<Self> {
        for (option, value) in [
            ("auth.local.username_field", &options.username_field),
            ("auth.local.password_field", &options.password_field),
        ] {
            if value.trim().is_empty() {
                return Err(AuthError::Configuration(format!(
                    "{} must not be empty",
                    option
                )));
            }
        }

        Ok(Self {
            username_field: options.username_field,
            password_field: options.password_field,
        })
    }

    fn extract(
        &self,
        request: &CredentialRequest,
    ) -> Result<PasswordCredentials, VerificationOutcome> {
        let identifier = request.body_field(&self.username_field).map(str::trim);
        let secret = request.body_field(&self.password_field);

        match (identifier, secret) {
            (Some(identifier), Some(secret)) if !identifier.is_empty() && !secret.is_empty() => {
                Ok(PasswordCredentials {
                    identifier: identifier.to_string(),
                    secret: secret.to_string(),
                })
            }
            _ => Err(VerificationOutcome::missing_credentials("missing credentials")),
        }
    }
}

/// Username/password strategy, registered as `"local"`.
pub struct LocalStrategy {
    config: LocalConfig,
    users: Arc<dyn UserLookup>,
}

impl LocalStrategy {
    pub fn new(config: LocalConfig, users: Arc<dyn UserLookup>) -> Self {
        Self { config, users }
    }
}

#[async_trait]
impl AuthStrategy for LocalStrategy {
    type Engine = BodyCredentialsEngine;

    fn name(&self) -> &str {
        LOCAL_STRATEGY
    }

    fn resolve_options(&self) -> FieldOptions {
        FieldOptions {
            username_field: self.config.username_field.clone(),
            password_field: self.config.password_field.clone(),
        }
    }

    async fn verify(&self, credentials: PasswordCredentials, complete: Completion) {
        match self
            .users
            .find_user_by_identifier(&credentials.identifier)
            .await
        {
            Ok(Some(user)) if user.verify_secret(&credentials.secret) => {
                complete.authenticated(Principal::User(user));
            }
            Ok(_) => {
                tracing::debug!(identifier = %credentials.identifier, "Invalid credentials");
                complete.rejected("invalid credentials");
            }
            Err(e) => complete.system_error(e),
        }
    }
}

/// Registry constructor for the password strategy.
pub fn construct(context: &StrategyContext) -> AuthResult<EngineStrategy> {
    Arc::new(LocalStrategy::new(
        context.auth.local.clone(),
        Arc::clone(&context.users),
    ))
    .build_engine_strategy()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::auth::testing::{json_request, run_verify, test_user, FailingLookup};
    use crate::auth::users::InMemoryUserStore;

    fn credentials(identifier: &str, secret: &str) -> PasswordCredentials {
        PasswordCredentials {
            identifier: identifier.to_string(),
            secret: secret.to_string(),
        }
    }

    fn strategy() -> LocalStrategy {
        let users = InMemoryUserStore::new(vec![test_user("a@b.com", "s3cr3t")]);
        LocalStrategy::new(LocalConfig::default(), Arc::new(users))
    }

    #[tokio::test]
    async fn test_matching_secret_authenticates() {
        let outcome = run_verify(&strategy(), credentials("a@b.com", "s3cr3t")).await;
        match outcome {
            VerificationOutcome::Authenticated {
                principal: Principal::User(user),
            } => assert_eq!(user.email, "a@b.com"),
            other => panic!("unexpected outcome: {other}"),
        }
    }

    #[tokio::test]
    async fn test_wrong_secret_is_rejected() {
        let outcome = run_verify(&strategy(), credentials("a@b.com", "wrong")).await;
        assert_eq!(outcome, VerificationOutcome::rejected("invalid credentials"));
    }

    #[tokio::test]
    async fn test_unknown_user_is_rejected_not_error() {
        let outcome = run_verify(&strategy(), credentials("nobody@b.com", "s3cr3t")).await;
        assert_eq!(outcome, VerificationOutcome::rejected("invalid credentials"));
    }

    #[tokio::test]
    async fn test_lookup_failure_is_system_error() {
        let strategy = LocalStrategy::new(LocalConfig::default(), Arc::new(FailingLookup));
        let outcome = run_verify(&strategy, credentials("a@b.com", "s3cr3t")).await;
        assert!(outcome.is_system_error());
    }

    #[tokio::test]
    async fn test_engine_reads_configured_fields() {
        let users = InMemoryUserStore::new(vec![test_user("alice", "s3cr3t")]);
        let config = LocalConfig {
            username_field: "username".to_string(),
            password_field: "passphrase".to_string(),
        };
        let engine = Arc::new(LocalStrategy::new(config, Arc::new(users)))
            .build_engine_strategy()
            .unwrap();

        let request = json_request(json!({ "username": "alice", "passphrase": "s3cr3t" }));
        assert!(engine.authenticate(&request).await.is_authenticated());

        // Default field names are not consulted once overridden.
        let request = json_request(json!({ "email": "alice", "password": "s3cr3t" }));
        assert_eq!(
            engine.authenticate(&request).await,
            VerificationOutcome::missing_credentials("missing credentials")
        );
    }

    #[tokio::test]
    async fn test_engine_rejects_missing_fields() {
        let engine = Arc::new(strategy()).build_engine_strategy().unwrap();

        for body in [
            json!({}),
            json!({ "email": "a@b.com" }),
            json!({ "email": "a@b.com", "password": 1234 }),
            json!({ "email": "", "password": "s3cr3t" }),
        ] {
            assert_eq!(
                engine.authenticate(&json_request(body)).await,
                VerificationOutcome::missing_credentials("missing credentials")
            );
        }

        let outcome = engine.authenticate(&CredentialRequest::default()).await;
        assert!(outcome.is_rejected());
    }

    #[test]
    fn test_empty_field_name_is_configuration_error() {
        let config = LocalConfig {
            username_field: String::new(),
            ..LocalConfig::default()
        };
        let err = Arc::new(LocalStrategy::new(config, Arc::new(FailingLookup)))
            .build_engine_strategy()
            .unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));
    }
}
