//! The strategy contract and the adapter that turns it into a runnable unit.
//!
//! A strategy pairs a [`CredentialEngine`] (reads credentials off a request)
//! with a verify step (decides what the credentials are worth).
//! [`AuthStrategy::build_engine_strategy`] resolves the options, builds the
//! engine and captures the strategy instance inside the verify closure, so
//! the closure stays bound to its owner no matter who invokes it later.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderMap;
use futures::FutureExt;
use serde_json::Value;

use crate::auth::error::{AuthError, AuthResult};
use crate::auth::outcome::{Completion, VerificationOutcome, VERIFY_PANICKED};

/// What an engine can read credentials from.
#[derive(Debug, Clone, Default)]
pub struct CredentialRequest {
    headers: HeaderMap,
    body: Option<Value>,
}

impl CredentialRequest {
    pub fn new(headers: HeaderMap, body: Option<Value>) -> Self {
        Self { headers, body }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A string field of the JSON body.
    pub fn body_field(&self, field: &str) -> Option<&str> {
        self.body.as_ref()?.get(field)?.as_str()
    }
}

/// Mechanism-level engine: owns options and extracts credentials.
///
/// Extraction may short-circuit with an outcome (usually a rejection), in
/// which case the strategy's verify step is never called.
pub trait CredentialEngine: Send + Sync + Sized + 'static {
    type Options: Send;
    type Credentials: Send + 'static;

    /// Build the engine. Missing required options are configuration errors.
    fn from_options(options: Self::Options) -> AuthResult<Self>;

    fn extract(
        &self,
        request: &CredentialRequest,
    ) -> Result<Self::Credentials, VerificationOutcome>;
}

/// Capability set of one authentication mechanism.
#[async_trait]
pub trait AuthStrategy: Send + Sync + 'static {
    type Engine: CredentialEngine;

    /// Unique, non-empty registry key.
    fn name(&self) -> &str;

    /// Mechanism options. May read configuration, never mutates it.
    fn resolve_options(&self) -> <Self::Engine as CredentialEngine>::Options;

    /// Check credentials and report exactly one outcome through `complete`.
    async fn verify(
        &self,
        credentials: <Self::Engine as CredentialEngine>::Credentials,
        complete: Completion,
    );

    /// Build the runnable unit for the registry.
    ///
    /// The returned verify closure holds its own `Arc` to this strategy.
    fn build_engine_strategy(self: Arc<Self>) -> AuthResult<EngineStrategy>
    where
        Self: Sized,
    {
        let name = self.name().trim().to_string();
        if name.is_empty() {
            return Err(AuthError::Configuration(
                "strategy name must not be empty".to_string(),
            ));
        }

        let engine = Arc::new(Self::Engine::from_options(self.resolve_options())?);

        let verify: VerifyFn = Arc::new(move |request: &CredentialRequest| -> VerifyFuture {
            let extracted = engine.extract(request);
            let strategy = Arc::clone(&self);
            Box::pin(async move {
                let credentials = match extracted {
                    Ok(credentials) => credentials,
                    Err(outcome) => return outcome,
                };
                let (complete, pending) = Completion::channel();
                let verified = AssertUnwindSafe(strategy.verify(credentials, complete))
                    .catch_unwind()
                    .await;
                if let Err(panic) = verified {
                    tracing::error!(
                        strategy = strategy.name(),
                        panic = panic_message(panic.as_ref()),
                        "Strategy verify panicked"
                    );
                    return VerificationOutcome::system_error(VERIFY_PANICKED);
                }
                pending.outcome().await
            })
        });

        Ok(EngineStrategy { name, verify })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

type VerifyFuture = Pin<Box<dyn Future<Output = VerificationOutcome> + Send + 'static>>;
type VerifyFn = Arc<dyn Fn(&CredentialRequest) -> VerifyFuture + Send + Sync>;

/// A registered, ready-to-run strategy: its name plus the bound verify closure.
#[derive(Clone)]
pub struct EngineStrategy {
    name: String,
    verify: VerifyFn,
}

impl EngineStrategy {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run extraction and verification. Always yields one outcome.
    pub async fn authenticate(&self, request: &CredentialRequest) -> VerificationOutcome {
        (self.verify)(request).await
    }
}

impl fmt::Debug for EngineStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineStrategy")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
