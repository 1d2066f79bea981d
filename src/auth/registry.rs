//! Strategy registry.
//!
//! Lifecycle is encoded in types:
//! - Uninitialized: nothing built yet.
//! - Discovering: a [`RegistryBuilder`] accepting registrations, one at a time.
//! - Ready: a [`Registry`], immutable and freely shared across requests.
//!
//! The process builds one registry at startup from an explicit constructor
//! list and hands it around behind an `Arc`.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use axum::Extension;

use crate::auth::error::{AuthError, AuthResult};
use crate::auth::strategy::EngineStrategy;
use crate::auth::users::UserLookup;
use crate::config::AuthConfig;

/// Dependencies available to strategy constructors.
#[derive(Clone)]
pub struct StrategyContext {
    pub auth: AuthConfig,
    pub users: Arc<dyn UserLookup>,
}

/// Builds one strategy from the startup context.
pub type StrategyConstructor = fn(&StrategyContext) -> AuthResult<EngineStrategy>;

/// Registry in the Discovering phase.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    strategies: HashMap<String, EngineStrategy>,
}

impl RegistryBuilder {
    /// Register a strategy under its name.
    ///
    /// A duplicate name is a configuration error and leaves the builder untouched.
    pub fn register(&mut self, strategy: EngineStrategy) -> AuthResult<()> {
        match self.strategies.entry(strategy.name().to_string()) {
            Entry::Occupied(existing) => Err(AuthError::Configuration(format!(
                "duplicate strategy name '{}'",
                existing.key()
            ))),
            Entry::Vacant(slot) => {
                tracing::info!(strategy = %slot.key(), "Registered authentication strategy");
                slot.insert(strategy);
                Ok(())
            }
        }
    }

    /// Finish discovery. The result is read-only.
    pub fn finish(self) -> Registry {
        Registry {
            strategies: self.strategies,
        }
    }
}

/// Registry in the Ready phase.
#[derive(Debug)]
pub struct Registry {
    strategies: HashMap<String, EngineStrategy>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Run every constructor in order and register the results.
    ///
    /// Stops at the first failure; the caller is expected to abort startup.
    pub fn discover(
        context: &StrategyContext,
        constructors: &[StrategyConstructor],
    ) -> AuthResult<Self> {
        let mut builder = Self::builder();
        for construct in constructors {
            builder.register(construct(context)?)?;
        }
        Ok(builder.finish())
    }

    /// Layer that makes this registry available to the `authenticate`
    /// middleware. Mount once, ahead of every guarded route.
    pub fn initialize(self: &Arc<Self>) -> Extension<Arc<Registry>> {
        Extension(Arc::clone(self))
    }

    /// Look up a strategy by name.
    pub fn resolve(&self, name: &str) -> AuthResult<&EngineStrategy> {
        self.strategies
            .get(name)
            .ok_or_else(|| AuthError::UnknownStrategy(name.to_string()))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
