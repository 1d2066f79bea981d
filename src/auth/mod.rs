//! Authentication module for Warden Core.
//!
//! Pluggable strategies behind one contract:
//! - JWT: bearer-token claims (`"jwt"`)
//! - Local: username/password against a user store (`"local"`)
//!
//! Strategies are built once at startup into a [`Registry`] and selected per
//! route by name through the [`authenticate`] middleware.

mod error;
pub mod jwt;
pub mod local;
mod middleware;
mod outcome;
mod registry;
mod strategy;
mod users;

#[cfg(test)]
pub(crate) mod testing;

pub use error::AuthError;
pub use jwt::JWT_STRATEGY;
pub use local::LOCAL_STRATEGY;
pub use middleware::{authenticate, AuthGuard};
pub use outcome::Principal;
pub use registry::{Registry, StrategyConstructor, StrategyContext};
pub use users::{InMemoryUserStore, UserLookup, UserRecord};

#[cfg(test)]
pub use users::LookupError;

/// Strategies registered by the service, in registration order.
pub const BUILTIN_STRATEGIES: &[StrategyConstructor] = &[jwt::construct, local::construct];
