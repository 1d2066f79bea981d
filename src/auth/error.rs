//! Errors raised while assembling or selecting authentication strategies.
//!
//! Verification results never travel through these; see `VerificationOutcome`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Duplicate strategy name, missing required option, ...
    /// Fatal at startup.
    #[error("Authentication configuration error: {0}")]
    Configuration(String),

    /// No strategy registered under the requested name.
    #[error("Unknown authentication strategy: {0}")]
    UnknownStrategy(String),
}

pub type AuthResult<T> = Result<T, AuthError>;
