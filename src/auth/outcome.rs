//! Verification outcomes and the single-use completion channel.
//!
//! Every verify step ends in exactly one [`VerificationOutcome`]. Strategies
//! report it through a [`Completion`], which is consumed on use, so a second
//! report cannot be expressed. A completion dropped without a report is
//! surfaced by [`PendingOutcome`] as a system error.

use std::fmt;

use tokio::sync::oneshot;

use crate::auth::jwt::{claim_identifier, Claims};
use crate::auth::users::UserRecord;

/// Identity payload produced by a successful verification.
///
/// The payload is defined by the mechanism that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Principal {
    /// Decoded bearer-token claims.
    Claims(Claims),
    /// A user record found by the user-lookup collaborator.
    User(UserRecord),
}

impl Principal {
    /// Best-effort identifier, used for logging.
    pub fn id(&self) -> Option<String> {
        match self {
            Principal::Claims(claims) => claim_identifier(claims).ok().flatten(),
            Principal::User(user) => Some(user.id.clone()),
        }
    }
}

/// Why credentials were rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// Credentials were presented but did not check out.
    Invalid,
    /// The request lacked the credentials the strategy reads.
    Missing,
}

/// Result of one verification attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationOutcome {
    /// Credentials were valid.
    Authenticated { principal: Principal },
    /// Credentials were missing or invalid. Expected, never a failure.
    Rejected { reason: String, kind: RejectionKind },
    /// The check itself failed (I/O error, malformed payload, ...).
    SystemError { cause: String },
}

impl VerificationOutcome {
    pub fn authenticated(principal: Principal) -> Self {
        VerificationOutcome::Authenticated { principal }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        VerificationOutcome::Rejected {
            reason: reason.into(),
            kind: RejectionKind::Invalid,
        }
    }

    /// Rejection for a request that did not carry the credentials at all.
    pub fn missing_credentials(reason: impl Into<String>) -> Self {
        VerificationOutcome::Rejected {
            reason: reason.into(),
            kind: RejectionKind::Missing,
        }
    }

    pub fn system_error(cause: impl fmt::Display) -> Self {
        VerificationOutcome::SystemError {
            cause: cause.to_string(),
        }
    }
}

#[cfg(test)]
impl VerificationOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, VerificationOutcome::Authenticated { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, VerificationOutcome::Rejected { .. })
    }

    pub fn is_system_error(&self) -> bool {
        matches!(self, VerificationOutcome::SystemError { .. })
    }
}

impl fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationOutcome::Authenticated { .. } => write!(f, "authenticated"),
            VerificationOutcome::Rejected { reason, .. } => write!(f, "rejected: {}", reason),
            VerificationOutcome::SystemError { cause } => write!(f, "system error: {}", cause),
        }
    }
}

/// Cause reported when a verify step drops its completion unused.
pub const MISSING_OUTCOME: &str = "verify finished without an outcome";

/// Cause reported when a verify step panics.
pub const VERIFY_PANICKED: &str = "verify panicked";

/// Single-use callback handed to a strategy's verify step.
#[derive(Debug)]
pub struct Completion {
    tx: oneshot::Sender<VerificationOutcome>,
}

impl Completion {
    /// Create a completion and the handle that awaits its outcome.
    pub fn channel() -> (Completion, PendingOutcome) {
        let (tx, rx) = oneshot::channel();
        (Completion { tx }, PendingOutcome { rx })
    }

    /// Report the outcome. Consumes the completion.
    pub fn complete(self, outcome: VerificationOutcome) {
        if let Err(outcome) = self.tx.send(outcome) {
            // Caller stopped waiting (deadline elapsed or request dropped).
            tracing::debug!(outcome = %outcome, "Verification outcome discarded");
        }
    }

    pub fn authenticated(self, principal: Principal) {
        self.complete(VerificationOutcome::authenticated(principal));
    }

    pub fn rejected(self, reason: impl Into<String>) {
        self.complete(VerificationOutcome::rejected(reason));
    }

    pub fn system_error(self, cause: impl fmt::Display) {
        self.complete(VerificationOutcome::system_error(cause));
    }
}

/// Receiving side of a [`Completion`].
#[derive(Debug)]
pub struct PendingOutcome {
    rx: oneshot::Receiver<VerificationOutcome>,
}

impl PendingOutcome {
    /// Wait for the outcome.
    ///
    /// Resolves to a system error if the completion was dropped unused.
    pub async fn outcome(self) -> VerificationOutcome {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => VerificationOutcome::system_error(MISSING_OUTCOME),
        }
    }
}
