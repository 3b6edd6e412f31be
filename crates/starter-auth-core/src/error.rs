// Error taxonomy for authentication and account-management operations.
//
// Validation-shaped errors (InvalidCredentials, ProviderAlreadyLinked, ...)
// are meant to be recovered at the request boundary and turned into
// user-visible messages. Delivery is non-fatal; Transport is fatal to the
// current operation. No operation retries anywhere.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which uniqueness (or reachability) rule a `Conflict` violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictKind {
    /// The email address is already registered to another account.
    Email,
    /// The `(provider, externalId)` pair is already bound to another account.
    ProviderId,
    /// The change would leave the account with no password and no provider
    /// links, making it impossible to sign in to.
    LastAuthMethod,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::Email => "email address is already in use",
            Self::ProviderId => "provider identity is already in use",
            Self::LastAuthMethod => "account would be left with no way to sign in",
        };
        write!(f, "{msg}")
    }
}

/// Unified error type for all starter-auth operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Local sign-in failed. Missing account, missing password hash, and a
    /// wrong password all collapse into this variant so callers cannot tell
    /// which accounts exist.
    #[error("Email / password combination is not correct")]
    InvalidCredentials,

    /// A store uniqueness or reachability constraint was violated.
    #[error("Conflict: {0}")]
    Conflict(ConflictKind),

    /// An OAuth identity is already linked to a different account than the
    /// one in the current session. Cross-account merging is unsupported.
    #[error("That provider account is already linked to another user")]
    ProviderAlreadyLinked,

    /// An OAuth sign-up collided with an existing account holding the same
    /// email address.
    #[error("An account with that email address already exists")]
    EmailAlreadyRegistered,

    /// A password-reset token was unknown, already used, or past its expiry.
    #[error("Password reset request is invalid or has expired")]
    InvalidOrExpiredToken,

    /// The referenced account does not exist.
    #[error("Account not found")]
    NotFound,

    /// Request input failed validation (password length etc.).
    #[error("{0}")]
    Validation(String),

    /// Mail delivery failed. Non-fatal: the dispatcher downgrades this to a
    /// warning and never rolls back the parent operation.
    #[error("Mail delivery failed: {0}")]
    Delivery(String),

    /// The store or network is unavailable. Fatal to the current operation.
    #[error("Transport error: {0}")]
    Transport(String),

    /// RNG or KDF failure. Fatal to the calling operation; a plaintext or
    /// empty hash is never stored in its place.
    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AuthError {
    /// Whether this error should fail the parent operation.
    ///
    /// Only `Delivery` is recoverable in place; everything else propagates.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Delivery(_))
    }
}

/// Unified result type for starter-auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;
