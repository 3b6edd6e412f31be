// starter-auth — main library crate.
//
// Wires together crypto, the auth context, the identity reconciler, session
// binding, password-reset tokens, and notification dispatch.

pub mod context;
pub mod crypto;
pub mod mailer;
pub mod reconciler;
pub mod reset;
pub mod session;

pub use starter_auth_core::error::{AuthError, ConflictKind, Result};
pub use starter_auth_core::model::{Account, Profile, Provider, ProviderLink};
pub use starter_auth_core::options::AuthOptions;
