// Password-reset tokens: issue a single-use, expiring token and later
// consume it to set a new password.
//
// Lookup by token is the only way back to the account, so the token must
// be unguessable. Expiry is checked against the wall clock at lookup time;
// expired tokens are simply invisible rather than reaped eagerly.

use chrono::{TimeDelta, Utc};

use starter_auth_core::error::{AuthError, Result};
use starter_auth_core::model::{Account, AccountPatch, ResetToken};

use crate::context::AuthContext;
use crate::crypto::password::hash_password;
use crate::crypto::random::generate_token;
use crate::mailer::{self, NotificationKind};
use crate::reconciler::validate_password;

/// A freshly issued reset token and the account it belongs to.
#[derive(Debug, Clone)]
pub struct IssuedReset {
    pub token: String,
    pub account: Account,
}

/// Issue a reset token for the account registered under `email`.
///
/// Issuing again before the previous token is used replaces it; only the
/// most recent token is honored.
pub async fn issue(ctx: &AuthContext, email: &str) -> Result<IssuedReset> {
    let account = ctx
        .store
        .find_by_email(email)
        .await?
        .ok_or(AuthError::NotFound)?;

    let token = generate_token(ctx.options.reset_token_bytes);
    let ttl = TimeDelta::seconds(ctx.options.reset_token_ttl_secs);
    let reset = ResetToken {
        token: token.clone(),
        expires_at: Utc::now() + ttl,
    };

    let account = ctx
        .store
        .update(&account.id, AccountPatch::new().set_reset_token(reset))
        .await?;

    Ok(IssuedReset { token, account })
}

/// Consume a reset token: validate it, set the new password, and clear the
/// token so it cannot be replayed.
///
/// Unknown and expired tokens are indistinguishable to the caller.
pub async fn consume(ctx: &AuthContext, token: &str, new_password: &str) -> Result<Account> {
    let account = ctx
        .store
        .find_by_reset_token(token)
        .await?
        .ok_or(AuthError::InvalidOrExpiredToken)?;

    validate_password(ctx, new_password)?;
    let hash = hash_password(new_password)?;

    // The expectation is re-checked under the store's write lock, so a
    // concurrent consumer of the same token loses cleanly.
    ctx.store
        .update(
            &account.id,
            AccountPatch::new()
                .set_password_hash(hash)
                .clear_reset_token()
                .if_reset_token(token),
        )
        .await
}

// ─── Flows ──────────────────────────────────────────────────────

/// The forgot-password flow: issue a token and mail a reset link.
///
/// `host` is the address the emailed link points at.
pub async fn forgot_password(ctx: &AuthContext, email: &str, host: &str) -> Result<Account> {
    let issued = issue(ctx, email).await?;
    mailer::dispatch(
        ctx,
        NotificationKind::PasswordResetRequested {
            host: host.to_owned(),
            token: issued.token,
        },
        &issued.account,
    )
    .await;
    ctx.logger
        .info(&format!("reset token issued for {}", issued.account.email));
    Ok(issued.account)
}

/// The reset-password flow: consume the token and confirm by mail.
pub async fn reset_password(ctx: &AuthContext, token: &str, new_password: &str) -> Result<Account> {
    let account = consume(ctx, token, new_password).await?;
    mailer::dispatch(ctx, NotificationKind::PasswordChanged, &account).await;
    Ok(account)
}
