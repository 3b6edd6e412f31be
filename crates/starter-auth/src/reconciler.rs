// Identity reconciliation — the decision core of the library.
//
// Given an authentication event (local credentials or an OAuth callback)
// and the current session, decide whether to sign in an existing account,
// link a provider to the session's account, reject due to conflict, or
// create a new account.
//
// Policy overview:
//
// - Local credentials: look up by email; missing account, missing password
//   hash, and wrong password are indistinguishable to the caller.
// - OAuth with a session (linking flow): a match on another account is
//   rejected — cross-account merging is unsupported; a match on the current
//   account is an idempotent no-op; no match links the identity.
// - OAuth without a session: a provider match signs in; otherwise an email
//   match is rejected (no silent identity collision) and no match creates
//   a new account seeded from the provider profile.
//
// The multi-step policy is not a transaction. The store enforces uniqueness
// at write time, and a write-time Conflict here is converted into the same
// rejection the preceding read would have produced.

use serde::{Deserialize, Serialize};

use starter_auth_core::error::{AuthError, ConflictKind, Result};
use starter_auth_core::model::{
    Account, AccountDraft, AccountPatch, Profile, Provider, ProviderLink,
};

use crate::context::AuthContext;
use crate::crypto::password::{hash_password, maybe_hash_password, verify_password};

/// Profile data supplied by an OAuth provider on callback.
///
/// `email` may be absent; not every provider supplies one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl ProfileSnapshot {
    fn profile(&self) -> Profile {
        Profile {
            name: self.name.clone(),
            picture: self.picture.clone(),
            gender: self.gender.clone(),
            location: self.location.clone(),
        }
    }
}

/// An inbound authentication event.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    /// Local email/password sign-in.
    Credentials { email: String, password: String },
    /// A successful OAuth provider callback.
    OAuth {
        provider: Provider,
        external_id: String,
        access_token: Option<String>,
        refresh_token: Option<String>,
        profile: ProfileSnapshot,
    },
}

/// What the reconciler decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// An existing account signed in.
    SignedIn,
    /// The provider identity was linked to the session's account.
    Linked,
    /// The identity was already linked to the session's account; no change.
    AlreadyLinked,
    /// A new account was created from the provider profile.
    Created,
}

/// A resolved identity: the account plus how it was resolved.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub account: Account,
    pub outcome: Outcome,
}

/// Resolve an authentication event against the credential store.
///
/// `session` is the account id of the already-signed-in requester, if any.
pub async fn resolve(
    ctx: &AuthContext,
    session: Option<&str>,
    event: AuthEvent,
) -> Result<Resolution> {
    match event {
        AuthEvent::Credentials { email, password } => {
            sign_in_local(ctx, &email, &password).await
        }
        AuthEvent::OAuth {
            provider,
            external_id,
            access_token,
            refresh_token,
            profile,
        } => {
            let link = ProviderLink::new(external_id).with_tokens(access_token, refresh_token);
            match session {
                Some(account_id) => link_to_session(ctx, account_id, provider, link, profile).await,
                None => sign_in_or_create(ctx, provider, link, profile).await,
            }
        }
    }
}

/// Local sign-in. All failure causes collapse into `InvalidCredentials`.
async fn sign_in_local(ctx: &AuthContext, email: &str, password: &str) -> Result<Resolution> {
    let account = ctx
        .store
        .find_by_email(email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let hash = account
        .password_hash
        .as_deref()
        .filter(|h| !h.is_empty())
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(hash, password)? {
        return Err(AuthError::InvalidCredentials);
    }

    let account = ctx
        .store
        .update(&account.id, AccountPatch::new().record_login())
        .await?;

    Ok(Resolution {
        account,
        outcome: Outcome::SignedIn,
    })
}

/// Linking flow: the requester is signed in and the callback should attach
/// the provider identity to their account.
async fn link_to_session(
    ctx: &AuthContext,
    account_id: &str,
    provider: Provider,
    link: ProviderLink,
    snapshot: ProfileSnapshot,
) -> Result<Resolution> {
    if let Some(holder) = ctx
        .store
        .find_by_provider_id(provider, &link.external_id)
        .await?
    {
        if holder.id != account_id {
            // Bound to someone else. Merging identities safely would require
            // reconciling conflicting data, which is out of scope.
            return Err(AuthError::ProviderAlreadyLinked);
        }
        // Idempotent re-link: nothing to change.
        return Ok(Resolution {
            account: holder,
            outcome: Outcome::AlreadyLinked,
        });
    }

    let current = ctx
        .store
        .find_by_id(account_id)
        .await?
        .ok_or(AuthError::NotFound)?;

    // Provider profile data only fills gaps in the existing profile.
    let mut profile = current.profile.clone();
    profile.fill_missing_from(&snapshot.profile());

    let patch = AccountPatch::new()
        .set_link(provider, link)
        .set_profile(profile);

    match ctx.store.update(account_id, patch).await {
        Ok(account) => Ok(Resolution {
            account,
            outcome: Outcome::Linked,
        }),
        // Someone else bound the identity between our read and this write.
        Err(AuthError::Conflict(ConflictKind::ProviderId)) => {
            Err(AuthError::ProviderAlreadyLinked)
        }
        Err(e) => Err(e),
    }
}

/// Login/signup flow: no session, decide between returning user, email
/// collision, and fresh account.
async fn sign_in_or_create(
    ctx: &AuthContext,
    provider: Provider,
    link: ProviderLink,
    snapshot: ProfileSnapshot,
) -> Result<Resolution> {
    if let Some(account) = ctx
        .store
        .find_by_provider_id(provider, &link.external_id)
        .await?
    {
        // Returning user.
        let account = ctx
            .store
            .update(&account.id, AccountPatch::new().record_login())
            .await?;
        return Ok(Resolution {
            account,
            outcome: Outcome::SignedIn,
        });
    }

    let email = match &snapshot.email {
        Some(email) if !email.is_empty() => {
            if ctx.store.find_by_email(email).await?.is_some() {
                // A local or other-provider account already owns this email.
                // Silently merging or duplicating would corrupt identity;
                // surface it and let the user act.
                return Err(AuthError::EmailAlreadyRegistered);
            }
            email.to_lowercase()
        }
        // Provider did not supply an email; synthesize a stable placeholder
        // so the record satisfies the email-required constraint.
        _ => format!("{}@{}.local", link.external_id, provider),
    };

    let draft = AccountDraft::new(email)
        .with_link(provider, link)
        .with_profile(snapshot.profile());

    match ctx.store.create(draft).await {
        Ok(account) => Ok(Resolution {
            account,
            outcome: Outcome::Created,
        }),
        // A concurrent signup won the race; report it as the read would have.
        Err(AuthError::Conflict(ConflictKind::Email)) => Err(AuthError::EmailAlreadyRegistered),
        Err(AuthError::Conflict(ConflictKind::ProviderId)) => Err(AuthError::ProviderAlreadyLinked),
        Err(e) => Err(e),
    }
}

// ─── Account management ─────────────────────────────────────────

/// Local signup: create an account with an email and password.
pub async fn sign_up(ctx: &AuthContext, email: &str, password: &str) -> Result<Account> {
    validate_password(ctx, password)?;
    let hash = maybe_hash_password(Some(password))?
        .ok_or_else(|| AuthError::Validation("Password cannot be blank".into()))?;

    ctx.store
        .create(AccountDraft::new(email).with_password_hash(hash))
        .await
}

/// Set a new password for an account (authenticated change).
pub async fn change_password(
    ctx: &AuthContext,
    account_id: &str,
    new_password: &str,
) -> Result<Account> {
    validate_password(ctx, new_password)?;
    let hash = hash_password(new_password)?;
    ctx.store
        .update(account_id, AccountPatch::new().set_password_hash(hash))
        .await
}

/// Update the account's display profile, and optionally its email.
pub async fn update_profile(
    ctx: &AuthContext,
    account_id: &str,
    email: Option<&str>,
    profile: Profile,
) -> Result<Account> {
    let mut patch = AccountPatch::new().set_profile(profile);
    if let Some(email) = email {
        patch = patch.set_email(email);
    }
    ctx.store.update(account_id, patch).await
}

/// Remove a provider link from an account.
///
/// Fails with `Conflict(LastAuthMethod)` when removal would leave the
/// account with no password and no remaining links.
pub async fn unlink(ctx: &AuthContext, account_id: &str, provider: Provider) -> Result<Account> {
    ctx.store
        .update(account_id, AccountPatch::new().remove_link(provider))
        .await
}

/// Delete an account. Provider links and reset tokens cascade with the
/// record.
pub async fn delete_account(ctx: &AuthContext, account_id: &str) -> Result<()> {
    ctx.store.delete(account_id).await
}

/// Enforce the configured password length bounds.
pub(crate) fn validate_password(ctx: &AuthContext, password: &str) -> Result<()> {
    let options = &ctx.options;
    if password.len() < options.min_password_length {
        return Err(AuthError::Validation(format!(
            "Password must be at least {} characters long",
            options.min_password_length
        )));
    }
    if password.len() > options.max_password_length {
        return Err(AuthError::Validation("Password is too long".into()));
    }
    Ok(())
}
