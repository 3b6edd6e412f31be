// Credential store trait — the persistence boundary every backend implements.
//
// The store is the unit of consistency: uniqueness of email and of
// (provider, externalId) is enforced at write time, under whatever locking
// the backend provides, so a read-check/write race can never produce
// duplicates. Callers treat a write-time Conflict as definitive.

use std::fmt;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Account, AccountDraft, AccountPatch, Provider};

/// Persistence operations for account records.
///
/// All email lookups lowercase their argument before matching. Password
/// material reaching `create`/`update` must already be hashed.
#[async_trait]
pub trait CredentialStore: Send + Sync + fmt::Debug {
    /// Create an account from a draft, assigning id and timestamps.
    ///
    /// Fails with `Conflict(Email)` or `Conflict(ProviderId)` when a
    /// uniqueness constraint would be violated, and with a validation error
    /// when the draft describes an unreachable account (no password hash and
    /// no provider links).
    async fn create(&self, draft: AccountDraft) -> Result<Account>;

    /// Find an account by its id.
    async fn find_by_id(&self, id: &str) -> Result<Option<Account>>;

    /// Find an account by email (case-normalized).
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Find the account holding a `(provider, externalId)` link.
    async fn find_by_provider_id(
        &self,
        provider: Provider,
        external_id: &str,
    ) -> Result<Option<Account>>;

    /// Find the account holding a password-reset token.
    ///
    /// A token past its expiry is treated as absent.
    async fn find_by_reset_token(&self, token: &str) -> Result<Option<Account>>;

    /// Apply a patch to an account, bumping `updated_at`.
    ///
    /// Re-checks the same constraints as `create` for any email change or
    /// added link, and rejects patches that would leave the account
    /// unreachable with `Conflict(LastAuthMethod)`. Fails with `NotFound`
    /// if the account does not exist.
    ///
    /// A patch carrying `expected_reset_token` is checked against the
    /// account's current valid token under the same lock as the write, and
    /// fails with `InvalidOrExpiredToken` on mismatch. Two racing consumers
    /// of one token therefore cannot both succeed.
    async fn update(&self, id: &str, patch: AccountPatch) -> Result<Account>;

    /// Delete an account. Provider links and any reset token go with it.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Total number of accounts.
    async fn count(&self) -> Result<u64>;
}
