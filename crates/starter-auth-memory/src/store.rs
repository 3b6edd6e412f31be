// In-memory credential store — HashMap keyed by account id.
//
// Thread-safe via `tokio::sync::RwLock`. Uniqueness of email and of
// (provider, externalId) is checked under the write lock, so two racing
// creates with the same identifiers cannot both commit: exactly one wins
// and the other gets a Conflict.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use starter_auth_core::error::{AuthError, ConflictKind, Result};
use starter_auth_core::model::{Account, AccountDraft, AccountPatch, Provider};
use starter_auth_core::store::CredentialStore;

/// In-memory credential store.
///
/// All data is lost when the store is dropped. Intended for tests and
/// prototyping; a SQL backend would enforce the same constraints with
/// unique indexes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    accounts: Arc<RwLock<HashMap<String, Account>>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all accounts.
    pub async fn clear(&self) {
        self.accounts.write().await.clear();
    }

    /// Snapshot of all accounts (for debugging/testing).
    pub async fn snapshot(&self) -> Vec<Account> {
        self.accounts.read().await.values().cloned().collect()
    }
}

/// Check email uniqueness against every account except `exclude_id`.
fn email_taken(accounts: &HashMap<String, Account>, email: &str, exclude_id: Option<&str>) -> bool {
    accounts
        .values()
        .any(|a| Some(a.id.as_str()) != exclude_id && a.email == email)
}

/// Check link uniqueness against every account except `exclude_id`.
fn link_taken(
    accounts: &HashMap<String, Account>,
    provider: Provider,
    external_id: &str,
    exclude_id: Option<&str>,
) -> bool {
    accounts.values().any(|a| {
        Some(a.id.as_str()) != exclude_id
            && a.link(provider)
                .map(|l| l.external_id == external_id)
                .unwrap_or(false)
    })
}

/// Apply a patch to a copy of the account. The caller validates the result
/// before committing it.
fn apply_patch(account: &mut Account, patch: AccountPatch) {
    if let Some(email) = patch.email {
        account.email = email.to_lowercase();
    }
    if let Some(hash) = patch.password_hash {
        account.password_hash = hash;
    }
    for provider in patch.remove_links {
        account.provider_links.remove(&provider);
    }
    for (provider, link) in patch.set_links {
        account.provider_links.insert(provider, link);
    }
    if let Some(profile) = patch.profile {
        account.profile = profile;
    }
    if let Some(reset_token) = patch.reset_token {
        account.reset_token = reset_token;
    }
    if patch.increment_login_count {
        account.login_count += 1;
    }
    account.updated_at = chrono::Utc::now();
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn create(&self, draft: AccountDraft) -> Result<Account> {
        let email = draft.email.to_lowercase();
        if email.is_empty() {
            return Err(AuthError::Validation("Email is required".into()));
        }

        let has_password = draft
            .password_hash
            .as_deref()
            .map(|h| !h.is_empty())
            .unwrap_or(false);
        if !has_password && draft.provider_links.is_empty() {
            return Err(AuthError::Validation(
                "Account must have a password or a provider link".into(),
            ));
        }

        let mut accounts = self.accounts.write().await;

        if email_taken(&accounts, &email, None) {
            return Err(AuthError::Conflict(ConflictKind::Email));
        }
        for (provider, link) in &draft.provider_links {
            if link_taken(&accounts, *provider, &link.external_id, None) {
                return Err(AuthError::Conflict(ConflictKind::ProviderId));
            }
        }

        let now = chrono::Utc::now();
        let account = Account {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            password_hash: draft.password_hash,
            provider_links: draft.provider_links,
            profile: draft.profile,
            reset_token: None,
            login_count: 0,
            created_at: now,
            updated_at: now,
        };

        accounts.insert(account.id.clone(), account.clone());
        Ok(account)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>> {
        Ok(self.accounts.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let email = email.to_lowercase();
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn find_by_provider_id(
        &self,
        provider: Provider,
        external_id: &str,
    ) -> Result<Option<Account>> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| {
                a.link(provider)
                    .map(|l| l.external_id == external_id)
                    .unwrap_or(false)
            })
            .cloned())
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<Account>> {
        let now = chrono::Utc::now();
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| {
                a.valid_reset_token(now)
                    .map(|t| t.token == token)
                    .unwrap_or(false)
            })
            .cloned())
    }

    async fn update(&self, id: &str, patch: AccountPatch) -> Result<Account> {
        let mut accounts = self.accounts.write().await;

        let mut candidate = accounts.get(id).cloned().ok_or(AuthError::NotFound)?;

        if let Some(expected) = patch.expected_reset_token.as_deref() {
            let now = chrono::Utc::now();
            let held = candidate.valid_reset_token(now).map(|t| t.token.as_str());
            if held != Some(expected) {
                return Err(AuthError::InvalidOrExpiredToken);
            }
        }

        apply_patch(&mut candidate, patch);

        if email_taken(&accounts, &candidate.email, Some(id)) {
            return Err(AuthError::Conflict(ConflictKind::Email));
        }
        for (provider, link) in &candidate.provider_links {
            if link_taken(&accounts, *provider, &link.external_id, Some(id)) {
                return Err(AuthError::Conflict(ConflictKind::ProviderId));
            }
        }
        if !candidate.is_reachable() {
            return Err(AuthError::Conflict(ConflictKind::LastAuthMethod));
        }

        accounts.insert(id.to_string(), candidate.clone());
        Ok(candidate)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.accounts
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or(AuthError::NotFound)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.accounts.read().await.len() as u64)
    }
}
