// Session binding — converting a resolved identity into a session reference
// and back.
//
// A session references an account by id only. Mutable account fields are
// never embedded, so later account mutations are reflected on the next
// lookup without desynchronization.

use starter_auth_core::error::{AuthError, Result};
use starter_auth_core::model::Account;

use crate::context::AuthContext;

/// Serialize an account into its session reference.
pub fn serialize(account: &Account) -> String {
    account.id.clone()
}

/// Resolve a session reference back into the current account record.
///
/// Fails with `NotFound` when the account no longer exists (e.g. deleted
/// since the session was issued).
pub async fn deserialize(ctx: &AuthContext, account_id: &str) -> Result<Account> {
    ctx.store
        .find_by_id(account_id)
        .await?
        .ok_or(AuthError::NotFound)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use starter_auth_core::model::AccountDraft;
    use starter_auth_core::options::AuthOptions;
    use starter_auth_core::store::CredentialStore;
    use starter_auth_memory::MemoryStore;

    use super::*;
    use crate::mailer::MemoryTransport;

    #[tokio::test]
    async fn test_round_trip_reflects_later_mutations() {
        let store = Arc::new(MemoryStore::new());
        let ctx = AuthContext::new(store.clone(), MemoryTransport::new(), AuthOptions::default());

        let account = store
            .create(AccountDraft::new("a@x.com").with_password_hash("salt:key"))
            .await
            .unwrap();
        let sid = serialize(&account);

        // Mutate after serialization
        use starter_auth_core::model::AccountPatch;
        store
            .update(&account.id, AccountPatch::new().record_login())
            .await
            .unwrap();

        let current = deserialize(&ctx, &sid).await.unwrap();
        assert_eq!(current.login_count, 1);
    }

    #[tokio::test]
    async fn test_deserialize_missing_account() {
        let ctx = AuthContext::new(
            Arc::new(MemoryStore::new()),
            MemoryTransport::new(),
            AuthOptions::default(),
        );
        assert!(matches!(
            deserialize(&ctx, "no-such-id").await.unwrap_err(),
            AuthError::NotFound
        ));
    }
}
