// Notification dispatch — transactional mail as a fire-and-forget side
// effect of auth flows.
//
// Delivery failure is downgraded to a warning and never rolls back the
// state change that triggered the notification: a password reset that
// succeeds but whose email fails to send is still a successful reset.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use starter_auth_core::error::Result;
use starter_auth_core::model::Account;
use starter_auth_core::options::AuthOptions;

use crate::context::AuthContext;

/// A transactional email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
}

/// Mail transport boundary. Implementations wrap SMTP, SendGrid, etc.
///
/// `send` fails with `AuthError::Delivery` on transport failure.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: Message) -> Result<()>;
}

/// The notifications the auth flows can emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    /// A reset link was requested. `host` is the address the link points at.
    PasswordResetRequested { host: String, token: String },
    /// The account password was changed via a reset token.
    PasswordChanged,
}

/// Build the message for a notification, using the app name and sender
/// address from the options.
pub fn build_message(options: &AuthOptions, kind: &NotificationKind, account: &Account) -> Message {
    match kind {
        NotificationKind::PasswordResetRequested { host, token } => Message {
            to: account.email.clone(),
            from: options.sender_address.clone(),
            subject: format!("Reset your password on {}", options.app_name),
            body: format!(
                "You are receiving this email because you (or someone else) have requested \
                 the reset of the password for your account.\n\n\
                 Please click on the following link, or paste this into your browser to \
                 complete the process:\n\n\
                 http://{host}/reset/{token}\n\n\
                 If you did not request this, please ignore this email and your password \
                 will remain unchanged.\n"
            ),
        },
        NotificationKind::PasswordChanged => Message {
            to: account.email.clone(),
            from: options.sender_address.clone(),
            subject: format!("Your {} password has been changed", options.app_name),
            body: format!(
                "Hello,\n\n\
                 This is a confirmation that the password for your account {} has just \
                 been changed.\n",
                account.email
            ),
        },
    }
}

/// Send a notification, swallowing delivery failures.
///
/// The failure is logged as a warning; the caller's operation is unaffected.
pub async fn dispatch(ctx: &AuthContext, kind: NotificationKind, account: &Account) {
    let message = build_message(&ctx.options, &kind, account);
    if let Err(e) = ctx.transport.send(message).await {
        ctx.logger.warn(&format!(
            "notification delivery to {} failed: {e}",
            account.email
        ));
    }
}

// ─── Test transport ─────────────────────────────────────────────

/// A transport that records every message instead of sending it.
///
/// Useful in tests and local development.
#[derive(Default)]
pub struct MemoryTransport {
    sent: tokio::sync::Mutex<Vec<Message>>,
}

impl MemoryTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Messages recorded so far.
    pub async fn sent(&self) -> Vec<Message> {
        self.sent.lock().await.clone()
    }
}

impl fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTransport").finish()
    }
}

#[async_trait]
impl MailTransport for MemoryTransport {
    async fn send(&self, message: Message) -> Result<()> {
        self.sent.lock().await.push(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use starter_auth_core::error::AuthError;
    use starter_auth_core::model::Profile;

    fn account() -> Account {
        let now = Utc::now();
        Account {
            id: "a1".into(),
            email: "alice@example.com".into(),
            password_hash: Some("salt:key".into()),
            provider_links: Default::default(),
            profile: Profile::default(),
            reset_token: None,
            login_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_reset_message_contents() {
        let options = AuthOptions::default().with_app_name("Acme");
        let msg = build_message(
            &options,
            &NotificationKind::PasswordResetRequested {
                host: "acme.example".into(),
                token: "deadbeef".into(),
            },
            &account(),
        );
        assert_eq!(msg.to, "alice@example.com");
        assert_eq!(msg.subject, "Reset your password on Acme");
        assert!(msg.body.contains("http://acme.example/reset/deadbeef"));
    }

    #[test]
    fn test_changed_message_contents() {
        let options = AuthOptions::default();
        let msg = build_message(&options, &NotificationKind::PasswordChanged, &account());
        assert!(msg.subject.contains("password has been changed"));
        assert!(msg.body.contains("alice@example.com"));
    }

    struct FailingTransport;

    #[async_trait]
    impl MailTransport for FailingTransport {
        async fn send(&self, _message: Message) -> Result<()> {
            Err(AuthError::Delivery("smtp timeout".into()))
        }
    }

    #[tokio::test]
    async fn test_dispatch_swallows_delivery_failure() {
        let ctx = AuthContext::new(
            Arc::new(NoopStore),
            Arc::new(FailingTransport),
            AuthOptions::default(),
        );
        // Must not panic or propagate
        dispatch(&ctx, NotificationKind::PasswordChanged, &account()).await;
    }

    #[tokio::test]
    async fn test_memory_transport_records() {
        let transport = MemoryTransport::new();
        let ctx = AuthContext::new(Arc::new(NoopStore), transport.clone(), AuthOptions::default());
        dispatch(&ctx, NotificationKind::PasswordChanged, &account()).await;

        let sent = transport.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "alice@example.com");
    }

    /// Store stub for tests that never touch persistence.
    #[derive(Debug)]
    struct NoopStore;

    #[async_trait]
    impl starter_auth_core::store::CredentialStore for NoopStore {
        async fn create(
            &self,
            _draft: starter_auth_core::model::AccountDraft,
        ) -> Result<Account> {
            Err(AuthError::Transport("noop".into()))
        }
        async fn find_by_id(&self, _id: &str) -> Result<Option<Account>> {
            Ok(None)
        }
        async fn find_by_email(&self, _email: &str) -> Result<Option<Account>> {
            Ok(None)
        }
        async fn find_by_provider_id(
            &self,
            _provider: starter_auth_core::model::Provider,
            _external_id: &str,
        ) -> Result<Option<Account>> {
            Ok(None)
        }
        async fn find_by_reset_token(&self, _token: &str) -> Result<Option<Account>> {
            Ok(None)
        }
        async fn update(
            &self,
            _id: &str,
            _patch: starter_auth_core::model::AccountPatch,
        ) -> Result<Account> {
            Err(AuthError::NotFound)
        }
        async fn delete(&self, _id: &str) -> Result<()> {
            Ok(())
        }
        async fn count(&self) -> Result<u64> {
            Ok(0)
        }
    }
}
