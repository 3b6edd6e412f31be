// Auth context — the fully-initialized configuration shared across request
// handlers as `Arc<AuthContext>`.

use std::fmt;
use std::sync::Arc;

use starter_auth_core::logger::AuthLogger;
use starter_auth_core::options::AuthOptions;
use starter_auth_core::store::CredentialStore;

use crate::mailer::MailTransport;

/// Everything the auth operations need: the credential store, the mail
/// transport, configuration, and a logger.
pub struct AuthContext {
    /// The credential store for account CRUD.
    pub store: Arc<dyn CredentialStore>,

    /// Transport for transactional mail.
    pub transport: Arc<dyn MailTransport>,

    /// Configuration options.
    pub options: AuthOptions,

    /// Structured logger with level filtering.
    pub logger: AuthLogger,
}

impl AuthContext {
    /// Build a shared context from its collaborators.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        transport: Arc<dyn MailTransport>,
        options: AuthOptions,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            transport,
            options,
            logger: AuthLogger::default(),
        })
    }

    /// Build a shared context with a custom logger.
    pub fn with_logger(
        store: Arc<dyn CredentialStore>,
        transport: Arc<dyn MailTransport>,
        options: AuthOptions,
        logger: AuthLogger,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            transport,
            options,
            logger,
        })
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("store", &self.store)
            .field("options", &self.options)
            .finish()
    }
}
