// Top-level configuration for starter-auth.

use serde::{Deserialize, Serialize};

/// Configuration shared by all auth components.
///
/// Defaults match the application this library was extracted from: scrypt
/// local credentials, 1-hour reset tokens with 24 bytes of entropy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthOptions {
    /// App name for branding in notification emails.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// `From` address for transactional mail.
    #[serde(default = "default_sender_address")]
    pub sender_address: String,

    /// Minimum accepted password length on signup / change / reset.
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,

    /// Maximum accepted password length.
    #[serde(default = "default_max_password_length")]
    pub max_password_length: usize,

    /// How long an issued password-reset token stays valid, in seconds.
    #[serde(default = "default_reset_token_ttl_secs")]
    pub reset_token_ttl_secs: i64,

    /// Entropy of a password-reset token, in bytes (hex-encoded on the wire).
    #[serde(default = "default_reset_token_bytes")]
    pub reset_token_bytes: usize,
}

fn default_app_name() -> String {
    "Starter Auth".into()
}

fn default_sender_address() -> String {
    "Mailing <mailing@starter.com>".into()
}

fn default_min_password_length() -> usize {
    8
}

fn default_max_password_length() -> usize {
    128
}

fn default_reset_token_ttl_secs() -> i64 {
    60 * 60
}

fn default_reset_token_bytes() -> usize {
    24
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            sender_address: default_sender_address(),
            min_password_length: default_min_password_length(),
            max_password_length: default_max_password_length(),
            reset_token_ttl_secs: default_reset_token_ttl_secs(),
            reset_token_bytes: default_reset_token_bytes(),
        }
    }
}

impl AuthOptions {
    /// Set the application name used in email copy.
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Set the sender address for transactional mail.
    pub fn with_sender_address(mut self, address: impl Into<String>) -> Self {
        self.sender_address = address.into();
        self
    }

    /// Set the reset-token lifetime in seconds.
    pub fn with_reset_token_ttl_secs(mut self, secs: i64) -> Self {
        self.reset_token_ttl_secs = secs;
        self
    }
}
