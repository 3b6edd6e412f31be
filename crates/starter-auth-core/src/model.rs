// The account model: one record per user holding the local credential,
// per-provider OAuth links, advisory profile data, and the in-flight
// password-reset token.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

/// OAuth providers an account can be linked to.
///
/// Local email/password sign-in is not a provider link; it is represented by
/// `Account::password_hash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Facebook,
    Github,
    Twitter,
    Google,
    Linkedin,
}

impl Provider {
    pub const ALL: [Provider; 5] = [
        Provider::Facebook,
        Provider::Github,
        Provider::Twitter,
        Provider::Google,
        Provider::Linkedin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Facebook => "facebook",
            Provider::Github => "github",
            Provider::Twitter => "twitter",
            Provider::Google => "google",
            Provider::Linkedin => "linkedin",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "facebook" => Ok(Provider::Facebook),
            "github" => Ok(Provider::Github),
            "twitter" => Ok(Provider::Twitter),
            "google" => Ok(Provider::Google),
            "linkedin" => Ok(Provider::Linkedin),
            other => Err(format!("Unknown provider: {other}")),
        }
    }
}

/// A provider identity bound to an account, with the stored OAuth tokens.
///
/// `(provider, external_id)` is unique across all accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderLink {
    /// Provider-specific user identifier (e.g. GitHub id, Google sub).
    pub external_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl ProviderLink {
    pub fn new(external_id: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            access_token: None,
            refresh_token: None,
        }
    }

    pub fn with_tokens(
        mut self,
        access_token: Option<String>,
        refresh_token: Option<String>,
    ) -> Self {
        self.access_token = access_token;
        self.refresh_token = refresh_token;
        self
    }
}

/// Free-form display attributes. Advisory, never authoritative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Profile {
    /// Fill every unset field from `other`, leaving set fields untouched.
    ///
    /// Used when linking an OAuth identity: provider profile data only fills
    /// the gaps in what the user has already entered.
    pub fn fill_missing_from(&mut self, other: &Profile) {
        if self.name.is_none() {
            self.name = other.name.clone();
        }
        if self.picture.is_none() {
            self.picture = other.picture.clone();
        }
        if self.gender.is_none() {
            self.gender = other.gender.clone();
        }
        if self.location.is_none() {
            self.location = other.location.clone();
        }
    }
}

/// A single-use password-reset token with its wall-clock expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl ResetToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// The central entity: a user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Opaque unique identifier, immutable, assigned at creation.
    pub id: String,
    /// Unique, lowercased before any lookup or storage.
    pub email: String,
    /// Absent means no local-login credential; the account authenticates via
    /// a linked provider instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub provider_links: BTreeMap<Provider, ProviderLink>,
    #[serde(default)]
    pub profile: Profile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<ResetToken>,
    pub login_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Whether the account has a local credential set.
    pub fn has_password(&self) -> bool {
        self.password_hash
            .as_deref()
            .map(|h| !h.is_empty())
            .unwrap_or(false)
    }

    /// The link for a given provider, if any.
    pub fn link(&self, provider: Provider) -> Option<&ProviderLink> {
        self.provider_links.get(&provider)
    }

    /// Whether the account is reachable: a local credential or at least one
    /// provider link exists. Accounts violating this must not be persisted.
    pub fn is_reachable(&self) -> bool {
        self.has_password() || !self.provider_links.is_empty()
    }

    /// The reset token, treating an expired token as absent.
    pub fn valid_reset_token(&self, now: DateTime<Utc>) -> Option<&ResetToken> {
        self.reset_token.as_ref().filter(|t| !t.is_expired(now))
    }

    /// Gravatar URL for this account's email.
    pub fn gravatar_url(&self, size: u32) -> String {
        if self.email.is_empty() {
            return format!("https://gravatar.com/avatar/?s={size}&d=retro");
        }
        let digest = Md5::digest(self.email.as_bytes());
        format!("https://gravatar.com/avatar/{}?s={size}&d=retro", hex::encode(digest))
    }

    /// Display picture: the profile picture if set, otherwise the gravatar.
    pub fn profile_picture(&self, size: u32) -> String {
        match &self.profile.picture {
            Some(p) => p.clone(),
            None => self.gravatar_url(size),
        }
    }
}

// ─── Draft & Patch ───────────────────────────────────────────────

/// Input for creating an account. The store assigns id and timestamps.
#[derive(Debug, Clone, Default)]
pub struct AccountDraft {
    pub email: String,
    pub password_hash: Option<String>,
    pub provider_links: BTreeMap<Provider, ProviderLink>,
    pub profile: Profile,
}

impl AccountDraft {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Default::default()
        }
    }

    pub fn with_password_hash(mut self, hash: impl Into<String>) -> Self {
        self.password_hash = Some(hash.into());
        self
    }

    pub fn with_link(mut self, provider: Provider, link: ProviderLink) -> Self {
        self.provider_links.insert(provider, link);
        self
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }
}

/// A partial update to an account. Unset fields are left untouched.
///
/// Password changes must arrive here already hashed; the store never sees
/// plaintext.
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    /// New email (will be lowercased; uniqueness re-checked).
    pub email: Option<String>,
    /// `Some(None)` clears the local credential.
    pub password_hash: Option<Option<String>>,
    /// Provider links to add or replace (uniqueness re-checked).
    pub set_links: BTreeMap<Provider, ProviderLink>,
    /// Provider links to remove.
    pub remove_links: Vec<Provider>,
    /// Full profile replacement.
    pub profile: Option<Profile>,
    /// `Some(None)` clears the reset token.
    pub reset_token: Option<Option<ResetToken>>,
    /// When set, the patch only applies if the account currently holds this
    /// unexpired reset token. Makes token consumption single-use under
    /// concurrency: two racing consumers serialize on the store's write lock
    /// and the loser's expectation no longer holds.
    pub expected_reset_token: Option<String>,
    /// Increment the login counter by one.
    pub increment_login_count: bool,
}

impl AccountPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn set_password_hash(mut self, hash: impl Into<String>) -> Self {
        self.password_hash = Some(Some(hash.into()));
        self
    }

    pub fn set_link(mut self, provider: Provider, link: ProviderLink) -> Self {
        self.set_links.insert(provider, link);
        self
    }

    pub fn remove_link(mut self, provider: Provider) -> Self {
        self.remove_links.push(provider);
        self
    }

    pub fn set_profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn set_reset_token(mut self, token: ResetToken) -> Self {
        self.reset_token = Some(Some(token));
        self
    }

    pub fn clear_reset_token(mut self) -> Self {
        self.reset_token = Some(None);
        self
    }

    /// Apply this patch only if `token` is still the account's valid reset
    /// token at write time.
    pub fn if_reset_token(mut self, token: impl Into<String>) -> Self {
        self.expected_reset_token = Some(token.into());
        self
    }

    pub fn record_login(mut self) -> Self {
        self.increment_login_count = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        let now = Utc::now();
        Account {
            id: "a1".into(),
            email: "alice@example.com".into(),
            password_hash: Some("salt:key".into()),
            provider_links: BTreeMap::new(),
            profile: Profile::default(),
            reset_token: None,
            login_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_provider_round_trip() {
        for p in Provider::ALL {
            assert_eq!(p.as_str().parse::<Provider>().unwrap(), p);
        }
        assert!("myspace".parse::<Provider>().is_err());
    }

    #[test]
    fn test_has_password_ignores_empty_hash() {
        let mut a = account();
        assert!(a.has_password());
        a.password_hash = Some(String::new());
        assert!(!a.has_password());
        a.password_hash = None;
        assert!(!a.has_password());
    }

    #[test]
    fn test_reachability() {
        let mut a = account();
        assert!(a.is_reachable());
        a.password_hash = None;
        assert!(!a.is_reachable());
        a.provider_links
            .insert(Provider::Github, ProviderLink::new("42"));
        assert!(a.is_reachable());
    }

    #[test]
    fn test_expired_reset_token_is_absent() {
        let mut a = account();
        let now = Utc::now();
        a.reset_token = Some(ResetToken {
            token: "t".into(),
            expires_at: now - chrono::TimeDelta::seconds(1),
        });
        assert!(a.valid_reset_token(now).is_none());

        a.reset_token = Some(ResetToken {
            token: "t".into(),
            expires_at: now + chrono::TimeDelta::hours(1),
        });
        assert!(a.valid_reset_token(now).is_some());
    }

    #[test]
    fn test_gravatar_url() {
        let a = account();
        let url = a.gravatar_url(200);
        // md5("alice@example.com")
        assert_eq!(
            url,
            "https://gravatar.com/avatar/c160f8cc69a4f0bf2b0362752353d060?s=200&d=retro"
        );
    }

    #[test]
    fn test_profile_picture_prefers_explicit_picture() {
        let mut a = account();
        assert!(a.profile_picture(100).contains("gravatar.com"));
        a.profile.picture = Some("https://cdn.example.com/me.png".into());
        assert_eq!(a.profile_picture(100), "https://cdn.example.com/me.png");
    }

    #[test]
    fn test_profile_fill_missing() {
        let mut p = Profile {
            name: Some("Alice".into()),
            ..Default::default()
        };
        let snapshot = Profile {
            name: Some("Alice Smith".into()),
            picture: Some("pic".into()),
            gender: None,
            location: Some("Oslo".into()),
        };
        p.fill_missing_from(&snapshot);
        // Existing name untouched, gaps filled.
        assert_eq!(p.name.as_deref(), Some("Alice"));
        assert_eq!(p.picture.as_deref(), Some("pic"));
        assert_eq!(p.location.as_deref(), Some("Oslo"));
    }

    #[test]
    fn test_account_serde_camel_case() {
        let a = account();
        let json = serde_json::to_value(&a).unwrap();
        assert!(json.get("passwordHash").is_some());
        assert!(json.get("loginCount").is_some());
        assert!(json.get("createdAt").is_some());
        // Cleared optionals are omitted
        assert!(json.get("resetToken").is_none());
    }
}
