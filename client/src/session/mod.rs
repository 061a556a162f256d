//! Session context: the bearer token and the signed-in profile.
//!
//! The session is an explicit object handed to whoever needs it. It is
//! initialized from a [`TokenStore`] on startup, updated by `login`, and wiped
//! by `logout`. The courts view only ever reads the bearer token from it.

pub mod store;

#[cfg(feature = "http-client")]
pub mod auth;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ClientError, ClientResult};

#[cfg(feature = "http-client")]
pub use auth::{AuthClient, TokenResponse};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};

/// Signed-in user as returned by `GET /me`.
///
/// Fields this client does not use are kept in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub home_city: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }
}

pub struct SessionContext {
    store: Arc<dyn TokenStore>,
    token: Option<String>,
    profile: Option<UserProfile>,
    signed_in_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("signed_in", &self.token.is_some())
            .field("profile", &self.profile)
            .field("signed_in_at", &self.signed_in_at)
            .finish()
    }
}

impl SessionContext {
    /// Load the persisted token, if any. The profile is fetched separately.
    pub fn init(store: Arc<dyn TokenStore>) -> ClientResult<Self> {
        let token = store.load()?;
        if token.is_some() {
            info!("restored session token");
        }
        Ok(Self {
            store,
            token,
            profile: None,
            signed_in_at: None,
        })
    }

    /// Session with nothing persisted and nobody signed in.
    pub fn anonymous() -> Self {
        Self {
            store: Arc::new(MemoryTokenStore::new()),
            token: None,
            profile: None,
            signed_in_at: None,
        }
    }

    /// Record a successful sign-in and persist the token.
    pub fn login(&mut self, token: impl Into<String>, profile: Option<UserProfile>) -> ClientResult<()> {
        let token = token.into();
        if token.is_empty() {
            return Err(ClientError::unauthenticated("backend returned an empty token"));
        }
        self.store.save(&token)?;
        self.token = Some(token);
        self.profile = profile;
        self.signed_in_at = Some(chrono::Utc::now());
        info!("signed in");
        Ok(())
    }

    /// Attach the profile once `GET /me` answers.
    pub fn set_profile(&mut self, profile: Option<UserProfile>) {
        self.profile = profile;
    }

    /// Forget the token and profile, in memory and in the store.
    pub fn logout(&mut self) -> ClientResult<()> {
        self.token = None;
        self.profile = None;
        self.signed_in_at = None;
        self.store.clear()?;
        info!("signed out");
        Ok(())
    }

    /// Bearer token for the `Authorization` header.
    pub fn bearer(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    pub fn signed_in_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.signed_in_at
    }
}

/// Gate for views that need a session. Returns the bearer token.
pub fn require_session(session: &SessionContext) -> ClientResult<&str> {
    session
        .bearer()
        .ok_or_else(|| ClientError::unauthenticated("sign in to view courts").with_operation("require_session"))
}
