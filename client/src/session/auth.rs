//! Sign-in, sign-up and profile endpoints.

use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{SessionContext, UserProfile};
use crate::error::{ClientError, ClientResult};
use crate::http::BackendClient;

pub const TOKEN_PATH: &str = "/auth/token";
pub const SIGNUP_PATH: &str = "/auth/signup";
pub const ME_PATH: &str = "/me";

/// Body of a successful `/auth/token` or `/auth/signup` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthClient {
    backend: BackendClient,
}

impl AuthClient {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }

    /// Password grant. The backend expects the email in the `username` field.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<TokenResponse> {
        let request = self
            .backend
            .post(TOKEN_PATH, None)?
            .form(&[("username", email), ("password", password)]);
        self.backend.send_json(request, "login", TOKEN_PATH).await
    }

    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> ClientResult<TokenResponse> {
        let form = Form::new()
            .text("email", email.to_string())
            .text("password", password.to_string())
            .text("display_name", display_name.to_string());
        let request = self.backend.post(SIGNUP_PATH, None)?.multipart(form);
        self.backend.send_json(request, "signup", SIGNUP_PATH).await
    }

    pub async fn me(&self, bearer: &str) -> ClientResult<UserProfile> {
        let request = self.backend.get(ME_PATH, Some(bearer))?;
        self.backend.send_json(request, "me", ME_PATH).await
    }

    /// Log in, persist the token into `session` and try to fetch the profile.
    ///
    /// A failing `/me` leaves the session signed in without a profile.
    pub async fn sign_in(
        &self,
        session: &mut SessionContext,
        email: &str,
        password: &str,
    ) -> ClientResult<()> {
        let token = self.login(email, password).await?;
        self.establish(session, token).await
    }

    /// Sign up and sign in with the returned token.
    pub async fn register(
        &self,
        session: &mut SessionContext,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> ClientResult<()> {
        let token = self.signup(email, password, display_name).await?;
        self.establish(session, token).await
    }

    /// Fetch the profile for a restored token.
    ///
    /// An expired token (401) signs the session out.
    pub async fn refresh_profile(&self, session: &mut SessionContext) -> ClientResult<()> {
        let Some(bearer) = session.bearer().map(str::to_string) else {
            return Ok(());
        };
        match self.me(&bearer).await {
            Ok(profile) => {
                session.set_profile(Some(profile));
                Ok(())
            }
            Err(err) if err.status() == Some(401) => {
                warn!("stored token rejected, signing out");
                session.logout()
            }
            Err(err) => Err(err),
        }
    }

    async fn establish(&self, session: &mut SessionContext, token: TokenResponse) -> ClientResult<()> {
        if token.access_token.is_empty() {
            return Err(ClientError::unauthenticated("empty access token").with_operation("login"));
        }
        let profile = match self.me(&token.access_token).await {
            Ok(profile) => Some(profile),
            Err(err) => {
                warn!(error = %err, "profile fetch failed after sign-in");
                None
            }
        };
        session.login(token.access_token, profile)?;
        info!("session established");
        Ok(())
    }
}
