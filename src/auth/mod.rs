// Authentication service - thin pass-through to the identity provider

mod firebase;

pub use firebase::FirebaseAuth;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::downloader::errors::{AppError, Result};

pub const LOGIN_FAILED_MESSAGE: &str = "Incorrect e-mail or password.";
pub const REGISTER_FAILED_MESSAGE: &str =
    "Could not create the account. Check the e-mail and password.";
pub const RESET_FAILED_MESSAGE: &str = "E-mail not found.";

/// Account payload returned by sign-in and sign-up
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthUser {
    pub local_id: String,
    pub email: String,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in: String,
}

/// Failures reported by an identity provider implementation
#[derive(Debug, Error)]
pub enum AuthProviderError {
    /// Transport failure; the request URL (which carries the API key) is stripped
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("Provider rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Identity provider API key is not configured")]
    MissingApiKey,
}

impl From<reqwest::Error> for AuthProviderError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.without_url())
    }
}

/// Boundary to the hosted identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> std::result::Result<AuthUser, AuthProviderError>;

    async fn create_user_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> std::result::Result<AuthUser, AuthProviderError>;

    async fn send_password_reset_email(
        &self,
        email: &str,
    ) -> std::result::Result<(), AuthProviderError>;
}

/// Each call wraps exactly one provider call; provider detail is dropped in
/// favour of a fixed message.
pub struct AuthService<P> {
    provider: P,
}

impl<P: IdentityProvider> AuthService<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthUser> {
        match self.provider.sign_in_with_email_and_password(email, password).await {
            Ok(user) => {
                info!(email, "Signed in");
                Ok(user)
            }
            Err(e) => {
                debug!(error = %e, "Sign-in rejected");
                Err(AppError::AuthenticationFailed(LOGIN_FAILED_MESSAGE.to_string()))
            }
        }
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<AuthUser> {
        match self.provider.create_user_with_email_and_password(email, password).await {
            Ok(user) => {
                info!(email, "Account created");
                Ok(user)
            }
            Err(e) => {
                debug!(error = %e, "Sign-up rejected");
                Err(AppError::AuthenticationFailed(REGISTER_FAILED_MESSAGE.to_string()))
            }
        }
    }

    pub async fn reset_password(&self, email: &str) -> Result<()> {
        self.provider
            .send_password_reset_email(email)
            .await
            .map(|()| info!(email, "Password reset e-mail sent"))
            .map_err(|e| {
                debug!(error = %e, "Password reset rejected");
                AppError::AuthenticationFailed(RESET_FAILED_MESSAGE.to_string())
            })
    }
}
