// Firebase Authentication over the Identity Toolkit REST API

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::{AuthProviderError, AuthUser, IdentityProvider};
use crate::config::FirebaseConfig;

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct FirebaseAuth {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl FirebaseAuth {
    pub fn new(config: &FirebaseConfig) -> Result<Self, AuthProviderError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(AuthProviderError::MissingApiKey)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: IDENTITY_TOOLKIT_URL.to_string(),
        })
    }

    /// Point at another Identity Toolkit host (e.g. the local emulator)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, method: &str) -> String {
        format!("{}/accounts:{}?key={}", self.endpoint, method, self.api_key)
    }

    async fn post(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<String, AuthProviderError> {
        debug!(method, "Calling identity provider");
        let response = self.client.post(self.url(method)).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            Ok(text)
        } else {
            Err(rejection(status.as_u16(), &text))
        }
    }

    async fn account_call(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, AuthProviderError> {
        let text = self
            .post(
                method,
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;

        serde_json::from_str(&text).map_err(|e| AuthProviderError::Rejected {
            status: 200,
            message: format!("unreadable response: {}", e),
        })
    }
}

/// Map an error response body to a provider error
fn rejection(status: u16, body: &str) -> AuthProviderError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string());
    AuthProviderError::Rejected { status, message }
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    async fn sign_in_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, AuthProviderError> {
        self.account_call("signInWithPassword", email, password).await
    }

    async fn create_user_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, AuthProviderError> {
        self.account_call("signUp", email, password).await
    }

    async fn send_password_reset_email(&self, email: &str) -> Result<(), AuthProviderError> {
        self.post(
            "sendOobCode",
            json!({ "requestType": "PASSWORD_RESET", "email": email }),
        )
        .await
        .map(|_| ())
    }
}
