//! Google federated login.
//!
//! Verification is delegated to Google's published `tokeninfo` contract:
//! we send the ID token there, Google checks the signature against its
//! current keys, and we only confirm the audience locally.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::AuthError;

const DEFAULT_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity asserted by a verified Google ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleProfile {
    pub email: String,
    pub name: String,
}

/// Verifies Google ID tokens and exchanges OAuth authorization codes.
#[derive(Debug, Clone)]
pub struct GoogleVerifier {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    tokeninfo_url: String,
    token_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    email: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CodeExchangeResponse {
    id_token: Option<String>,
}

impl GoogleVerifier {
    /// Create a verifier for the given OAuth client.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            tokeninfo_url: DEFAULT_TOKENINFO_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
        })
    }

    /// Point both Google endpoints at a different base URL (tests).
    pub fn with_endpoint_base(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.tokeninfo_url = format!("{base}/tokeninfo");
        self.token_url = format!("{base}/token");
        self
    }

    /// The configured OAuth client id.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Verify a Google ID token and extract the asserted identity.
    ///
    /// The display name falls back to the email local part when Google did
    /// not include one, matching what the login flow shows the user.
    pub async fn verify_id_token(&self, id_token: &str) -> Result<GoogleProfile, AuthError> {
        let response = self
            .client
            .get(&self.tokeninfo_url)
            .query(&[("id_token", id_token)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            debug!(%status, "tokeninfo rejected the token");
            return Err(AuthError::GoogleRejected(format!(
                "tokeninfo returned {status}"
            )));
        }

        let info: TokenInfo = response.json().await?;

        if info.aud != self.client_id {
            return Err(AuthError::GoogleRejected(format!(
                "audience mismatch: {}",
                info.aud
            )));
        }

        let email = info
            .email
            .filter(|email| !email.is_empty())
            .ok_or_else(|| AuthError::GoogleRejected("token carries no email".to_string()))?;

        let name = info
            .name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or(&email).to_string());

        Ok(GoogleProfile { email, name })
    }

    /// Exchange an OAuth authorization code for an ID token (redirect flow).
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<String, AuthError> {
        let params = [
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ];

        let response = self.client.post(&self.token_url).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AuthError::GoogleRejected(format!(
                "code exchange returned {status}"
            )));
        }

        let body: CodeExchangeResponse = response.json().await?;
        body.id_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AuthError::GoogleRejected("exchange response carries no id_token".to_string()))
    }
}
