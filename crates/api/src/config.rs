//! Server configuration from environment variables.

use std::env;
use std::path::PathBuf;

use tracing::warn;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_SECRET: &str = "change-this-secret-in-production";

/// Runtime configuration for the API server.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Socket address to listen on.
    pub addr: String,

    /// HS256 signing secret for session tokens.
    pub jwt_secret: String,

    /// Directory holding the flat-file stores.
    pub data_dir: PathBuf,

    /// Google OAuth client id, when federated login is configured.
    pub google_client_id: Option<String>,

    /// Google OAuth client secret.
    pub google_client_secret: Option<String>,

    /// Public base URL used to build the OAuth redirect URI.
    pub public_url: String,

    /// True when running in development mode.
    pub development: bool,
}

impl AppConfig {
    /// Read configuration from the environment.
    ///
    /// Recognized variables: `SOLACE_ADDR` (or `PORT`), `JWT_SECRET` (falls
    /// back to `SECRET_KEY`), `SOLACE_DATA_DIR`, `GOOGLE_CLIENT_ID`,
    /// `GOOGLE_CLIENT_SECRET`, `SOLACE_PUBLIC_URL`, `SOLACE_ENV`.
    pub fn from_env() -> Self {
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let addr = env::var("SOLACE_ADDR").unwrap_or_else(|_| format!("0.0.0.0:{port}"));

        let jwt_secret = env::var("JWT_SECRET")
            .or_else(|_| env::var("SECRET_KEY"))
            .unwrap_or_else(|_| {
                warn!("JWT_SECRET not set, using an insecure default");
                DEFAULT_SECRET.to_string()
            });

        let data_dir = env::var("SOLACE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        let google_client_id = env::var("GOOGLE_CLIENT_ID")
            .ok()
            .filter(|id| !id.is_empty());
        let google_client_secret = env::var("GOOGLE_CLIENT_SECRET")
            .ok()
            .filter(|secret| !secret.is_empty());

        let public_url = env::var("SOLACE_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"));

        let development = env::var("SOLACE_ENV")
            .map(|mode| mode == "development")
            .unwrap_or(false);

        Self {
            addr,
            jwt_secret,
            data_dir,
            google_client_id,
            google_client_secret,
            public_url,
            development,
        }
    }

    /// Redirect URI registered with Google for the code-exchange flow.
    pub fn google_redirect_uri(&self) -> String {
        format!(
            "{}/auth/google/callback",
            self.public_url.trim_end_matches('/')
        )
    }
}
