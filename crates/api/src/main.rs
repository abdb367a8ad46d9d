use std::net::SocketAddr;
use std::sync::Arc;

use auth::GoogleVerifier;
use axum::routing::{get, post};
use axum::Router;
use gemini_brain::GeminiBrain;
use store::{TranscriptStore, UserStore};
use tracing::{info, warn};

mod config;
mod error;
mod handlers;
mod state;

use config::AppConfig;
use state::AppState;

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/google/client-id", get(handlers::google_client_id))
        .route("/api/auth/google/callback", post(handlers::google_callback))
        .route("/auth/google/callback", get(handlers::google_redirect_callback))
        .route("/api/auth/verify", get(handlers::verify))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/profile/update", post(handlers::update_profile))
        .route("/api/chat", post(handlers::chat))
        .with_state(state)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env();
    if config.development {
        info!("running in development mode");
    }

    if let Err(err) = std::fs::create_dir_all(&config.data_dir) {
        warn!(path = %config.data_dir.display(), error = %err, "Failed to create data directory");
    }

    let users = Arc::new(UserStore::load(config.data_dir.join("users.json")));
    let transcripts = Arc::new(TranscriptStore::load(config.data_dir.join("chat_history.json")));
    info!(users = users.count().await, "stores loaded");

    let brain = GeminiBrain::from_env().expect("Failed to initialize Gemini gateway");
    if brain.is_configured() {
        info!("Gemini gateway configured");
    } else {
        warn!("No Gemini API keys configured, chat will answer with a static reply");
    }
    let brain = Arc::new(brain);

    let google = match (&config.google_client_id, &config.google_client_secret) {
        (Some(client_id), secret) => {
            match GoogleVerifier::new(client_id.clone(), secret.clone().unwrap_or_default()) {
                Ok(verifier) => Some(Arc::new(verifier)),
                Err(err) => {
                    warn!(error = %err, "Failed to initialize Google verifier, federated login disabled");
                    None
                }
            }
        }
        _ => {
            info!("Google login not configured");
            None
        }
    };

    let addr: SocketAddr = config.addr.parse().expect("Invalid SOLACE_ADDR");
    let state = AppState {
        users,
        transcripts,
        brain,
        google,
        config: Arc::new(config),
    };

    let app = router(state);
    info!(%addr, "Solace API listening");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
