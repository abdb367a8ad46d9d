//! GeminiBrain: key rotation and endpoint fallback.

use std::time::Duration;

use reqwest::Client;
use store::Turn;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::api_types::{GenerateContentRequest, GenerateContentResponse, ListModelsResponse};
use crate::config::GeminiBrainConfig;
use crate::error::BrainError;
use crate::prompt::build_prompt;

/// Reply returned when the key pool is empty.
pub const NOT_CONFIGURED_REPLY: &str = "Sorry, the AI service is not configured right now. \
     Please set up a Gemini API key and try again later.";

/// Reply returned when every key and strategy failed.
pub const EXHAUSTED_REPLY: &str = "Sorry, something went wrong while processing your message. \
     Please try again in a moment. Whatever you are carrying right now, \
     you do not have to carry it alone.";

const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);
const GENERATE_TIMEOUT: Duration = Duration::from_secs(30);

/// Primary and secondary API versions tried for a discovered model.
const PRIMARY_VERSION: &str = "v1";
const SECONDARY_VERSION: &str = "v1beta";

/// Outbound gateway to the generative-language API.
///
/// Holds the key pool and a process-wide rotation cursor: the cursor names
/// the key tried first on the next request and only advances past keys that
/// failed, so a repeatedly failing key is deprioritized across requests.
/// The cursor lock is never held across an in-flight call.
pub struct GeminiBrain {
    client: Client,
    config: GeminiBrainConfig,
    cursor: Mutex<usize>,
}

impl GeminiBrain {
    /// Create a new brain with the given configuration.
    pub fn new(config: GeminiBrainConfig) -> Result<Self, BrainError> {
        let client = Client::builder()
            .build()
            .map_err(|err| BrainError::Configuration(format!("failed to create HTTP client: {err}")))?;

        Ok(Self {
            client,
            config,
            cursor: Mutex::new(0),
        })
    }

    /// Create a brain from environment variables.
    ///
    /// See [`GeminiBrainConfig::from_env`] for the recognized variables.
    pub fn from_env() -> Result<Self, BrainError> {
        Self::new(GeminiBrainConfig::from_env())
    }

    /// Whether at least one API key is configured.
    pub fn is_configured(&self) -> bool {
        !self.config.api_keys.is_empty()
    }

    /// Current rotation cursor position.
    pub async fn cursor(&self) -> usize {
        *self.cursor.lock().await
    }

    /// Produce an assistant reply for `message` given the recent transcript.
    ///
    /// Never fails: upstream trouble degrades to [`NOT_CONFIGURED_REPLY`]
    /// (empty pool, no network traffic) or [`EXHAUSTED_REPLY`] (full failed
    /// pass over the pool). On success the cursor rests on the winning key.
    pub async fn reply(&self, history: &[Turn], message: &str) -> String {
        let pool = &self.config.api_keys;
        if pool.is_empty() {
            debug!("no API keys configured, returning static reply");
            return NOT_CONFIGURED_REPLY.to_string();
        }

        let prompt = build_prompt(&self.config.system_prompt, history, message);

        for attempt in 0..pool.len() {
            let index = { *self.cursor.lock().await % pool.len() };
            let key = &pool[index];

            match self.attempt_with_key(key, &prompt).await {
                Ok(text) => {
                    debug!(attempt, key_index = index, "reply produced");
                    return text;
                }
                Err(err) => {
                    warn!(attempt, key_index = index, error = %err, "key failed, rotating");
                    let mut cursor = self.cursor.lock().await;
                    *cursor = (*cursor + 1) % pool.len();
                }
            }
        }

        warn!("all API keys exhausted, returning degraded reply");
        EXHAUSTED_REPLY.to_string()
    }

    /// One key's full attempt: discovery plus both API versions, then the
    /// fixed fallback model.
    async fn attempt_with_key(&self, key: &str, prompt: &str) -> Result<String, BrainError> {
        let strategy_a_error = match self.discover_model(key).await {
            Ok(model) => {
                match self.generate(key, &model, PRIMARY_VERSION, prompt).await {
                    Ok(text) => return Ok(text),
                    Err(err) => {
                        debug!(model = %model, error = %err, "primary version failed, retrying secondary");
                    }
                }
                match self.generate(key, &model, SECONDARY_VERSION, prompt).await {
                    Ok(text) => return Ok(text),
                    Err(err) => err,
                }
            }
            Err(err) => err,
        };

        debug!(error = %strategy_a_error, "discovery path failed, trying fixed fallback model");

        self.generate(
            key,
            &self.config.fallback_model,
            SECONDARY_VERSION,
            prompt,
        )
        .await
    }

    /// List models and pick the first one that supports content generation.
    async fn discover_model(&self, key: &str) -> Result<String, BrainError> {
        let url = format!(
            "{}/{PRIMARY_VERSION}/models",
            self.config.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .get(&url)
            .query(&[("key", key)])
            .timeout(DISCOVERY_TIMEOUT)
            .send()
            .await
            .map_err(|err| BrainError::Network(err.to_string()))?;

        if !response.status().is_success() {
            return Err(BrainError::Upstream {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let listing: ListModelsResponse = response
            .json()
            .await
            .map_err(|err| BrainError::Network(err.to_string()))?;

        listing
            .models
            .iter()
            .find(|model| model.supports_generation())
            .map(|model| model.short_name().to_string())
            .ok_or(BrainError::NoAvailableModel)
    }

    /// Call generateContent for one model on one API version.
    async fn generate(
        &self,
        key: &str,
        model: &str,
        version: &str,
        prompt: &str,
    ) -> Result<String, BrainError> {
        let url = format!(
            "{}/{version}/models/{model}:generateContent",
            self.config.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", key)])
            .json(&GenerateContentRequest::from_prompt(prompt))
            .timeout(GENERATE_TIMEOUT)
            .send()
            .await
            .map_err(|err| BrainError::Network(err.to_string()))?;

        if !response.status().is_success() {
            return Err(BrainError::Upstream {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| BrainError::Network(err.to_string()))?;

        payload.first_text().ok_or(BrainError::EmptyReply)
    }
}
