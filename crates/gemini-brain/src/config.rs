//! Configuration for GeminiBrain.

use std::env;
use std::path::Path;

/// Default system prompt file name.
pub const DEFAULT_PROMPT_FILE: &str = "SYSTEM_PROMPT.md";

/// Built-in system prompt used when neither the env var nor the prompt file
/// provides one.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are Solace, a warm and patient companion. Listen carefully, comfort \
people who are hurting, and answer every question as fully as you can.

Formatting:
- Use short, clearly separated paragraphs
- Put different ideas on their own lines
- Be clear and direct; avoid long unbroken blocks of text
- Always answer with warmth and encouragement";

/// Configuration for GeminiBrain.
#[derive(Debug, Clone)]
pub struct GeminiBrainConfig {
    /// Generative-language API base URL.
    pub base_url: String,

    /// Ordered API key pool. Empty pool is a designed degraded mode, not
    /// an error.
    pub api_keys: Vec<String>,

    /// Fixed model tried when discovery yields nothing usable.
    pub fallback_model: String,

    /// System prompt prepended to every outbound prompt.
    pub system_prompt: String,
}

impl Default for GeminiBrainConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_keys: Vec::new(),
            fallback_model: "gemini-pro".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl GeminiBrainConfig {
    /// Create configuration from environment variables.
    ///
    /// Recognized variables, all optional:
    /// - `GEMINI_API_KEY` - single API key, tried first
    /// - `GEMINI_API_KEYS` - comma-separated key pool
    /// - `GEMINI_BASE_URL` - API base URL
    /// - `GEMINI_FALLBACK_MODEL` - fixed fallback model (default: gemini-pro)
    /// - `GEMINI_SYSTEM_PROMPT` - system prompt (overrides the prompt file)
    /// - `GEMINI_PROMPT_FILE` - path to a prompt file (default: SYSTEM_PROMPT.md)
    ///
    /// A missing key pool is not an error; the brain answers with its
    /// not-configured reply instead.
    pub fn from_env() -> Self {
        let base_url = env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string());

        let mut api_keys: Vec<String> = env::var("GEMINI_API_KEYS")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|key| !key.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        // The single-key variable goes to the front of the pool unless the
        // list already names it.
        if let Ok(key) = env::var("GEMINI_API_KEY") {
            let key = key.trim().to_string();
            if !key.is_empty() && !api_keys.contains(&key) {
                api_keys.insert(0, key);
            }
        }

        let fallback_model =
            env::var("GEMINI_FALLBACK_MODEL").unwrap_or_else(|_| "gemini-pro".to_string());

        // System prompt: env var takes precedence, then the prompt file,
        // then the built-in default.
        let system_prompt = env::var("GEMINI_SYSTEM_PROMPT").ok().unwrap_or_else(|| {
            let prompt_file =
                env::var("GEMINI_PROMPT_FILE").unwrap_or_else(|_| DEFAULT_PROMPT_FILE.to_string());
            load_prompt_file(&prompt_file).unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string())
        });

        Self {
            base_url,
            api_keys,
            fallback_model,
            system_prompt,
        }
    }

    /// Create a new config builder.
    pub fn builder() -> GeminiBrainConfigBuilder {
        GeminiBrainConfigBuilder::default()
    }
}

/// Builder for GeminiBrainConfig.
#[derive(Debug, Default)]
pub struct GeminiBrainConfigBuilder {
    config: GeminiBrainConfig,
}

impl GeminiBrainConfigBuilder {
    /// Set the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Append one API key to the pool.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_keys.push(key.into());
        self
    }

    /// Replace the key pool.
    pub fn api_keys(mut self, keys: Vec<String>) -> Self {
        self.config.api_keys = keys;
        self
    }

    /// Set the fixed fallback model.
    pub fn fallback_model(mut self, model: impl Into<String>) -> Self {
        self.config.fallback_model = model.into();
        self
    }

    /// Set the system prompt.
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> GeminiBrainConfig {
        self.config
    }
}

/// Load a prompt file, returning None if not found or empty.
fn load_prompt_file(path: impl AsRef<Path>) -> Option<String> {
    match std::fs::read_to_string(path.as_ref()) {
        Ok(content) => {
            let trimmed = content.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Err(_) => None,
    }
}
