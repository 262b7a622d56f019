//! Core types for text generation

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default model targeted on the inference service
pub const DEFAULT_MODEL_ID: &str = "mistralai/Mixtral-8x7B-Instruct-v0.1";

/// Default base URL of the Hugging Face inference service
pub const DEFAULT_BASE_URL: &str = "https://router.huggingface.co/hf-inference";

/// Environment variable holding the bearer credential
pub const DEFAULT_CREDENTIAL_ENV_VAR: &str = "HF_TOKEN";

/// Default bound on the wait for the next streamed segment
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// One completed exchange: what the user said and what the assistant answered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user: String,
    pub assistant: String,
}

impl ConversationTurn {
    /// Create a turn from a user message and the assistant reply
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
        }
    }
}

/// Sampling options, sent verbatim as the request `parameters`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Upper bound on generated tokens
    pub max_new_tokens: u32,
    /// Sampling randomness (0.0 - ~2.0)
    pub temperature: f32,
    /// Nucleus-sampling probability mass
    pub top_p: f32,
    /// Values above 1.0 discourage repeated tokens
    pub repetition_penalty: f32,
    /// Stochastic sampling instead of greedy decoding
    pub do_sample: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_new_tokens: 512,
            temperature: 0.7,
            top_p: 0.95,
            repetition_penalty: 1.1,
            do_sample: true,
        }
    }
}

/// Remote model definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Model identifier (e.g., "mistralai/Mixtral-8x7B-Instruct-v0.1")
    pub id: String,
    /// Base URL for API calls
    pub base_url: String,
}

impl Model {
    /// Create a model hosted at a given base URL
    pub fn new(id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base_url: base_url.into(),
        }
    }

    /// Endpoint the generation request is posted to
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}", self.base_url.trim_end_matches('/'), self.id)
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_ID, DEFAULT_BASE_URL)
    }
}

/// Everything a response stream needs, resolved once at startup
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Target model
    pub model: Model,
    /// Bearer credential; `None` means not configured
    pub credential: Option<String>,
    /// Where the credential is expected to come from, for error messages
    pub credential_env_var: String,
    /// Sampling options
    pub generation: GenerationConfig,
    /// Maximum wait for the next segment
    pub idle_timeout: Duration,
}

impl ClientConfig {
    /// Build a config for the default model with the given credential
    pub fn new(credential: Option<String>) -> Self {
        Self {
            model: Model::default(),
            credential,
            credential_env_var: DEFAULT_CREDENTIAL_ENV_VAR.to_string(),
            generation: GenerationConfig::default(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// The credential, if present and not blank
    pub fn credential(&self) -> Option<&str> {
        self.credential
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// A single generation request handed to a provider
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub model: &'a Model,
    pub prompt: &'a str,
    pub generation: &'a GenerationConfig,
    pub credential: &'a str,
}
