//! Configuration file support

use serde::{Deserialize, Serialize};
use socra_ai::GenerationConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for socra
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model to target on the inference service
    pub model: Option<String>,
    /// Base URL of the inference service
    pub base_url: Option<String>,
    /// Environment variable holding the credential
    pub credential_env_var: Option<String>,
    /// Credential (alternative to the environment variable)
    pub api_key: Option<String>,
    /// Custom system prompt file path
    pub system_prompt_file: Option<String>,
    /// Seconds to wait for the next streamed segment
    pub idle_timeout_secs: Option<u64>,
    /// Sampling options
    pub generation: Option<GenerationConfig>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("socra")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("SOCRA_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from the default location
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load config from a file, falling back to defaults when unreadable
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Create the config file with example content if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&path, example_config())?;
        Ok(path)
    }

    /// Get the credential, checking config then env
    pub fn credential(&self, env_var: &str) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| socra_ai::providers::credential_from_env(env_var))
    }

    /// Read the system prompt file, if one is configured
    pub fn system_prompt(&self) -> std::io::Result<Option<String>> {
        match self.system_prompt_file {
            Some(ref path) => fs::read_to_string(expand_home(path)).map(Some),
            None => Ok(None),
        }
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# socra configuration file
# Place at ~/.config/socra/config.toml (Linux), or point SOCRA_CONFIG_PATH at it

# Model served by the inference endpoint
model = "mistralai/Mixtral-8x7B-Instruct-v0.1"

# Inference service base URL
base_url = "https://router.huggingface.co/hf-inference"

# Environment variable holding the access token
credential_env_var = "HF_TOKEN"

# Access token (optional - prefer the environment variable)
# api_key = "hf_..."

# Custom system prompt file (optional)
# system_prompt_file = "~/.config/socra/system_prompt.txt"

# Seconds to wait for the next streamed token before giving up
idle_timeout_secs = 60

[generation]
max_new_tokens = 512
temperature = 0.7
top_p = 0.95
repetition_penalty = 1.1
do_sample = true
"#
}
