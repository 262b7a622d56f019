//! Text generation provider implementations

pub mod huggingface;

use std::pin::Pin;

use async_trait::async_trait;
use tokio_stream::Stream;

use crate::{GenerationRequest, Result};

/// Raw generated text fragments, in arrival order
pub type SegmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Trait for remote text generation services
#[async_trait]
pub trait TextGenerationProvider: Send + Sync {
    /// Start a streaming generation for the request
    async fn stream(&self, request: GenerationRequest<'_>) -> Result<SegmentStream>;
}

/// Read a credential from the environment; empty values count as unset
pub fn credential_from_env(env_var: &str) -> Option<String> {
    std::env::var(env_var)
        .ok()
        .filter(|value| !value.trim().is_empty())
}
