//! Partial-response streaming

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures::StreamExt;
use tokio_stream::Stream;

use crate::error::Error;
use crate::providers::TextGenerationProvider;
use crate::types::{ClientConfig, GenerationConfig, GenerationRequest, Model};

/// Leading marker of the configuration-error element
pub const CONFIG_ERROR_MARKER: &str = "⚠️ Error de configuración";

/// Leading marker of the transport-error element
pub const ERROR_MARKER: &str = "❌ Error";

/// Each item is the full response so far, never just the newest fragment
pub type PartialResponseStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Turns a provider's segment stream into growing partial responses
#[derive(Clone)]
pub struct ResponseStreamer {
    provider: Arc<dyn TextGenerationProvider>,
    model: Model,
    credential: Option<String>,
    credential_env_var: String,
    generation: GenerationConfig,
    idle_timeout: Duration,
}

impl ResponseStreamer {
    pub fn new(provider: Arc<dyn TextGenerationProvider>, config: &ClientConfig) -> Self {
        Self {
            provider,
            model: config.model.clone(),
            credential: config.credential().map(str::to_string),
            credential_env_var: config.credential_env_var.clone(),
            generation: config.generation.clone(),
            idle_timeout: config.idle_timeout,
        }
    }

    /// Stream the response to a formatted prompt.
    ///
    /// Errors never escape: they end the stream with one message element.
    pub fn stream(&self, prompt: String) -> PartialResponseStream {
        let Some(credential) = self.credential.clone() else {
            let message = config_error_message(&self.credential_env_var);
            tracing::warn!(env_var = %self.credential_env_var, "no credential configured");
            return Box::pin(futures::stream::once(async move { message }));
        };

        let provider = Arc::clone(&self.provider);
        let model = self.model.clone();
        let generation = self.generation.clone();
        let idle_timeout = self.idle_timeout;

        Box::pin(stream! {
            tracing::debug!(model = %model.id, prompt_len = prompt.len(), "starting generation");

            let request = GenerationRequest {
                model: &model,
                prompt: &prompt,
                generation: &generation,
                credential: &credential,
            };

            let mut segments = match provider.stream(request).await {
                Ok(segments) => segments,
                Err(e) => {
                    tracing::warn!(retryable = e.is_retryable(), "generation request failed: {}", e);
                    yield error_message(&e);
                    return;
                }
            };

            let mut partial = String::new();
            let mut count = 0usize;
            loop {
                let next = match tokio::time::timeout(idle_timeout, segments.next()).await {
                    Ok(next) => next,
                    Err(_) => Some(Err(Error::Timeout(idle_timeout))),
                };

                match next {
                    Some(Ok(segment)) => {
                        count += 1;
                        partial.push_str(&segment);
                        yield partial.clone();
                    }
                    Some(Err(e)) => {
                        tracing::warn!(
                            retryable = e.is_retryable(),
                            segments = count,
                            "generation stream failed: {}",
                            e
                        );
                        yield error_message(&e);
                        return;
                    }
                    None => break,
                }
            }

            tracing::debug!(segments = count, response_len = partial.len(), "generation finished");
        })
    }
}

/// Chat-visible text for a missing credential
pub fn config_error_message(env_var: &str) -> String {
    format!(
        "{CONFIG_ERROR_MARKER}: {env_var} no está definido. Por favor configura la variable de entorno."
    )
}

/// Chat-visible text for a failed generation
pub fn error_message(error: &Error) -> String {
    format!("{ERROR_MARKER}: {error}. Intenta de nuevo más tarde.")
}

/// Whether an element produced by [`ResponseStreamer::stream`] is an error report
pub fn is_error_element(text: &str) -> bool {
    text.starts_with(CONFIG_ERROR_MARKER) || text.starts_with(ERROR_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::SegmentStream;
    use crate::Result;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    enum Step {
        Segment(&'static str),
        Fail(&'static str),
        Stall,
    }

    /// A mock provider that replays scripted steps and records every call.
    struct MockProvider {
        steps: Mutex<Option<Vec<Step>>>,
        fail_on_connect: bool,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl MockProvider {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: Mutex::new(Some(steps)),
                fail_on_connect: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing_on_connect() -> Self {
            Self {
                fail_on_connect: true,
                ..Self::new(vec![])
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    #[async_trait]
    impl TextGenerationProvider for MockProvider {
        async fn stream(&self, request: GenerationRequest<'_>) -> Result<SegmentStream> {
            self.calls
                .lock()
                .push((request.prompt.to_string(), request.credential.to_string()));

            if self.fail_on_connect {
                return Err(Error::Auth("401 Unauthorized: Invalid credentials".into()));
            }

            let steps = self.steps.lock().take().unwrap_or_default();
            let stream: SegmentStream = Box::pin(async_stream::stream! {
                for step in steps {
                    match step {
                        Step::Segment(text) => yield Ok(text.to_string()),
                        Step::Fail(message) => yield Err(Error::Sse(message.to_string())),
                        Step::Stall => futures::future::pending::<()>().await,
                    }
                }
            });
            Ok(stream)
        }
    }

    fn streamer(provider: Arc<MockProvider>, credential: Option<&str>) -> ResponseStreamer {
        let config = ClientConfig::new(credential.map(str::to_string));
        ResponseStreamer::new(provider, &config)
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_call() {
        let provider = Arc::new(MockProvider::new(vec![Step::Segment("Hola")]));
        let items: Vec<String> = streamer(provider.clone(), None)
            .stream("prompt".into())
            .collect()
            .await;

        assert_eq!(items.len(), 1);
        assert!(items[0].starts_with(CONFIG_ERROR_MARKER));
        assert!(items[0].contains("HF_TOKEN"));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_credential_counts_as_missing() {
        let provider = Arc::new(MockProvider::new(vec![Step::Segment("Hola")]));
        let items: Vec<String> = streamer(provider.clone(), Some("   "))
            .stream("prompt".into())
            .collect()
            .await;

        assert_eq!(items.len(), 1);
        assert!(is_error_element(&items[0]));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_partials_grow_monotonically() {
        let provider = Arc::new(MockProvider::new(vec![
            Step::Segment("Hola"),
            Step::Segment(", "),
            Step::Segment("mundo"),
        ]));
        let items: Vec<String> = streamer(provider.clone(), Some("hf_test"))
            .stream("<s>[INST] hola [/INST]".into())
            .collect()
            .await;

        assert_eq!(items, vec!["Hola", "Hola, ", "Hola, mundo"]);
        for pair in items.windows(2) {
            assert!(pair[1].starts_with(&pair[0]));
        }

        let calls = provider.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "<s>[INST] hola [/INST]");
        assert_eq!(calls[0].1, "hf_test");
    }

    #[tokio::test]
    async fn test_error_mid_stream_ends_with_one_error() {
        let provider = Arc::new(MockProvider::new(vec![
            Step::Segment("Hola"),
            Step::Fail("connection reset"),
            Step::Segment("never shown"),
        ]));
        let items: Vec<String> = streamer(provider, Some("hf_test"))
            .stream("prompt".into())
            .collect()
            .await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0], "Hola");
        assert!(items[1].starts_with(ERROR_MARKER));
        assert!(items[1].contains("connection reset"));
        assert!(!items[1].contains("never shown"));
    }

    #[tokio::test]
    async fn test_error_before_first_segment() {
        let provider = Arc::new(MockProvider::failing_on_connect());
        let items: Vec<String> = streamer(provider.clone(), Some("hf_bad"))
            .stream("prompt".into())
            .collect()
            .await;

        assert_eq!(items.len(), 1);
        assert!(items[0].starts_with(ERROR_MARKER));
        assert!(items[0].contains("Invalid credentials"));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_stream_produces_nothing() {
        let provider = Arc::new(MockProvider::new(vec![]));
        let items: Vec<String> = streamer(provider, Some("hf_test"))
            .stream("prompt".into())
            .collect()
            .await;
        assert!(items.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_stream_times_out() {
        let provider = Arc::new(MockProvider::new(vec![Step::Segment("Hola"), Step::Stall]));
        let mut config = ClientConfig::new(Some("hf_test".into()));
        config.idle_timeout = Duration::from_secs(5);
        let items: Vec<String> = ResponseStreamer::new(provider, &config)
            .stream("prompt".into())
            .collect()
            .await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0], "Hola");
        assert!(items[1].starts_with(ERROR_MARKER));
        assert!(items[1].contains("5s"));
    }

    #[tokio::test]
    async fn test_each_call_is_a_fresh_request() {
        let provider = Arc::new(MockProvider::new(vec![Step::Segment("uno")]));
        let streamer = streamer(provider.clone(), Some("hf_test"));

        let first: Vec<String> = streamer.stream("a".into()).collect().await;
        let second: Vec<String> = streamer.stream("b".into()).collect().await;

        assert_eq!(first, vec!["uno"]);
        assert!(second.is_empty());
        assert_eq!(provider.call_count(), 2);
    }

    #[test]
    fn test_error_element_detection() {
        assert!(is_error_element(&config_error_message("HF_TOKEN")));
        assert!(is_error_element(&error_message(&Error::Sse("boom".into()))));
        assert!(!is_error_element("¿Qué opinas tú?"));
    }
}
