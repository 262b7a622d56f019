//! Hugging Face text-generation inference provider

use std::time::Duration;

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use reqwest_eventsource::{Event, EventSource, retry::Never};
use serde::{Deserialize, Serialize};

use super::{SegmentStream, TextGenerationProvider};
use crate::{
    error::{Error, Result},
    types::{GenerationConfig, GenerationRequest},
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Hugging Face inference client
pub struct HuggingFaceProvider {
    client: reqwest::Client,
}

impl HuggingFaceProvider {
    /// Create a provider with its own HTTP client
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client))
    }

    /// Create a provider sharing an existing HTTP client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TextGenerationProvider for HuggingFaceProvider {
    async fn stream(&self, request: GenerationRequest<'_>) -> Result<SegmentStream> {
        let url = request.model.endpoint();
        tracing::debug!("Hugging Face API URL: {}", url);

        let body = build_request(request.prompt, request.generation);
        let request_builder = self
            .client
            .post(&url)
            .bearer_auth(request.credential)
            .json(&body);

        let mut event_source = EventSource::new(request_builder)
            .map_err(|e| Error::Sse(format!("Failed to create event source: {}", e)))?;
        event_source.set_retry_policy(Box::new(Never));

        Ok(Box::pin(create_stream(event_source)))
    }
}

fn build_request<'a>(prompt: &'a str, generation: &'a GenerationConfig) -> GenerateRequest<'a> {
    GenerateRequest {
        inputs: prompt,
        parameters: GenerateParameters {
            generation,
            details: false,
            return_full_text: false,
        },
        stream: true,
    }
}

fn create_stream(mut event_source: EventSource) -> impl futures::Stream<Item = Result<String>> {
    stream! {
        while let Some(event) = event_source.next().await {
            match event {
                Ok(Event::Open) => {}
                Ok(Event::Message(msg)) => match parse_event_data(&msg.data) {
                    Ok(parsed) => {
                        if let Some(segment) = parsed.segment {
                            yield Ok(segment);
                        }
                        if parsed.done {
                            break;
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                },
                // Server closed the stream without a final event
                Err(reqwest_eventsource::Error::StreamEnded) => break,
                Err(e) => {
                    yield Err(map_event_source_error(e).await);
                    break;
                }
            }
        }
        event_source.close();
    }
}

/// Outcome of one SSE `data:` payload
#[derive(Debug, PartialEq, Eq)]
struct ParsedEvent {
    segment: Option<String>,
    done: bool,
}

fn parse_event_data(data: &str) -> Result<ParsedEvent> {
    if data.trim() == "[DONE]" {
        return Ok(ParsedEvent {
            segment: None,
            done: true,
        });
    }

    match serde_json::from_str::<StreamPayload>(data)? {
        StreamPayload::Error { error, error_type } => {
            Err(Error::api(error_type.unwrap_or_default(), error))
        }
        StreamPayload::Token {
            token,
            generated_text,
        } => Ok(ParsedEvent {
            // Control tokens such as the closing `</s>` are not part of the answer
            segment: (!token.special).then_some(token.text),
            done: generated_text.is_some(),
        }),
    }
}

async fn map_event_source_error(err: reqwest_eventsource::Error) -> Error {
    match err {
        reqwest_eventsource::Error::InvalidStatusCode(status, response) => {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            let body = response.text().await.unwrap_or_default();
            status_error(status, retry_after, &body)
        }
        reqwest_eventsource::Error::InvalidContentType(content_type, response) => {
            let body = response.text().await.unwrap_or_default();
            match serde_json::from_str::<ErrorBody>(&body) {
                Ok(parsed) => Error::api(parsed.error_type.unwrap_or_default(), parsed.error),
                Err(_) => Error::UnexpectedResponse(format!(
                    "expected an event stream, got {:?}",
                    content_type
                )),
            }
        }
        reqwest_eventsource::Error::Transport(e) => Error::Http(e),
        other => Error::Sse(other.to_string()),
    }
}

fn status_error(status: StatusCode, retry_after: Option<u64>, body: &str) -> Error {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => body.trim().to_string(),
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::Auth(format!("{}: {}", status, message))
        }
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited { retry_after },
        _ => Error::api(status.as_str(), message),
    }
}

// Request types

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: GenerateParameters<'a>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct GenerateParameters<'a> {
    #[serde(flatten)]
    generation: &'a GenerationConfig,
    details: bool,
    return_full_text: bool,
}

// Streaming response types

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StreamPayload {
    Error {
        error: String,
        #[serde(default)]
        error_type: Option<String>,
    },
    Token {
        token: StreamToken,
        #[serde(default)]
        generated_text: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct StreamToken {
    text: String,
    #[serde(default)]
    special: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    error_type: Option<String>,
}
