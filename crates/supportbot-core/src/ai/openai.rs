use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{CompletionBackend, DeltaStream, LineBuffer};
use crate::error::AiError;
use crate::state::ChatMessage;

const PROVIDER: &str = "OpenAI";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

// Streaming types

#[derive(Deserialize)]
struct OpenAIStreamResponse {
    #[serde(default)]
    choices: Vec<OpenAIStreamChoice>,
    error: Option<OpenAIStreamError>,
}

#[derive(Deserialize)]
struct OpenAIStreamChoice {
    #[serde(default)]
    delta: OpenAIStreamDelta,
}

#[derive(Deserialize, Default)]
struct OpenAIStreamDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIStreamError {
    message: String,
}

#[derive(Debug, PartialEq)]
enum SseEvent {
    Delta(String),
    Done,
    Skip,
}

/// Interpret one Server-Sent Events line of a chat-completions stream
fn parse_sse_line(line: &str) -> Result<SseEvent, AiError> {
    // Comments, `event:` fields and the blank separators carry no data
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(SseEvent::Skip);
    };
    let data = data.strip_prefix(' ').unwrap_or(data);

    if data.trim() == "[DONE]" {
        return Ok(SseEvent::Done);
    }
    if data.trim().is_empty() {
        return Ok(SseEvent::Skip);
    }

    let parsed: OpenAIStreamResponse =
        serde_json::from_str(data).map_err(|e| AiError::Decode {
            provider: PROVIDER,
            detail: e.to_string(),
        })?;

    if let Some(error) = parsed.error {
        return Err(AiError::Decode {
            provider: PROVIDER,
            detail: error.message,
        });
    }

    // Only the first choice is ever requested
    match parsed.choices.into_iter().next().and_then(|c| c.delta.content) {
        Some(content) if !content.is_empty() => Ok(SseEvent::Delta(content)),
        _ => Ok(SseEvent::Skip),
    }
}

/// Client for OpenAI-compatible `/chat/completions` endpoints
#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl CompletionBackend for OpenAIClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn stream_chat(&self, model: &str, messages: Vec<ChatMessage>) -> DeltaStream {
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let url = format!("{}/chat/completions", self.base_url);
        let model = model.to_string();

        Box::pin(async_stream::stream! {
            let request = OpenAIRequest {
                model: &model,
                messages: &messages,
                stream: true,
            };

            let response = match client
                .post(&url)
                .bearer_auth(&api_key)
                .json(&request)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(source) => {
                    yield Err(AiError::Request { provider: PROVIDER, source });
                    return;
                }
            };

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                yield Err(AiError::Api { provider: PROVIDER, status, body });
                return;
            }

            let mut byte_stream = response.bytes_stream();
            let mut lines = LineBuffer::default();

            while let Some(chunk) = byte_stream.next().await {
                let chunk = match chunk {
                    Ok(bytes) => bytes,
                    Err(source) => {
                        yield Err(AiError::Request { provider: PROVIDER, source });
                        return;
                    }
                };

                for line in lines.push(&chunk) {
                    match parse_sse_line(&line) {
                        Ok(SseEvent::Delta(text)) => {
                            yield Ok(text);
                        }
                        Ok(SseEvent::Done) => return,
                        Ok(SseEvent::Skip) => {}
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }

            // Last event without a trailing newline
            if let Some(line) = lines.finish() {
                match parse_sse_line(&line) {
                    Ok(SseEvent::Delta(text)) => {
                        yield Ok(text);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        yield Err(e);
                    }
                }
            }
        })
    }
}
