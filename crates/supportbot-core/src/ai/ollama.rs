use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{CompletionBackend, DeltaStream, LineBuffer};
use crate::error::AiError;
use crate::state::ChatMessage;

const PROVIDER: &str = "Ollama";

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

/// One NDJSON line of a streamed `/api/chat` response
#[derive(Deserialize)]
struct OllamaChatChunk {
    message: Option<OllamaChunkMessage>,
    #[serde(default)]
    done: bool,
    error: Option<String>,
}

#[derive(Deserialize)]
struct OllamaChunkMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, PartialEq)]
enum NdjsonEvent {
    Delta(String),
    Done,
    Skip,
}

fn parse_ndjson_line(line: &str) -> Result<NdjsonEvent, AiError> {
    if line.trim().is_empty() {
        return Ok(NdjsonEvent::Skip);
    }

    let chunk: OllamaChatChunk = serde_json::from_str(line).map_err(|e| AiError::Decode {
        provider: PROVIDER,
        detail: e.to_string(),
    })?;

    if let Some(error) = chunk.error {
        return Err(AiError::Decode {
            provider: PROVIDER,
            detail: error,
        });
    }

    match chunk.message {
        Some(message) if !message.content.is_empty() => Ok(NdjsonEvent::Delta(message.content)),
        _ if chunk.done => Ok(NdjsonEvent::Done),
        _ => Ok(NdjsonEvent::Skip),
    }
}

#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl CompletionBackend for OllamaClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn stream_chat(&self, model: &str, messages: Vec<ChatMessage>) -> DeltaStream {
        let client = self.client.clone();
        let url = format!("{}/api/chat", self.base_url);
        let model = model.to_string();

        Box::pin(async_stream::stream! {
            let request = OllamaChatRequest {
                model: &model,
                messages: &messages,
                stream: true,
            };

            let response = match client.post(&url).json(&request).send().await {
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
                    match parse_ndjson_line(&line) {
                        Ok(NdjsonEvent::Delta(text)) => {
                            yield Ok(text);
                        }
                        Ok(NdjsonEvent::Done) => return,
                        Ok(NdjsonEvent::Skip) => {}
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }

            if let Some(line) = lines.finish() {
                match parse_ndjson_line(&line) {
                    Ok(NdjsonEvent::Delta(text)) => {
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

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_ndjson_line() {
        assert_eq!(
            parse_ndjson_line(r#"{"message":{"role":"assistant","content":"Hi"},"done":false}"#).unwrap(),
            NdjsonEvent::Delta("Hi".to_string())
        );
        assert_eq!(
            parse_ndjson_line(r#"{"message":{"role":"assistant","content":""},"done":true}"#).unwrap(),
            NdjsonEvent::Done
        );
        assert_eq!(parse_ndjson_line("   ").unwrap(), NdjsonEvent::Skip);
        assert!(parse_ndjson_line(r#"{"error":"model not found"}"#).is_err());
    }

    #[tokio::test]
    async fn test_stream_chat_reads_ndjson() {
        let server = MockServer::start().await;
        let body = concat!(
            "{\"message\":{\"role\":\"assistant\",\"content\":\"Hello\"},\"done\":false}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\", world\"},\"done\":false}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"\"},\"done\":true}\n",
        );
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({ "model": "llama3.2", "stream": true })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
            .mount(&server)
            .await;

        let client = OllamaClient::new(&server.uri());
        let mut stream = client.stream_chat("llama3.2", vec![ChatMessage::user("Hi")]);

        let mut text = String::new();
        while let Some(delta) = stream.next().await {
            text.push_str(&delta.unwrap());
        }
        assert_eq!(text, "Hello, world");
    }

    #[tokio::test]
    async fn test_stream_chat_model_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"error":"model not found"}"#))
            .mount(&server)
            .await;

        let client = OllamaClient::new(&server.uri());
        let mut stream = client.stream_chat("missing", Vec::new());

        let first = stream.next().await;
        assert!(matches!(first, Some(Err(AiError::Api { status: 404, .. }))));
        assert!(stream.next().await.is_none());
    }
}
