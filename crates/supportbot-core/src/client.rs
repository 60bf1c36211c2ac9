//! HTTP client for the relay endpoint, used by chat frontends

use std::pin::Pin;

use futures_util::{Stream, StreamExt};
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::session::ReplyEvent;
use crate::state::ChatMessage;

/// Decoded reply text, one item per received network chunk
pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<String, ClientError>> + Send>>;

/// Incremental UTF-8 decoder.
///
/// Bytes of a character split across two chunks are held back until the rest
/// arrives. Invalid sequences become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        // Incomplete character at the end: wait for more bytes
                        None => {
                            self.pending.drain(..valid);
                            break;
                        }
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush a truncated trailing character, if the stream ended mid-way
    pub fn finish(&mut self) -> String {
        let rest = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&rest).into_owned()
    }
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    endpoint: String,
}

impl ChatClient {
    pub fn new(server_url: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/api/chat", server_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST the history and hand back the reply body as decoded text
    pub async fn send(&self, history: &[ChatMessage]) -> Result<ReplyStream, ClientError> {
        let response = self.client.post(&self.endpoint).json(history).send().await?;

        if !response.status().is_success() {
            return Err(ClientError::Status(response.status().as_u16()));
        }

        let mut body = response.bytes_stream();
        Ok(Box::pin(async_stream::stream! {
            let mut decoder = Utf8Decoder::default();

            while let Some(chunk) = body.next().await {
                match chunk {
                    Ok(bytes) => {
                        let text = decoder.decode(&bytes);
                        if !text.is_empty() {
                            yield Ok(text);
                        }
                    }
                    Err(e) => {
                        yield Err(ClientError::Request(e));
                        return;
                    }
                }
            }

            let rest = decoder.finish();
            if !rest.is_empty() {
                yield Ok(rest);
            }
        }))
    }
}

/// Run one reply to completion, reporting progress through `emit`.
///
/// Exactly one terminal event (`Finished` or `Failed`) is emitted last.
pub async fn stream_reply<F>(client: &ChatClient, history: Vec<ChatMessage>, mut emit: F)
where
    F: FnMut(ReplyEvent),
{
    debug!(endpoint = client.endpoint(), messages = history.len(), "sending chat request");

    let mut reply = match client.send(&history).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!(error = %e, "chat request failed");
            emit(ReplyEvent::Failed(e.to_string()));
            return;
        }
    };

    while let Some(chunk) = reply.next().await {
        match chunk {
            Ok(text) => emit(ReplyEvent::Chunk(text)),
            Err(e) => {
                warn!(error = %e, "reply stream broke off");
                emit(ReplyEvent::Failed(e.to_string()));
                return;
            }
        }
    }

    emit(ReplyEvent::Finished);
}
