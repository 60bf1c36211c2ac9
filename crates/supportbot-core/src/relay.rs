//! The streaming pass-through between a chat frontend and a completion backend

use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::ai::CompletionBackend;
use crate::error::AiError;
use crate::prompt::build_messages;
use crate::state::ChatMessage;

/// UTF-8 reply bytes, one item per upstream text delta
pub type RelayStream = Pin<Box<dyn Stream<Item = Result<Bytes, AiError>> + Send>>;

/// Logs when the consumer goes away before upstream finished
struct DisconnectGuard {
    provider: &'static str,
    finished: bool,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        if !self.finished {
            debug!(provider = self.provider, "relay dropped before upstream finished");
        }
    }
}

/// Forward a conversation upstream and re-emit the reply as raw bytes.
///
/// Deltas are passed on one at a time in arrival order; empty ones are
/// dropped. An upstream fault becomes the final item of the stream.
pub fn relay(backend: &dyn CompletionBackend, model: &str, history: Vec<ChatMessage>) -> RelayStream {
    let provider = backend.name();
    debug!(provider, model, messages = history.len(), "opening upstream completion");
    let mut upstream = backend.stream_chat(model, build_messages(history));

    Box::pin(async_stream::stream! {
        let mut guard = DisconnectGuard { provider, finished: false };
        let mut fragments = 0usize;
        let mut bytes_sent = 0usize;

        while let Some(item) = upstream.next().await {
            match item {
                Ok(delta) => {
                    if delta.is_empty() {
                        continue;
                    }
                    fragments += 1;
                    bytes_sent += delta.len();
                    yield Ok(Bytes::from(delta));
                }
                Err(e) => {
                    guard.finished = true;
                    warn!(provider, fragments, error = %e, "upstream completion failed");
                    yield Err(e);
                    return;
                }
            }
        }

        guard.finished = true;
        info!(provider, fragments, bytes = bytes_sent, "reply relayed");
    })
}
