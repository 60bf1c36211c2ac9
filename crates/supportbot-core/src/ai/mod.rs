pub mod ollama;
pub mod openai;

pub use ollama::OllamaClient;
pub use openai::OpenAIClient;

use std::pin::Pin;

use futures_util::Stream;

use crate::error::AiError;
use crate::state::ChatMessage;

/// Incremental text deltas of one streamed completion, in arrival order
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String, AiError>> + Send>>;

/// A remote chat-completion service that can stream its output.
///
/// The returned stream is lazy: nothing is sent upstream until it is first
/// polled, and connection failures arrive as the first (and only) item.
/// Dropping the stream abandons the upstream request.
pub trait CompletionBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn stream_chat(&self, model: &str, messages: Vec<ChatMessage>) -> DeltaStream;
}

/// Splits a byte stream into text lines.
///
/// Splitting happens on raw bytes so a multi-byte character that straddles two
/// network chunks is only decoded once the whole line has arrived.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
    // Prefix of `pending` already known to hold no newline
    scanned: usize,
}

impl LineBuffer {
    /// Feed a chunk and return every line it completed, without terminators
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        let mut start = 0;
        let mut from = self.scanned;
        while let Some(offset) = self.pending[from..].iter().position(|b| *b == b'\n') {
            let end = from + offset;
            lines.push(decode_line(&self.pending[start..end]));
            start = end + 1;
            from = start;
        }

        self.pending.drain(..start);
        self.scanned = self.pending.len();
        lines
    }

    /// Whatever is left once the stream ended without a final newline
    pub fn finish(&mut self) -> Option<String> {
        self.scanned = 0;
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(decode_line(&rest))
    }
}

fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\r')
        .to_string()
}
