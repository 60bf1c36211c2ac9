pub mod ai;
pub mod client;
pub mod config;
pub mod error;
pub mod prompt;
pub mod provider;
pub mod relay;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use ai::{CompletionBackend, DeltaStream, OllamaClient, OpenAIClient};
pub use client::{stream_reply, ChatClient, ReplyStream, Utf8Decoder};
pub use config::Config;
pub use error::{AiError, ClientError};
pub use provider::Provider;
pub use relay::{relay, RelayStream};
pub use session::{ChatSession, ReplyEvent};
pub use state::{ChatMessage, ChatRole};
