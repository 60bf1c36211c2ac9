use thiserror::Error;

/// Failures talking to an upstream completion provider
#[derive(Debug, Error)]
pub enum AiError {
    #[error("request to {provider} failed: {source}")]
    Request {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} API error {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("malformed {provider} stream event: {detail}")]
    Decode {
        provider: &'static str,
        detail: String,
    },

    #[error("{0} API key not configured")]
    MissingApiKey(&'static str),
}

/// Failures talking to the relay endpoint from a chat frontend
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("relay request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("relay responded with status {0}")]
    Status(u16),
}
