//! Model provider interface
//!
//! The agent needs exactly one operation from a provider: complete a fully
//! rendered prompt. The completion comes back either as a single string or as
//! an incremental stream of chunks whose concatenation is the full text.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

pub mod openai;

pub use openai::OpenAiProvider;

/// Provider errors
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("provider rejected request: {0}")]
    Api(String),

    #[error("no api key configured")]
    NoApiKey,

    #[error("invalid response shape")]
    InvalidResponse,

    #[error("rate limited")]
    RateLimited,
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// A model completion, whole or chunked.
///
/// Streamed chunks arrive in completion order; the concatenation of all `Ok`
/// chunks is the full completion text.
#[derive(Debug)]
pub enum Completion {
    Text(String),
    Stream(mpsc::Receiver<Result<String>>),
}

impl Completion {
    /// Drain the completion into a single string.
    pub async fn into_text(self) -> Result<String> {
        match self {
            Completion::Text(text) => Ok(text),
            Completion::Stream(mut rx) => {
                let mut text = String::new();
                while let Some(chunk) = rx.recv().await {
                    text.push_str(&chunk?);
                }
                Ok(text)
            }
        }
    }
}

/// A language model that can be invoked with a rendered prompt string.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<Completion>;

    /// Whether the provider has credentials to make calls.
    fn is_configured(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completion_text_into_text() {
        let completion = Completion::Text("hello".to_string());
        assert_eq!(completion.into_text().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_completion_stream_into_text() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(Ok("hel".to_string())).await.unwrap();
        tx.send(Ok("lo".to_string())).await.unwrap();
        drop(tx);

        let completion = Completion::Stream(rx);
        assert_eq!(completion.into_text().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_completion_stream_propagates_error() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(Ok("partial".to_string())).await.unwrap();
        tx.send(Err(ProviderError::InvalidResponse)).await.unwrap();
        drop(tx);

        let completion = Completion::Stream(rx);
        assert!(completion.into_text().await.is_err());
    }

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::NoApiKey;
        assert_eq!(err.to_string(), "no api key configured");

        let err = ProviderError::Api("bad model".to_string());
        assert_eq!(err.to_string(), "provider rejected request: bad model");

        let err = ProviderError::RateLimited;
        assert_eq!(err.to_string(), "rate limited");
    }
}
