//! OpenAI-compatible provider
//!
//! Works against any chat-completions endpoint that speaks the OpenAI wire
//! format. The rendered prompt is sent as a single user message; when
//! streaming is enabled the server-sent `data:` frames are forwarded as
//! completion chunks.

use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::{ChatModel, Completion, ProviderError, Result};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// OpenAI-compatible chat-completions provider
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    streaming: bool,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, api_base: Option<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            model: model.into(),
            temperature: 0.0,
            max_tokens: 4096,
            streaming: true,
        }
    }

    /// Set sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set completion token limit
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Enable or disable chunked streaming
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    fn build_request(&self, prompt: &str, stream: bool) -> Value {
        json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "stream": stream,
        })
    }

    async fn complete_whole(&self, prompt: &str) -> Result<Completion> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = self.build_request(prompt, false);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let json: Value = response.json().await?;

        if !status.is_success() {
            return Err(api_error(status, &json));
        }

        let content = json["choices"]
            .get(0)
            .and_then(|c| c["message"]["content"].as_str())
            .ok_or(ProviderError::InvalidResponse)?;

        Ok(Completion::Text(content.to_string()))
    }

    async fn complete_streaming(&self, prompt: &str) -> Result<Completion> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = self.build_request(prompt, true);

        let mut response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let json: Value = response.json().await?;
            return Err(api_error(status, &json));
        }

        let (tx, rx) = mpsc::channel(64);

        tokio::spawn(async move {
            let mut buffer = String::new();

            loop {
                let chunk = match response.chunk().await {
                    Ok(Some(bytes)) => bytes,
                    Ok(None) => break,
                    Err(e) => {
                        let _ = tx.send(Err(ProviderError::Request(e))).await;
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&chunk));

                // SSE frames are newline-delimited; keep the trailing
                // partial line in the buffer for the next read.
                while let Some(pos) = buffer.find('\n') {
                    let line = buffer[..pos].trim().to_string();
                    buffer.drain(..=pos);

                    match parse_sse_line(&line) {
                        SseEvent::Delta(text) => {
                            if tx.send(Ok(text)).await.is_err() {
                                return;
                            }
                        }
                        SseEvent::Done => return,
                        SseEvent::Skip => {}
                    }
                }
            }
        });

        Ok(Completion::Stream(rx))
    }
}

/// One parsed server-sent event line
#[derive(Debug, PartialEq)]
enum SseEvent {
    Delta(String),
    Done,
    Skip,
}

fn parse_sse_line(line: &str) -> SseEvent {
    let Some(payload) = line.strip_prefix("data:") else {
        return SseEvent::Skip;
    };
    let payload = payload.trim();

    if payload == "[DONE]" {
        return SseEvent::Done;
    }

    match serde_json::from_str::<Value>(payload) {
        Ok(json) => {
            let delta = json["choices"]
                .get(0)
                .and_then(|c| c["delta"]["content"].as_str());
            match delta {
                Some(text) if !text.is_empty() => SseEvent::Delta(text.to_string()),
                _ => SseEvent::Skip,
            }
        }
        Err(e) => {
            warn!("unparsable stream frame: {}", e);
            SseEvent::Skip
        }
    }
}

fn api_error(status: reqwest::StatusCode, json: &Value) -> ProviderError {
    if status.as_u16() == 429 {
        return ProviderError::RateLimited;
    }
    let message = json["error"]["message"]
        .as_str()
        .unwrap_or("unknown error")
        .to_string();
    ProviderError::Api(message)
}

#[async_trait::async_trait]
impl ChatModel for OpenAiProvider {
    async fn complete(&self, prompt: &str) -> Result<Completion> {
        if !self.is_configured() {
            return Err(ProviderError::NoApiKey);
        }

        trace!("calling {} ({} chars of prompt)", self.api_base, prompt.len());
        debug!("model: {}, streaming: {}", self.model, self.streaming);

        if self.streaming {
            self.complete_streaming(prompt).await
        } else {
            self.complete_whole(prompt).await
        }
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_defaults() {
        let provider = OpenAiProvider::new("sk-test", None, "gpt-4o-mini");
        assert_eq!(provider.api_base, DEFAULT_API_BASE);
        assert_eq!(provider.model, "gpt-4o-mini");
        assert_eq!(provider.temperature, 0.0);
        assert_eq!(provider.max_tokens, 4096);
        assert!(provider.streaming);
    }

    #[test]
    fn test_provider_custom_base() {
        let provider = OpenAiProvider::new(
            "sk-test",
            Some("https://openrouter.ai/api/v1".to_string()),
            "anthropic/claude-sonnet-4",
        );
        assert_eq!(provider.api_base, "https://openrouter.ai/api/v1");
    }

    #[test]
    fn test_provider_builder_setters() {
        let provider = OpenAiProvider::new("sk-test", None, "gpt-4")
            .with_temperature(0.7)
            .with_max_tokens(1024)
            .with_streaming(false);
        assert_eq!(provider.temperature, 0.7);
        assert_eq!(provider.max_tokens, 1024);
        assert!(!provider.streaming);
    }

    #[test]
    fn test_is_configured() {
        assert!(OpenAiProvider::new("sk-x", None, "m").is_configured());
        assert!(!OpenAiProvider::new("", None, "m").is_configured());
    }

    #[test]
    fn test_build_request_shape() {
        let provider = OpenAiProvider::new("sk-test", None, "gpt-4").with_temperature(0.5);
        let body = provider.build_request("say hi", true);

        assert_eq!(body["model"], "gpt-4");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "say hi");
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["stream"], true);
    }

    #[test]
    fn test_parse_sse_line_delta() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#;
        assert_eq!(parse_sse_line(line), SseEvent::Delta("Hel".to_string()));
    }

    #[test]
    fn test_parse_sse_line_done() {
        assert_eq!(parse_sse_line("data: [DONE]"), SseEvent::Done);
    }

    #[test]
    fn test_parse_sse_line_skips_noise() {
        assert_eq!(parse_sse_line(""), SseEvent::Skip);
        assert_eq!(parse_sse_line(": keep-alive"), SseEvent::Skip);
        assert_eq!(
            parse_sse_line(r#"data: {"choices":[{"delta":{}}]}"#),
            SseEvent::Skip
        );
    }

    #[test]
    fn test_parse_sse_line_empty_delta_is_skipped() {
        let line = r#"data: {"choices":[{"delta":{"content":""}}]}"#;
        assert_eq!(parse_sse_line(line), SseEvent::Skip);
    }

    #[test]
    fn test_api_error_rate_limited() {
        let err = api_error(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            &json!({"error": {"message": "slow down"}}),
        );
        assert!(matches!(err, ProviderError::RateLimited));
    }

    #[test]
    fn test_api_error_message() {
        let err = api_error(
            reqwest::StatusCode::BAD_REQUEST,
            &json!({"error": {"message": "unknown model"}}),
        );
        assert_eq!(err.to_string(), "provider rejected request: unknown model");
    }
}
