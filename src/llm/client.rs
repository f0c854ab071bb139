use crate::config::BridgeConfig;
use crate::error::{Result, SalesPulseError};
use crate::llm::types::*;
use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::Client;

/// Anything that can turn a prompt into completion text.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &CompletionPrompt) -> Result<String>;
}

/// OpenAI-compatible chat-completions endpoint authorised with a bearer token.
#[derive(Clone)]
pub struct ChatCompletionClient {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatCompletionClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        let defaults = BridgeConfig::default();
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_url: defaults.api_url,
            model: defaults.model,
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        let api_key = config.require_api_key()?;
        Ok(Self::new(api_key)
            .with_api_url(config.api_url.clone())
            .with_model(config.model.clone())
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_tokens))
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn request_body(&self, prompt: &CompletionPrompt) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                WireMessage {
                    role: "system".to_string(),
                    content: prompt.system.clone(),
                },
                WireMessage {
                    role: "user".to_string(),
                    content: prompt.user.clone(),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait]
impl CompletionService for ChatCompletionClient {
    async fn complete(&self, prompt: &CompletionPrompt) -> Result<String> {
        let payload = self.request_body(prompt);
        debug!(
            "POST {} (model {}, {} prompt bytes)",
            self.api_url,
            self.model,
            prompt.user.len()
        );

        let res = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await.unwrap_or_default();
            error!("Chat completion error (status {}): {}", status, err_text);
            return Err(SalesPulseError::UpstreamUnavailable(status.to_string()));
        }

        let text = res.text().await?;
        let body: ChatCompletionResponse = serde_json::from_str(&text).map_err(|e| {
            warn!("Chat completion body did not decode: {}", e);
            SalesPulseError::EmptyResponse
        })?;

        body.first_text().ok_or(SalesPulseError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let client = ChatCompletionClient::new("k").with_model("test/model");
        let prompt = CompletionPrompt {
            system: "sys".to_string(),
            user: "question".to_string(),
        };
        let body = serde_json::to_value(client.request_body(&prompt)).unwrap();

        assert_eq!(body["model"], "test/model");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "question");
        assert_eq!(body["max_tokens"], 1000);
        let temperature = body["temperature"].as_f64().unwrap();
        assert!((temperature - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = BridgeConfig::default();
        assert!(matches!(
            ChatCompletionClient::from_config(&config),
            Err(SalesPulseError::MissingConfig(_))
        ));
    }
}
