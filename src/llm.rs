use async_trait::async_trait;
use growth_planner::config::LlmConfig;
use growth_planner::{ContentGenerator, GenerationError, PlanPrompt, RawStrategy};
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    temperature: f64,
}

impl LlmClient {
    /// `Ok(None)` when `OPENAI_API_KEY` is unset or blank.
    pub fn from_env(
        config: &LlmConfig,
        model_override: Option<String>,
    ) -> Result<Option<Self>, GenerationError> {
        Self::with_key(env::var("OPENAI_API_KEY").ok(), config, model_override)
    }

    fn with_key(
        api_key: Option<String>,
        config: &LlmConfig,
        model_override: Option<String>,
    ) -> Result<Option<Self>, GenerationError> {
        let Some(api_key) = api_key.filter(|value| !value.trim().is_empty()) else {
            return Ok(None);
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| {
                GenerationError::Request(format!("failed to build HTTP client: {}", err))
            })?;
        Ok(Some(Self {
            client,
            api_key,
            api_base: config.api_base.clone(),
            model: model_override.unwrap_or_else(|| config.model.clone()),
            temperature: config.temperature,
        }))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &PlanPrompt) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let request = ChatRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            response_format: ResponseFormat {
                kind: "json_object".to_string(),
            },
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: prompt.system.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.user.clone(),
                },
            ],
        };

        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|err| GenerationError::Request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| String::new());
            return Err(GenerationError::Api {
                status: status.as_u16(),
                detail: error_body.trim().to_string(),
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|err| GenerationError::Parse(err.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(GenerationError::MissingContent)
    }
}

#[async_trait]
impl ContentGenerator for LlmClient {
    async fn generate(&self, prompt: &PlanPrompt) -> Result<RawStrategy, GenerationError> {
        let started = Instant::now();
        let content = self.complete(prompt).await?;
        debug!(
            model = %self.model,
            latency_ms = started.elapsed().as_millis() as u64,
            "generation response received"
        );
        RawStrategy::parse(&content)
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_key_means_not_configured() {
        let config = LlmConfig::default();
        assert!(LlmClient::with_key(None, &config, None).unwrap().is_none());
        assert!(LlmClient::with_key(Some("  ".to_string()), &config, None)
            .unwrap()
            .is_none());
    }

    #[test]
    fn key_builds_client_with_model_override() {
        let config = LlmConfig::default();
        let client = LlmClient::with_key(Some("sk-test".to_string()), &config, None)
            .unwrap()
            .unwrap();
        assert_eq!(client.model(), "gpt-4o-mini");

        let client = LlmClient::with_key(
            Some("sk-test".to_string()),
            &config,
            Some("gpt-4o".to_string()),
        )
        .unwrap()
        .unwrap();
        assert_eq!(client.model(), "gpt-4o");
        assert_eq!(client.api_base, "https://api.openai.com/v1");
    }
}
