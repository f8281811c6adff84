use std::future::Future;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

#[derive(Debug, Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
}

#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqMessageContent,
}

#[derive(Debug, Deserialize)]
struct GroqMessageContent {
    content: Option<String>,
}

/// A simple (role, content) pair for building the messages array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system", content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user", content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant", content: content.into() }
    }
}

/// Anything that turns a role-tagged prompt into a single reply.
pub trait ChatModel: Send + Sync + 'static {
    fn complete(
        &self,
        messages: &[ChatMessage],
    ) -> impl Future<Output = anyhow::Result<String>> + Send;
}

pub struct LlmClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl LlmClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.groq_api_key.clone(),
            endpoint: format!("{}/chat/completions", config.groq_api_base),
            model: config.groq_model.clone(),
            temperature: config.llm_temperature,
        }
    }
}

impl ChatModel for LlmClient {
    /// Send a conversation to Groq and get the assistant's reply.
    async fn complete(&self, messages: &[ChatMessage]) -> anyhow::Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err_body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Groq API error ({}): {}", status, err_body);
        }

        let groq_resp: GroqResponse = resp.json().await?;

        groq_resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("Groq API returned no completion"))
    }
}
