use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::conversation::Turn;
use crate::error::ModelCallFailure;

/// Boundary to the chat-completion service.
///
/// Implementations perform one blocking round-trip and never touch the
/// conversation log.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, history: &[Turn]) -> Result<String, ModelCallFailure>;

    /// Model identifier requests are sent to
    fn model(&self) -> &str;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

#[derive(Deserialize)]
struct OllamaModelsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    pub async fn list_models(&self) -> Result<Vec<String>, ModelCallFailure> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ModelCallFailure::new(format!(
                "Failed to list models: {}",
                response.status()
            )));
        }

        let models_response: OllamaModelsResponse = response.json().await?;
        Ok(models_response
            .models
            .into_iter()
            .map(|model| model.name)
            .collect())
    }

    /// Ollama reports untagged names with `:latest`, so `llama2` matches `llama2:latest`.
    pub async fn has_model(&self, name: &str) -> Result<bool, ModelCallFailure> {
        let models = self.list_models().await?;
        Ok(models
            .iter()
            .any(|m| m == name || m.strip_suffix(":latest") == Some(name)))
    }
}

#[async_trait]
impl ChatModel for OllamaClient {
    async fn complete(&self, history: &[Turn]) -> Result<String, ModelCallFailure> {
        let url = format!("{}/api/chat", self.base_url);

        let messages = history
            .iter()
            .filter_map(|turn| {
                turn.role.api_name().map(|role| WireMessage {
                    role,
                    content: &turn.content,
                })
            })
            .collect();

        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
        };

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(ModelCallFailure::new(format!(
                "Ollama request failed with status {}: {}",
                status,
                detail.trim()
            )));
        }

        let chat_response: ChatResponse = serde_json::from_str(&body)?;
        Ok(chat_response.message.content)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
