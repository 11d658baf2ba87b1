use crate::common::{DomainError, DomainResult};
use crate::domains::narration::{NarrationDispatcher, NarrationRequest, SummaryRequest};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings shared by both LLM clients.
#[derive(Debug, Clone)]
pub struct LlmEndpoint {
    /// Server root, e.g. `https://api.openai.com`.
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl LlmEndpoint {
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    pub(crate) fn client(&self) -> DomainResult<Client> {
        Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| DomainError::DispatchFailure(format!("http client: {}", e)))
    }
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatRequestBody {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// OpenAI-style `POST /v1/chat/completions` client.
pub struct OpenAiChatClient {
    endpoint: LlmEndpoint,
    client: Client,
}

impl OpenAiChatClient {
    pub fn new(endpoint: LlmEndpoint) -> DomainResult<Self> {
        let client = endpoint.client()?;
        Ok(Self { endpoint, client })
    }

    /// The payload travels as a JSON string in the user message.
    pub fn request_body(&self, request: &NarrationRequest) -> DomainResult<ChatRequestBody> {
        Ok(self.body(&request.system_prompt, request.payload.to_json()?))
    }

    pub fn summary_body(&self, request: &SummaryRequest) -> DomainResult<ChatRequestBody> {
        Ok(self.body(&request.system_prompt, request.summary.to_json()?))
    }

    fn body(&self, system_prompt: &str, content: String) -> ChatRequestBody {
        ChatRequestBody {
            model: self.endpoint.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt.to_string(),
                },
                ChatMessage { role: "user", content },
            ],
            temperature: self.endpoint.temperature,
            max_tokens: self.endpoint.max_tokens,
        }
    }

    pub fn parse_answer(body: &str) -> DomainResult<String> {
        let response: ChatResponse = serde_json::from_str(body)
            .map_err(|e| DomainError::DispatchFailure(format!("chat response decode failed: {}", e)))?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| DomainError::DispatchFailure("chat response has no choices[0].message.content".into()))
    }
}

#[async_trait]
impl NarrationDispatcher for OpenAiChatClient {
    async fn complete(&self, request: &NarrationRequest) -> DomainResult<String> {
        self.post(&self.request_body(request)?).await
    }

    async fn summarize(&self, request: &SummaryRequest) -> DomainResult<String> {
        self.post(&self.summary_body(request)?).await
    }
}

impl OpenAiChatClient {
    async fn post(&self, body: &ChatRequestBody) -> DomainResult<String> {
        let mut http = self
            .client
            .post(self.endpoint.url("v1/chat/completions"))
            .json(body);
        if let Some(key) = &self.endpoint.api_key {
            http = http.bearer_auth(key);
        }

        let text = http
            .send()
            .await
            .map_err(|e| DomainError::DispatchFailure(format!("chat request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| DomainError::DispatchFailure(format!("chat non-2xx response: {}", e)))?
            .text()
            .await
            .map_err(|e| DomainError::DispatchFailure(format!("chat response read failed: {}", e)))?;

        Self::parse_answer(&text)
    }
}
