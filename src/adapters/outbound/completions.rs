use super::openai_chat::LlmEndpoint;
use crate::common::{DomainError, DomainResult};
use crate::domains::narration::{NarrationDispatcher, NarrationRequest, SummaryRequest};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct CompletionRequestBody {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    text: Option<String>,
}

/// LM Studio style `POST /v1/completions` client for locally hosted models.
pub struct CompletionsClient {
    endpoint: LlmEndpoint,
    client: Client,
}

impl CompletionsClient {
    pub fn new(endpoint: LlmEndpoint) -> DomainResult<Self> {
        let client = endpoint.client()?;
        Ok(Self { endpoint, client })
    }

    pub fn request_body(&self, request: &NarrationRequest) -> DomainResult<CompletionRequestBody> {
        Ok(self.body(&request.system_prompt, &request.payload.to_json()?))
    }

    pub fn summary_body(&self, request: &SummaryRequest) -> DomainResult<CompletionRequestBody> {
        Ok(self.body(&request.system_prompt, &request.summary.to_json()?))
    }

    fn body(&self, system_prompt: &str, content: &str) -> CompletionRequestBody {
        CompletionRequestBody {
            model: self.endpoint.model.clone(),
            prompt: format!("{}\n{}", system_prompt, content),
            temperature: self.endpoint.temperature,
            max_tokens: self.endpoint.max_tokens,
        }
    }

    pub fn parse_answer(body: &str) -> DomainResult<String> {
        let response: CompletionResponse = serde_json::from_str(body)
            .map_err(|e| DomainError::DispatchFailure(format!("completion response decode failed: {}", e)))?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.text)
            .ok_or_else(|| DomainError::DispatchFailure("completion response has no choices[0].text".into()))
    }
}

#[async_trait]
impl NarrationDispatcher for CompletionsClient {
    async fn complete(&self, request: &NarrationRequest) -> DomainResult<String> {
        self.post(&self.request_body(request)?).await
    }

    async fn summarize(&self, request: &SummaryRequest) -> DomainResult<String> {
        self.post(&self.summary_body(request)?).await
    }
}

impl CompletionsClient {
    async fn post(&self, body: &CompletionRequestBody) -> DomainResult<String> {
        let mut http = self.client.post(self.endpoint.url("v1/completions")).json(body);
        if let Some(key) = &self.endpoint.api_key {
            http = http.bearer_auth(key);
        }

        let text = http
            .send()
            .await
            .map_err(|e| DomainError::DispatchFailure(format!("completion request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| DomainError::DispatchFailure(format!("completion non-2xx response: {}", e)))?
            .text()
            .await
            .map_err(|e| DomainError::DispatchFailure(format!("completion response read failed: {}", e)))?;

        Self::parse_answer(&text)
    }
}
