use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::error::{DispatchError, GeoMeshError, Result};
use crate::models::{ChatRequest, ChatResponse};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[async_trait]
pub trait Transport: Send + Sync {
    async fn chat(&self, req: &ChatRequest) -> std::result::Result<ChatResponse, DispatchError>;
}

/// Chat completions client for OpenAI-compatible endpoints. One attempt per
/// call, reqwest's default timeouts.
pub struct OpenAiTransport {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl OpenAiTransport {
    pub fn new(api_key: String, base_url: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(GeoMeshError::MissingCredential("OPENAI_API_KEY".to_string()));
        }
        Ok(Self {
            client: Client::new(),
            api_key,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for OpenAiTransport {
    async fn chat(&self, req: &ChatRequest) -> std::result::Result<ChatResponse, DispatchError> {
        tracing::debug!(model = %req.model, endpoint = %self.endpoint, "Sending chat completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(req)
            .send()
            .await
            .map_err(|e| DispatchError::Network {
                endpoint: self.endpoint.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| DispatchError::MalformedResponse(format!("failed to parse body: {e}")));
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(classify_status(status, message))
    }
}

fn classify_status(status: StatusCode, message: String) -> DispatchError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DispatchError::Authentication {
            status: status.as_u16(),
            message,
        },
        StatusCode::TOO_MANY_REQUESTS => DispatchError::RateLimited { message },
        _ => DispatchError::Service {
            status: status.as_u16(),
            message,
        },
    }
}
