use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use relay_core::config::{OpenAiConfig, ProxyConfig};

use crate::provider::{ChatRequest, ChatResponse, LlmProvider, ProviderError};

/// OpenAI-compatible chat-completion client.
///
/// Posts the whole conversation to `{base_url}/v1/chat/completions` with a
/// bearer key. When a proxy is configured every request goes through it.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(config: &OpenAiConfig, proxy: Option<&ProxyConfig>) -> Result<Self, ProviderError> {
        let mut builder = reqwest::Client::builder();
        if let Some(proxy) = proxy {
            builder = builder.proxy(build_proxy(proxy)?);
        }

        Ok(Self {
            client: builder.build()?,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

fn build_proxy(config: &ProxyConfig) -> Result<reqwest::Proxy, ProviderError> {
    let proxy = reqwest::Proxy::all(&config.address)?;
    Ok(match config.login.as_deref() {
        Some(login) => proxy.basic_auth(login, config.password.as_deref().unwrap_or("")),
        None => proxy,
    })
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn send(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        debug!(model = %req.model, messages = req.messages.len(), "sending request to OpenAI");

        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(req)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), body = %text, "OpenAI API error");
            return Err(ProviderError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        let api_resp: ApiResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        parse_response(api_resp, &req.model)
    }
}

fn parse_response(resp: ApiResponse, requested_model: &str) -> Result<ChatResponse, ProviderError> {
    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::MalformedResponse("response has no choices".to_string()))?;
    let content = choice.message.content.ok_or_else(|| {
        ProviderError::MalformedResponse("first choice has no message content".to_string())
    })?;

    Ok(ChatResponse {
        content,
        model: resp.model.unwrap_or_else(|| requested_model.to_string()),
        tokens_in: resp.usage.as_ref().map(|u| u.prompt_tokens).unwrap_or(0),
        tokens_out: resp.usage.as_ref().map(|u| u.completion_tokens).unwrap_or(0),
        finish_reason: choice.finish_reason.unwrap_or_default(),
    })
}

// OpenAI API response types (private — deserialization only)

#[derive(Deserialize)]
struct ApiResponse {
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
