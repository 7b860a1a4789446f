use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::{ChatTurn, CompletionClient, CompletionError, TokenStream};
use crate::presentation::config::LlmSettings;

use super::MockCompletionClient;

/// OpenAI-compatible chat completion client. Works against api.openai.com,
/// api.deepseek.com or any custom base url speaking the same wire format.
pub struct OpenAiCompletionClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Serialize)]
struct OutboundRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: usize,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: InboundMessage,
}

#[derive(Deserialize)]
struct InboundMessage {
    content: String,
}

#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiCompletionClient {
    fn wire_messages<'a>(&self, turns: &'a [ChatTurn]) -> Vec<WireMessage<'a>> {
        turns
            .iter()
            .map(|t| WireMessage {
                role: t.role.as_str(),
                content: &t.content,
            })
            .collect()
    }

    async fn send_request(
        &self,
        turns: &[ChatTurn],
        stream: bool,
    ) -> Result<reqwest::Response, CompletionError> {
        let request_body = OutboundRequest {
            model: &self.model,
            messages: self.wire_messages(turns),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: stream.then_some(true),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| CompletionError::ConnectFailed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(CompletionError::RateLimited);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::ConnectFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(&self, turns: &[ChatTurn]) -> Result<String, CompletionError> {
        let response = self.send_request(turns, false).await?;

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| CompletionError::InvalidResponse("empty choices".to_string()))
    }

    async fn open_stream(&self, turns: &[ChatTurn]) -> Result<TokenStream, CompletionError> {
        let response = self.send_request(turns, true).await?;
        let mut byte_stream = Box::pin(response.bytes_stream());

        // Upstream speaks SSE with one JSON chunk per `data:` line; a TCP
        // chunk may end mid-line, so partial lines carry over.
        let token_stream = async_stream::stream! {
            let mut buffer = String::new();

            while let Some(chunk_result) = byte_stream.next().await {
                match chunk_result {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));

                        while let Some(newline) = buffer.find('\n') {
                            let line = buffer[..newline].trim_end_matches('\r').to_string();
                            buffer.drain(..=newline);

                            let Some(data) = line.strip_prefix("data: ") else {
                                continue;
                            };
                            if data == "[DONE]" {
                                return;
                            }
                            if let Ok(parsed) = serde_json::from_str::<StreamChunk>(data) {
                                if let Some(choice) = parsed.choices.first() {
                                    if let Some(content) = &choice.delta.content {
                                        yield Ok(content.clone());
                                    }
                                }
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(CompletionError::Stream(e.to_string()));
                        return;
                    }
                }
            }
        };

        Ok(Box::pin(token_stream))
    }
}

/// Builds the completion client the settings ask for. The "mock" provider
/// streams a canned reply and exists so the service runs without an upstream
/// key (scaffold mode).
pub fn create_completion_client(
    settings: &LlmSettings,
) -> Result<Arc<dyn CompletionClient>, CompletionError> {
    let base_url = match settings.provider.as_str() {
        "openai" => "https://api.openai.com/v1".to_string(),
        "deepseek" => "https://api.deepseek.com".to_string(),
        "custom" => settings
            .base_url
            .clone()
            .ok_or_else(|| {
                CompletionError::InvalidResponse(
                    "base_url required for custom provider".to_string(),
                )
            })?
            .trim_end_matches('/')
            .to_string(),
        "mock" => {
            return Ok(Arc::new(MockCompletionClient::new(
                settings
                    .mock_reply
                    .clone()
                    .unwrap_or_else(|| "This is a canned reply.".to_string()),
                Duration::from_millis(settings.mock_fragment_delay_ms),
            )));
        }
        other => {
            return Err(CompletionError::InvalidResponse(format!(
                "unknown provider: {}",
                other
            )));
        }
    };

    Ok(Arc::new(OpenAiCompletionClient {
        client: Client::new(),
        base_url,
        api_key: settings.api_key.clone(),
        model: settings.chat_model.clone(),
        max_tokens: settings.max_tokens,
        temperature: settings.temperature,
    }))
}
