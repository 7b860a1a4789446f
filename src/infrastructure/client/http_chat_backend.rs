use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::application::ports::{
    BackendError, ChatBackend, ChatTurn, CompletionError, TokenStream,
};
use crate::domain::{ConversationId, MessageId, MessageRole};

/// `ChatBackend` over the service's own HTTP surface; what a browser client
/// does, minus the rendering. A backend without a token runs the guest-mode
/// path (the controller never calls persistence on it).
pub struct HttpChatBackend {
    http: Client,
    base_url: String,
    bearer_token: Option<String>,
}

#[derive(Serialize)]
struct OutgoingTurn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequestBody<'a> {
    messages: Vec<OutgoingTurn<'a>>,
}

#[derive(Serialize)]
struct CreateConversationBody<'a> {
    title: &'a str,
}

#[derive(Serialize)]
struct CreateMessageBody<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct IdResponse<T> {
    id: T,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StreamPayload {
    Fragment { content: String },
    Failure { error: String },
}

impl HttpChatBackend {
    pub fn new(base_url: impl Into<String>, bearer_token: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token,
        }
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer_token {
            Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
            None => builder,
        }
    }

    fn check_status(status: StatusCode) -> Result<(), BackendError> {
        match status {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED => Err(BackendError::Unauthorized),
            StatusCode::NOT_FOUND => Err(BackendError::NotFound),
            s => Err(BackendError::Request(format!("HTTP {}", s))),
        }
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn create_conversation(&self, title: &str) -> Result<ConversationId, BackendError> {
        let response = self
            .request(self.http.post(format!("{}/conversations", self.base_url)))
            .json(&CreateConversationBody { title })
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        Self::check_status(response.status())?;

        let body: IdResponse<ConversationId> = response
            .json()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;
        Ok(body.id)
    }

    async fn persist_message(
        &self,
        conversation_id: ConversationId,
        role: MessageRole,
        content: &str,
    ) -> Result<MessageId, BackendError> {
        let response = self
            .request(self.http.post(format!(
                "{}/conversations/{}/messages",
                self.base_url, conversation_id
            )))
            .json(&CreateMessageBody {
                role: role.as_str(),
                content,
            })
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        Self::check_status(response.status())?;

        let body: IdResponse<MessageId> = response
            .json()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;
        Ok(body.id)
    }

    async fn stream_completion(&self, turns: &[ChatTurn]) -> Result<TokenStream, BackendError> {
        let body = ChatRequestBody {
            messages: turns
                .iter()
                .map(|t| OutgoingTurn {
                    role: t.role.as_str(),
                    content: &t.content,
                })
                .collect(),
        };

        let response = self
            .request(self.http.post(format!("{}/chat", self.base_url)))
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BackendError::Upstream(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let mut byte_stream = Box::pin(response.bytes_stream());

        // SSE framing: keep-alive comment lines are dropped here so callers
        // only ever see model output.
        let token_stream = async_stream::stream! {
            let mut buffer = String::new();

            while let Some(chunk_result) = byte_stream.next().await {
                match chunk_result {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));

                        while let Some(newline) = buffer.find('\n') {
                            let line = buffer[..newline].trim_end_matches('\r').to_string();
                            buffer.drain(..=newline);

                            if line.starts_with(':') {
                                continue;
                            }
                            let Some(data) = line.strip_prefix("data: ") else {
                                continue;
                            };
                            if data == "[DONE]" {
                                return;
                            }
                            match serde_json::from_str::<StreamPayload>(data) {
                                Ok(StreamPayload::Fragment { content }) => yield Ok(content),
                                Ok(StreamPayload::Failure { error }) => {
                                    yield Err(CompletionError::Stream(error));
                                    return;
                                }
                                Err(e) => {
                                    yield Err(CompletionError::InvalidResponse(e.to_string()));
                                    return;
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

            // The connection closed before [DONE]; whatever arrived cannot be
            // trusted as the full reply.
            yield Err(CompletionError::Stream(
                "stream ended without completion marker".to_string(),
            ));
        };

        Ok(Box::pin(token_stream))
    }
}
