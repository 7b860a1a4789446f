use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::domain::MessageRole;

/// One role-tagged turn of the prompt sent upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: MessageRole,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, CompletionError>> + Send>>;

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, turns: &[ChatTurn]) -> Result<String, CompletionError>;

    /// Opens a streaming completion. Errors returned here are
    /// connection-establishment failures; errors after this returns surface
    /// as items of the stream and are terminal.
    async fn open_stream(&self, turns: &[ChatTurn]) -> Result<TokenStream, CompletionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("upstream connection failed: {0}")]
    ConnectFailed(String),
    #[error("rate limited")]
    RateLimited,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("stream failed: {0}")]
    Stream(String),
}
