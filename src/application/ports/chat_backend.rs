use async_trait::async_trait;

use crate::domain::{ConversationId, MessageId, MessageRole};

use super::{ChatTurn, CompletionError, TokenStream};

/// What the session controller needs from the server side: durable writes and
/// a streamed completion. The production implementation speaks the HTTP
/// surface; tests script it.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn create_conversation(&self, title: &str) -> Result<ConversationId, BackendError>;

    async fn persist_message(
        &self,
        conversation_id: ConversationId,
        role: MessageRole,
        content: &str,
    ) -> Result<MessageId, BackendError>;

    async fn stream_completion(&self, turns: &[ChatTurn]) -> Result<TokenStream, BackendError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("not found")]
    NotFound,
    #[error("upstream unavailable: {0}")]
    Upstream(String),
}

impl From<CompletionError> for BackendError {
    fn from(err: CompletionError) -> Self {
        BackendError::Upstream(err.to_string())
    }
}
