use async_trait::async_trait;

use crate::domain::{Conversation, ConversationId, Message, UserId};

use super::RepositoryError;

/// Owner-scoped conversation persistence. Every operation that takes a
/// conversation id verifies the owner first and answers `NotFound` on any
/// mismatch.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn create_conversation(&self, conversation: &Conversation)
    -> Result<(), RepositoryError>;

    /// Conversations for one owner, most recently updated first.
    async fn list_conversations(&self, owner: &UserId) -> Result<Vec<Conversation>, RepositoryError>;

    async fn get_conversation(
        &self,
        owner: &UserId,
        id: ConversationId,
    ) -> Result<Conversation, RepositoryError>;

    async fn update_title(
        &self,
        owner: &UserId,
        id: ConversationId,
        title: &str,
    ) -> Result<(), RepositoryError>;

    /// Cascades to the conversation's messages.
    async fn delete_conversation(
        &self,
        owner: &UserId,
        id: ConversationId,
    ) -> Result<(), RepositoryError>;

    /// Inserts the message and bumps the parent's `updated_at` as one atomic
    /// unit.
    async fn append_message(&self, owner: &UserId, message: &Message)
    -> Result<(), RepositoryError>;

    /// Messages of one conversation, oldest first.
    async fn list_messages(
        &self,
        owner: &UserId,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, RepositoryError>;
}
