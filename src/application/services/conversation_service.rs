use std::sync::Arc;

use crate::application::ports::{ConversationRepository, RepositoryError};
use crate::application::services::ConversationListCache;
use crate::domain::{Conversation, ConversationId, Message, MessageRole, UserId};

/// Owner-scoped conversation operations with a read-through listing cache.
/// Ids are generated here, never accepted from callers.
pub struct ConversationService {
    repository: Arc<dyn ConversationRepository>,
    list_cache: ConversationListCache,
}

impl ConversationService {
    pub fn new(repository: Arc<dyn ConversationRepository>, list_cache: ConversationListCache) -> Self {
        Self {
            repository,
            list_cache,
        }
    }

    #[tracing::instrument(skip(self, title), fields(owner = %owner))]
    pub async fn create(
        &self,
        owner: &UserId,
        title: Option<String>,
    ) -> Result<Conversation, RepositoryError> {
        let conversation = Conversation::new(owner.clone(), title);
        self.repository.create_conversation(&conversation).await?;
        self.list_cache.invalidate(owner);
        Ok(conversation)
    }

    #[tracing::instrument(skip(self), fields(owner = %owner))]
    pub async fn list(&self, owner: &UserId) -> Result<Vec<Conversation>, RepositoryError> {
        if let Some(cached) = self.list_cache.get(owner) {
            tracing::debug!("Conversation list served from cache");
            return Ok(cached);
        }

        let conversations = self.repository.list_conversations(owner).await?;
        self.list_cache.put(owner, conversations.clone());
        Ok(conversations)
    }

    #[tracing::instrument(skip(self), fields(owner = %owner, conversation_id = %id))]
    pub async fn get(
        &self,
        owner: &UserId,
        id: ConversationId,
    ) -> Result<Conversation, RepositoryError> {
        self.repository.get_conversation(owner, id).await
    }

    #[tracing::instrument(skip(self, title), fields(owner = %owner, conversation_id = %id))]
    pub async fn rename(
        &self,
        owner: &UserId,
        id: ConversationId,
        title: &str,
    ) -> Result<(), RepositoryError> {
        self.repository.update_title(owner, id, title).await?;
        self.list_cache.invalidate(owner);
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(owner = %owner, conversation_id = %id))]
    pub async fn delete(&self, owner: &UserId, id: ConversationId) -> Result<(), RepositoryError> {
        self.repository.delete_conversation(owner, id).await?;
        self.list_cache.invalidate(owner);
        Ok(())
    }

    /// Inserting a message reorders the owner's listing, so the cache entry
    /// is dropped along with the atomic insert-and-bump.
    #[tracing::instrument(skip(self, content), fields(owner = %owner, conversation_id = %conversation_id, role = %role))]
    pub async fn add_message(
        &self,
        owner: &UserId,
        conversation_id: ConversationId,
        role: MessageRole,
        content: String,
    ) -> Result<Message, RepositoryError> {
        let message = Message::new(conversation_id, role, content);
        self.repository.append_message(owner, &message).await?;
        self.list_cache.invalidate(owner);
        Ok(message)
    }

    #[tracing::instrument(skip(self), fields(owner = %owner, conversation_id = %conversation_id))]
    pub async fn list_messages(
        &self,
        owner: &UserId,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, RepositoryError> {
        self.repository.list_messages(owner, conversation_id).await
    }
}
