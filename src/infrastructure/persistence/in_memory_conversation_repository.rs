use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::application::ports::{ConversationRepository, RepositoryError};
use crate::domain::{Conversation, ConversationId, Message, UserId};

/// HashMap-backed store with the same ownership and ordering semantics as the
/// Postgres repository. Backs API tests and scaffold mode; nothing survives a
/// restart.
#[derive(Default)]
pub struct InMemoryConversationRepository {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    conversations: HashMap<ConversationId, Conversation>,
    // Insertion order preserved; doubles as the created_at tie-breaker.
    messages: Vec<Message>,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn owned<'a>(
    inner: &'a Inner,
    owner: &UserId,
    id: ConversationId,
) -> Result<&'a Conversation, RepositoryError> {
    inner
        .conversations
        .get(&id)
        .filter(|c| &c.owner_id == owner)
        .ok_or(RepositoryError::NotFound)
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        inner
            .conversations
            .insert(conversation.id, conversation.clone());
        Ok(())
    }

    async fn list_conversations(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let inner = self.inner.read().await;
        let mut conversations: Vec<Conversation> = inner
            .conversations
            .values()
            .filter(|c| &c.owner_id == owner)
            .cloned()
            .collect();
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(conversations)
    }

    async fn get_conversation(
        &self,
        owner: &UserId,
        id: ConversationId,
    ) -> Result<Conversation, RepositoryError> {
        let inner = self.inner.read().await;
        owned(&inner, owner, id).cloned()
    }

    async fn update_title(
        &self,
        owner: &UserId,
        id: ConversationId,
        title: &str,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        owned(&inner, owner, id)?;

        let conversation = inner
            .conversations
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        conversation.title = title.to_string();
        conversation.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_conversation(
        &self,
        owner: &UserId,
        id: ConversationId,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        owned(&inner, owner, id)?;

        inner.conversations.remove(&id);
        inner.messages.retain(|m| m.conversation_id != id);
        Ok(())
    }

    async fn append_message(
        &self,
        owner: &UserId,
        message: &Message,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        owned(&inner, owner, message.conversation_id)?;

        inner.messages.push(message.clone());
        let conversation = inner
            .conversations
            .get_mut(&message.conversation_id)
            .ok_or(RepositoryError::NotFound)?;
        if message.created_at > conversation.updated_at {
            conversation.updated_at = message.created_at;
        }
        Ok(())
    }

    async fn list_messages(
        &self,
        owner: &UserId,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, RepositoryError> {
        let inner = self.inner.read().await;
        owned(&inner, owner, conversation_id)?;

        let mut messages: Vec<Message> = inner
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }
}
