use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{ConversationRepository, RepositoryError};
use crate::domain::{Conversation, ConversationId, Message, MessageId, MessageRole, UserId};

pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn conversation_from_row(row: &PgRow) -> Result<Conversation, RepositoryError> {
    let id: Uuid = row
        .try_get("id")
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
    let owner_id: String = row
        .try_get("owner_id")
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
    let title: String = row
        .try_get("title")
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
    let created_at: DateTime<Utc> = row
        .try_get("created_at")
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
    let updated_at: DateTime<Utc> = row
        .try_get("updated_at")
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

    Ok(Conversation {
        id: ConversationId::from_uuid(id),
        owner_id: UserId::new(owner_id),
        title,
        created_at,
        updated_at,
    })
}

fn message_from_row(row: &PgRow) -> Result<Message, RepositoryError> {
    let id: Uuid = row
        .try_get("id")
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
    let conversation_id: Uuid = row
        .try_get("conversation_id")
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
    let role: String = row
        .try_get("role")
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
    let content: String = row
        .try_get("content")
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
    let created_at: DateTime<Utc> = row
        .try_get("created_at")
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

    Ok(Message {
        id: MessageId::from_uuid(id),
        conversation_id: ConversationId::from_uuid(conversation_id),
        role: role
            .parse::<MessageRole>()
            .map_err(RepositoryError::QueryFailed)?,
        content,
        created_at,
    })
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    #[instrument(skip(self, conversation), fields(conversation_id = %conversation.id))]
    async fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO conversations (id, owner_id, title, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(conversation.id.as_uuid())
        .bind(conversation.owner_id.as_str())
        .bind(&conversation.title)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(owner = %owner))]
    async fn list_conversations(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, title, created_at, updated_at
            FROM conversations
            WHERE owner_id = $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        rows.iter().map(conversation_from_row).collect()
    }

    #[instrument(skip(self), fields(owner = %owner, conversation_id = %id))]
    async fn get_conversation(
        &self,
        owner: &UserId,
        id: ConversationId,
    ) -> Result<Conversation, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, title, created_at, updated_at
            FROM conversations
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(owner.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        match row {
            Some(row) => conversation_from_row(&row),
            None => Err(RepositoryError::NotFound),
        }
    }

    #[instrument(skip(self, title), fields(owner = %owner, conversation_id = %id))]
    async fn update_title(
        &self,
        owner: &UserId,
        id: ConversationId,
        title: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET title = $1, updated_at = $2
            WHERE id = $3 AND owner_id = $4
            "#,
        )
        .bind(title)
        .bind(Utc::now())
        .bind(id.as_uuid())
        .bind(owner.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(owner = %owner, conversation_id = %id))]
    async fn delete_conversation(
        &self,
        owner: &UserId,
        id: ConversationId,
    ) -> Result<(), RepositoryError> {
        // Messages go with it via ON DELETE CASCADE.
        let result = sqlx::query(
            r#"
            DELETE FROM conversations
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(owner.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self, message), fields(owner = %owner, message_id = %message.id, conversation_id = %message.conversation_id))]
    async fn append_message(
        &self,
        owner: &UserId,
        message: &Message,
    ) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        // The ownership check and the updated_at bump are the same statement;
        // zero rows means foreign or missing conversation and nothing is
        // committed.
        let bumped = sqlx::query(
            r#"
            UPDATE conversations
            SET updated_at = GREATEST(updated_at, $1)
            WHERE id = $2 AND owner_id = $3
            "#,
        )
        .bind(message.created_at)
        .bind(message.conversation_id.as_uuid())
        .bind(owner.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        if bumped.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, role, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(message.id.as_uuid())
        .bind(message.conversation_id.as_uuid())
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(message.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(owner = %owner, conversation_id = %conversation_id))]
    async fn list_messages(
        &self,
        owner: &UserId,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, RepositoryError> {
        // Ownership gate first so a foreign conversation reads as missing.
        self.get_conversation(owner, conversation_id).await?;

        let rows = sqlx::query(
            r#"
            SELECT id, conversation_id, role, content, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC, seq ASC
            "#,
        )
        .bind(conversation_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        rows.iter().map(message_from_row).collect()
    }
}
