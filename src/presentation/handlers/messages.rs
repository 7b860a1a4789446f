use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{ConversationId, Message, MessageId, MessageRole};
use crate::presentation::error::ApiError;
use crate::presentation::extract::CurrentUser;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct MessageDto {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for MessageDto {
    fn from(m: &Message) -> Self {
        Self {
            id: m.id,
            conversation_id: m.conversation_id,
            role: m.role,
            content: m.content.clone(),
            created_at: m.created_at,
        }
    }
}

#[derive(Deserialize)]
pub struct CreateMessageRequest {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Serialize)]
pub struct MessageCreated {
    pub id: MessageId,
}

#[tracing::instrument(skip(state, user), fields(owner = %user.0, conversation_id = %id))]
pub async fn list_messages_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let messages = state
        .conversation_service
        .list_messages(&user.0, ConversationId::from_uuid(id))
        .await?;
    let dtos: Vec<MessageDto> = messages.iter().map(MessageDto::from).collect();
    Ok(Json(dtos))
}

#[tracing::instrument(skip(state, user, request), fields(owner = %user.0, conversation_id = %id))]
pub async fn create_message_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = match request.content {
        Some(c) if !c.is_empty() => c,
        _ => return Err(ApiError::InvalidRequest("content is required".to_string())),
    };

    let role = request
        .role
        .as_deref()
        .ok_or_else(|| ApiError::InvalidRequest("role is required".to_string()))?
        .parse::<MessageRole>()
        .map_err(ApiError::InvalidRequest)?;

    if !role.is_storable() {
        return Err(ApiError::InvalidRequest(
            "role must be user or assistant".to_string(),
        ));
    }

    let message = state
        .conversation_service
        .add_message(&user.0, ConversationId::from_uuid(id), role, content)
        .await?;

    Ok((StatusCode::CREATED, Json(MessageCreated { id: message.id })))
}
