use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Conversation, ConversationId};
use crate::presentation::error::ApiError;
use crate::presentation::extract::CurrentUser;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct ConversationDto {
    pub id: ConversationId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Conversation> for ConversationDto {
    fn from(c: &Conversation) -> Self {
        Self {
            id: c.id,
            title: c.title.clone(),
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Deserialize)]
pub struct CreateConversationRequest {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateTitleRequest {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Serialize)]
pub struct ConversationCreated {
    pub id: ConversationId,
}

#[derive(Serialize)]
pub struct TitleUpdated {
    pub updated: bool,
}

#[tracing::instrument(skip(state, user), fields(owner = %user.0))]
pub async fn list_conversations_handler(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let conversations = state.conversation_service.list(&user.0).await?;
    let dtos: Vec<ConversationDto> = conversations.iter().map(ConversationDto::from).collect();
    Ok(Json(dtos))
}

#[tracing::instrument(skip(state, user, request), fields(owner = %user.0))]
pub async fn create_conversation_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<CreateConversationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = match request.title {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Err(ApiError::InvalidRequest("title is required".to_string())),
    };

    let conversation = state
        .conversation_service
        .create(&user.0, Some(title))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ConversationCreated {
            id: conversation.id,
        }),
    ))
}

#[tracing::instrument(skip(state, user), fields(owner = %user.0, conversation_id = %id))]
pub async fn get_conversation_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation = state
        .conversation_service
        .get(&user.0, ConversationId::from_uuid(id))
        .await?;
    Ok(Json(ConversationDto::from(&conversation)))
}

#[tracing::instrument(skip(state, user, request), fields(owner = %user.0, conversation_id = %id))]
pub async fn update_title_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTitleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = match request.title {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Err(ApiError::InvalidRequest("title is required".to_string())),
    };

    state
        .conversation_service
        .rename(&user.0, ConversationId::from_uuid(id), &title)
        .await?;

    Ok(Json(TitleUpdated { updated: true }))
}

#[tracing::instrument(skip(state, user), fields(owner = %user.0, conversation_id = %id))]
pub async fn delete_conversation_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .conversation_service
        .delete(&user.0, ConversationId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
