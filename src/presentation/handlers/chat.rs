use std::convert::Infallible;

use axum::Json;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::application::ports::ChatTurn;
use crate::domain::MessageRole;
use crate::infrastructure::observability::sanitize_prompt;
use crate::presentation::error::ApiError;
use crate::presentation::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Option<Vec<IncomingTurn>>,
    #[serde(default)]
    pub stream: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingTurn {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Serialize)]
struct ChatReply {
    content: String,
}

#[derive(Serialize)]
struct Fragment<'a> {
    content: &'a str,
}

#[derive(Serialize)]
struct StreamFailure<'a> {
    error: &'a str,
}

/// Streaming completion relay. No authentication: guest sessions hit this
/// too, and nothing is persisted here either way.
#[tracing::instrument(skip(state, request))]
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    let turns = validate_turns(request.messages)?;

    if let Some(last_user) = turns
        .iter()
        .rev()
        .find(|t| t.role == MessageRole::User)
    {
        tracing::debug!(prompt = %sanitize_prompt(&last_user.content), "Relaying chat request");
    }

    if request.stream == Some(false) {
        let content = state.relay_service.complete_reply(turns).await?;
        return Ok(Json(ChatReply { content }).into_response());
    }

    let token_stream = state.relay_service.stream_reply(turns).await?;

    let sse_stream = async_stream::stream! {
        let mut token_stream = token_stream;

        while let Some(token_result) = token_stream.next().await {
            match token_result {
                Ok(fragment) => {
                    let payload = serde_json::to_string(&Fragment { content: &fragment })
                        .unwrap_or_default();
                    yield Ok::<_, Infallible>(Event::default().data(payload));
                }
                Err(e) => {
                    // Terminal: the error event replaces [DONE] so clients
                    // never mistake a truncated reply for a complete one.
                    tracing::error!(error = %e, "Stream token error");
                    let reason = e.to_string();
                    let payload = serde_json::to_string(&StreamFailure { error: &reason })
                        .unwrap_or_default();
                    yield Ok::<_, Infallible>(Event::default().data(payload));
                    return;
                }
            }
        }

        yield Ok(Event::default().data("[DONE]"));
    };

    Ok(Sse::new(sse_stream)
        .keep_alive(
            KeepAlive::new()
                .interval(state.sse_keep_alive)
                .text("keep-alive"),
        )
        .into_response())
}

fn validate_turns(messages: Option<Vec<IncomingTurn>>) -> Result<Vec<ChatTurn>, ApiError> {
    let messages = match messages {
        Some(m) if !m.is_empty() => m,
        _ => {
            return Err(ApiError::InvalidRequest(
                "messages must be a non-empty array".to_string(),
            ));
        }
    };

    messages
        .into_iter()
        .map(|turn| {
            let role = turn
                .role
                .as_deref()
                .ok_or_else(|| ApiError::InvalidRequest("message role is required".to_string()))?
                .parse::<MessageRole>()
                .map_err(ApiError::InvalidRequest)?;
            let content = turn
                .content
                .ok_or_else(|| ApiError::InvalidRequest("message content is required".to_string()))?;
            Ok(ChatTurn::new(role, content))
        })
        .collect()
}
