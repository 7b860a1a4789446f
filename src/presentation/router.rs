use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    chat_handler, create_conversation_handler, create_message_handler,
    delete_conversation_handler, get_conversation_handler, health_handler,
    list_conversations_handler, list_messages_handler, update_title_handler,
};
use crate::presentation::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .route(
            "/conversations",
            get(list_conversations_handler).post(create_conversation_handler),
        )
        .route(
            "/conversations/{id}",
            get(get_conversation_handler)
                .patch(update_title_handler)
                .delete(delete_conversation_handler),
        )
        .route(
            "/conversations/{id}/messages",
            get(list_messages_handler).post(create_message_handler),
        )
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
