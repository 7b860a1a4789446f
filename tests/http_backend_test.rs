mod helpers;

use std::sync::Arc;

use tokio::net::TcpListener;

use colloquy::application::session::SessionController;
use colloquy::infrastructure::client::HttpChatBackend;

use helpers::{ScriptedCompletionClient, test_app};

/// Serves the full router on an ephemeral port and returns its base url.
async fn serve(client: Arc<ScriptedCompletionClient>) -> String {
    let app = test_app(client);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn given_signed_in_backend_when_sending_then_reply_streams_and_history_persists() {
    let client = Arc::new(ScriptedCompletionClient::new(&["Hel", "lo, ", "world!"]));
    let base_url = serve(client).await;

    let backend = Arc::new(HttpChatBackend::new(
        &base_url,
        Some("token-alice".to_string()),
    ));
    let mut session = SessionController::new(backend.clone(), true);

    session.send_message("Say hello").await.expect("send succeeds");

    let entries = session.transcript().entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].content, "Hello, world!");

    let conversation_id = session.conversation_id().expect("conversation created");
    let stored = reqwest::Client::new()
        .get(format!(
            "{}/conversations/{}/messages",
            base_url, conversation_id
        ))
        .header("Authorization", "Bearer token-alice")
        .send()
        .await
        .expect("list messages")
        .json::<Vec<serde_json::Value>>()
        .await
        .expect("json");

    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0]["role"], "user");
    assert_eq!(stored[0]["content"], "Say hello");
    assert_eq!(stored[1]["role"], "assistant");
    assert_eq!(stored[1]["content"], "Hello, world!");
}

#[tokio::test]
async fn given_mid_stream_failure_over_http_then_truncated_reply_is_not_persisted() {
    let client = Arc::new(ScriptedCompletionClient::new(&["Partial "]).with_mid_stream_error());
    let base_url = serve(client).await;

    let backend = Arc::new(HttpChatBackend::new(
        &base_url,
        Some("token-alice".to_string()),
    ));
    let mut session = SessionController::new(backend, true);

    let result = session.send_message("Hello").await;
    assert!(matches!(
        result,
        Err(colloquy::application::session::SessionError::StreamFailed(_))
    ));

    // The partial reply stays on screen.
    let entries = session.transcript().entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].content, "Partial ");

    // But durable history holds only the user message.
    let conversation_id = session.conversation_id().expect("conversation created");
    let stored = reqwest::Client::new()
        .get(format!(
            "{}/conversations/{}/messages",
            base_url, conversation_id
        ))
        .header("Authorization", "Bearer token-alice")
        .send()
        .await
        .expect("list messages")
        .json::<Vec<serde_json::Value>>()
        .await
        .expect("json");

    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["role"], "user");
}

#[tokio::test]
async fn given_guest_backend_when_sending_then_reply_streams_without_auth() {
    let client = Arc::new(ScriptedCompletionClient::new(&["Hi ", "there"]));
    let base_url = serve(client).await;

    let backend = Arc::new(HttpChatBackend::new(&base_url, None));
    let mut session = SessionController::new(backend, false);

    session.send_message("Hello").await.expect("send succeeds");

    assert_eq!(session.transcript().entries()[1].content, "Hi there");
    assert!(session.conversation_id().is_none());
}

#[tokio::test]
async fn given_unauthorized_token_when_creating_then_backend_reports_it() {
    let client = Arc::new(ScriptedCompletionClient::new(&["unused"]));
    let base_url = serve(client).await;

    let backend = HttpChatBackend::new(&base_url, Some("garbage".to_string()));
    let result = colloquy::application::ports::ChatBackend::create_conversation(
        &backend,
        "Title",
    )
    .await;

    assert!(matches!(
        result,
        Err(colloquy::application::ports::BackendError::Unauthorized)
    ));
}
