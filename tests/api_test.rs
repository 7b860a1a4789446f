mod helpers;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use helpers::{ScriptedCompletionClient, accumulate_sse_content, test_app};

const ALICE: &str = "token-alice";
const BOB: &str = "token-bob";

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    match body {
        Some(value) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(value.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(req).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    (status, String::from_utf8_lossy(&bytes).to_string())
}

async fn create_conversation(app: &Router, token: &str, title: &str) -> String {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/conversations",
            Some(token),
            Some(json!({ "title": title })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let value: Value = serde_json::from_str(&body).expect("json");
    value["id"].as_str().expect("id").to_string()
}

#[tokio::test]
async fn given_running_app_when_probing_health_then_healthy() {
    let app = test_app(Arc::new(ScriptedCompletionClient::new(&[])));

    let (status, body) = send(&app, request("GET", "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("healthy"));
}

#[tokio::test]
async fn given_no_token_when_listing_conversations_then_unauthorized() {
    let app = test_app(Arc::new(ScriptedCompletionClient::new(&[])));

    let (status, _) = send(&app, request("GET", "/conversations", None, None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn given_missing_title_when_creating_conversation_then_bad_request() {
    let app = test_app(Arc::new(ScriptedCompletionClient::new(&[])));

    let (status, _) = send(
        &app,
        request("POST", "/conversations", Some(ALICE), Some(json!({}))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn given_conversations_when_adding_a_message_then_that_conversation_lists_first() {
    let app = test_app(Arc::new(ScriptedCompletionClient::new(&[])));

    let first = create_conversation(&app, ALICE, "First").await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = create_conversation(&app, ALICE, "Second").await;

    let (status, body) = send(&app, request("GET", "/conversations", Some(ALICE), None)).await;
    assert_eq!(status, StatusCode::OK);
    let listed: Vec<Value> = serde_json::from_str(&body).expect("json");
    assert_eq!(listed[0]["id"], second.as_str());
    assert_eq!(listed[1]["id"], first.as_str());

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let (status, _) = send(
        &app,
        request(
            "POST",
            &format!("/conversations/{}/messages", first),
            Some(ALICE),
            Some(json!({ "role": "user", "content": "Hello" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, request("GET", "/conversations", Some(ALICE), None)).await;
    let listed: Vec<Value> = serde_json::from_str(&body).expect("json");
    assert_eq!(listed[0]["id"], first.as_str(), "bumped conversation first");
}

#[tokio::test]
async fn given_foreign_conversation_when_reading_updating_deleting_then_not_found() {
    let app = test_app(Arc::new(ScriptedCompletionClient::new(&[])));

    let id = create_conversation(&app, ALICE, "Alice's chat").await;

    let uri = format!("/conversations/{}", id);
    let (status, body) = send(&app, request("GET", &uri, Some(BOB), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(!body.contains("Alice's chat"), "no data leaks to non-owner");

    let (status, _) = send(
        &app,
        request("PATCH", &uri, Some(BOB), Some(json!({ "title": "Stolen" }))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, request("DELETE", &uri, Some(BOB), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Still intact for the owner.
    let (status, _) = send(&app, request("GET", &uri, Some(ALICE), None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn given_messages_when_listing_then_oldest_first() {
    let app = test_app(Arc::new(ScriptedCompletionClient::new(&[])));

    let id = create_conversation(&app, ALICE, "Chat").await;
    let messages_uri = format!("/conversations/{}/messages", id);

    for (role, content) in [("user", "Hello"), ("assistant", "Hi there!"), ("user", "Bye")] {
        let (status, _) = send(
            &app,
            request(
                "POST",
                &messages_uri,
                Some(ALICE),
                Some(json!({ "role": role, "content": content })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, request("GET", &messages_uri, Some(ALICE), None)).await;
    assert_eq!(status, StatusCode::OK);
    let listed: Vec<Value> = serde_json::from_str(&body).expect("json");
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0]["content"], "Hello");
    assert_eq!(listed[1]["content"], "Hi there!");
    assert_eq!(listed[2]["content"], "Bye");
}

#[tokio::test]
async fn given_system_role_when_posting_message_then_bad_request() {
    let app = test_app(Arc::new(ScriptedCompletionClient::new(&[])));

    let id = create_conversation(&app, ALICE, "Chat").await;

    let (status, _) = send(
        &app,
        request(
            "POST",
            &format!("/conversations/{}/messages", id),
            Some(ALICE),
            Some(json!({ "role": "system", "content": "sneaky" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn given_deleted_conversation_then_its_messages_are_gone() {
    let app = test_app(Arc::new(ScriptedCompletionClient::new(&[])));

    let id = create_conversation(&app, ALICE, "Doomed").await;
    let messages_uri = format!("/conversations/{}/messages", id);

    let (status, _) = send(
        &app,
        request(
            "POST",
            &messages_uri,
            Some(ALICE),
            Some(json!({ "role": "user", "content": "Hello" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        request("DELETE", &format!("/conversations/{}", id), Some(ALICE), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, request("GET", &messages_uri, Some(ALICE), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn given_renamed_conversation_when_fetching_then_new_title() {
    let app = test_app(Arc::new(ScriptedCompletionClient::new(&[])));

    let id = create_conversation(&app, ALICE, "Old title").await;
    let uri = format!("/conversations/{}", id);

    let (status, body) = send(
        &app,
        request("PATCH", &uri, Some(ALICE), Some(json!({ "title": "New title" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("true"));

    let (_, body) = send(&app, request("GET", &uri, Some(ALICE), None)).await;
    let value: Value = serde_json::from_str(&body).expect("json");
    assert_eq!(value["title"], "New title");
}

#[tokio::test]
async fn given_streamed_chat_when_accumulating_fragments_then_full_reply() {
    let client = Arc::new(ScriptedCompletionClient::new(&["Hel", "lo, ", "world!"]));
    let app = test_app(client.clone());

    // No Authorization header: the relay serves guests too.
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/chat",
            None,
            Some(json!({ "messages": [{ "role": "user", "content": "Say hello" }] })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(accumulate_sse_content(&body), "Hello, world!");
    assert!(body.contains("[DONE]"));
    assert_eq!(client.attempts(), 1);
}

#[tokio::test]
async fn given_mid_stream_failure_when_chatting_then_error_event_replaces_done() {
    let client = Arc::new(ScriptedCompletionClient::new(&["Partial "]).with_mid_stream_error());
    let app = test_app(client);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/chat",
            None,
            Some(json!({ "messages": [{ "role": "user", "content": "Hello" }] })),
        ),
    )
    .await;

    // Establishment succeeded, so the status is already 200; the failure has
    // to travel in-band.
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""error""#));
    assert!(!body.contains("[DONE]"), "a failed stream must not look complete");
}

#[tokio::test]
async fn given_missing_messages_when_chatting_then_bad_request_without_upstream_call() {
    let client = Arc::new(ScriptedCompletionClient::new(&["unused"]));
    let app = test_app(client.clone());

    let (status, _) = send(&app, request("POST", "/chat", None, Some(json!({})))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(client.attempts(), 0, "upstream must not be contacted");
}

#[tokio::test]
async fn given_unreachable_upstream_when_chatting_then_500_after_three_attempts() {
    let client =
        Arc::new(ScriptedCompletionClient::new(&["unused"]).with_connect_failures(usize::MAX));
    let app = test_app(client.clone());

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/chat",
            None,
            Some(json!({ "messages": [{ "role": "user", "content": "Anyone there?" }] })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(client.attempts(), 3);
}

#[tokio::test]
async fn given_unknown_role_when_chatting_then_bad_request() {
    let client = Arc::new(ScriptedCompletionClient::new(&["unused"]));
    let app = test_app(client.clone());

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/chat",
            None,
            Some(json!({ "messages": [{ "role": "robot", "content": "beep" }] })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(client.attempts(), 0);
}
