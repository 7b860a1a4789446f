#![allow(dead_code)]

pub mod test_postgres;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use tokio::sync::Mutex;

use colloquy::application::ports::{
    BackendError, ChatBackend, ChatTurn, CompletionClient, CompletionError, IdentityError,
    IdentityVerifier, TokenStream,
};
use colloquy::application::services::{
    ConversationListCache, ConversationService, RelayConfig, RelayService,
};
use colloquy::domain::{ConversationId, MessageId, MessageRole, UserId};
use colloquy::infrastructure::persistence::InMemoryConversationRepository;
use colloquy::presentation::{AppState, create_router};

/// Accepts tokens of the form `token-<subject>`.
pub struct MockIdentityVerifier;

#[async_trait]
impl IdentityVerifier for MockIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<UserId, IdentityError> {
        token
            .strip_prefix("token-")
            .map(UserId::new)
            .ok_or_else(|| IdentityError::InvalidToken("unknown token".to_string()))
    }
}

/// Completion client with a scripted reply. Counts connection attempts and
/// can fail the first N of them, or inject a terminal mid-stream error.
pub struct ScriptedCompletionClient {
    fragments: Vec<String>,
    attempts: AtomicUsize,
    connect_failures: AtomicUsize,
    mid_stream_error: bool,
    pub seen_turns: Mutex<Vec<ChatTurn>>,
}

impl ScriptedCompletionClient {
    pub fn new(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|s| s.to_string()).collect(),
            attempts: AtomicUsize::new(0),
            connect_failures: AtomicUsize::new(0),
            mid_stream_error: false,
            seen_turns: Mutex::new(Vec::new()),
        }
    }

    pub fn with_connect_failures(mut self, n: usize) -> Self {
        self.connect_failures = AtomicUsize::new(n);
        self
    }

    pub fn with_mid_stream_error(mut self) -> Self {
        self.mid_stream_error = true;
        self
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletionClient {
    async fn complete(&self, turns: &[ChatTurn]) -> Result<String, CompletionError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        *self.seen_turns.lock().await = turns.to_vec();
        Ok(self.fragments.concat())
    }

    async fn open_stream(&self, turns: &[ChatTurn]) -> Result<TokenStream, CompletionError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        *self.seen_turns.lock().await = turns.to_vec();

        if self
            .connect_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(CompletionError::ConnectFailed("connection refused".to_string()));
        }

        let fragments = self.fragments.clone();
        let mid_stream_error = self.mid_stream_error;
        let stream = async_stream::stream! {
            for fragment in fragments {
                yield Ok(fragment);
            }
            if mid_stream_error {
                yield Err(CompletionError::Stream("connection reset".to_string()));
            }
        };
        Ok(Box::pin(stream))
    }
}

/// `ChatBackend` double for session controller tests: records every call and
/// can be told to fail specific steps.
#[derive(Default)]
pub struct RecordingBackend {
    pub fragments: Vec<String>,
    pub fail_create: bool,
    pub fail_persist: bool,
    pub fail_connect: bool,
    pub mid_stream_error: bool,
    pub created_titles: Mutex<Vec<String>>,
    pub persisted: Mutex<Vec<(ConversationId, MessageRole, String)>>,
    pub streamed_prompts: Mutex<Vec<Vec<ChatTurn>>>,
}

impl RecordingBackend {
    pub fn replying(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl ChatBackend for RecordingBackend {
    async fn create_conversation(&self, title: &str) -> Result<ConversationId, BackendError> {
        if self.fail_create {
            return Err(BackendError::Request("create failed".to_string()));
        }
        self.created_titles.lock().await.push(title.to_string());
        Ok(ConversationId::new())
    }

    async fn persist_message(
        &self,
        conversation_id: ConversationId,
        role: MessageRole,
        content: &str,
    ) -> Result<MessageId, BackendError> {
        if self.fail_persist {
            return Err(BackendError::Request("persist failed".to_string()));
        }
        self.persisted
            .lock()
            .await
            .push((conversation_id, role, content.to_string()));
        Ok(MessageId::new())
    }

    async fn stream_completion(&self, turns: &[ChatTurn]) -> Result<TokenStream, BackendError> {
        if self.fail_connect {
            return Err(BackendError::Upstream("unreachable".to_string()));
        }
        self.streamed_prompts.lock().await.push(turns.to_vec());

        let fragments = self.fragments.clone();
        let mid_stream_error = self.mid_stream_error;
        let stream = async_stream::stream! {
            for fragment in fragments {
                yield Ok(fragment);
            }
            if mid_stream_error {
                yield Err(CompletionError::Stream("connection reset".to_string()));
            }
        };
        Ok(Box::pin(stream))
    }
}

pub const TEST_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

pub fn test_relay_config() -> RelayConfig {
    RelayConfig {
        system_prompt: TEST_SYSTEM_PROMPT.to_string(),
        connect_attempts: 3,
        retry_delay: Duration::from_millis(10),
    }
}

/// Full router wired to an in-memory store, the mock verifier and the given
/// completion client.
pub fn test_app(completion_client: Arc<dyn CompletionClient>) -> Router {
    let repository = Arc::new(InMemoryConversationRepository::new());
    let list_cache = ConversationListCache::new(Duration::from_secs(30));
    let conversation_service = Arc::new(ConversationService::new(repository, list_cache));
    let relay_service = Arc::new(RelayService::new(completion_client, test_relay_config()));

    create_router(AppState {
        relay_service,
        conversation_service,
        identity_verifier: Arc::new(MockIdentityVerifier),
        sse_keep_alive: Duration::from_secs(15),
    })
}

/// Concatenates the `content` fields of an SSE chat response body, the way a
/// browser client would after filtering framing and keep-alives.
pub fn accumulate_sse_content(body: &str) -> String {
    let mut accumulated = String::new();
    for line in body.lines() {
        if line.starts_with(':') {
            continue;
        }
        let Some(data) = line.strip_prefix("data: ") else {
            continue;
        };
        if data == "[DONE]" {
            break;
        }
        let value: serde_json::Value = serde_json::from_str(data).expect("fragment is JSON");
        accumulated.push_str(value["content"].as_str().expect("content is a string"));
    }
    accumulated
}
