use std::sync::Arc;

use futures::StreamExt;

use crate::application::ports::{BackendError, ChatBackend, ChatTurn};
use crate::domain::{ConversationId, MessageRole};

use super::{EntryId, Transcript};

const DERIVED_TITLE_MAX_CHARS: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    AwaitingConversation,
    PersistingUserMessage,
    StreamingReply,
    PersistingAssistantMessage,
}

/// Drives one conversation view: optimistic transcript updates, durable
/// writes through the backend, and incremental application of the streamed
/// reply.
///
/// A signed-out controller ("guest mode") never touches the backend's
/// persistence calls; the transcript lives only as long as this value.
///
/// Cancellation is dropping the `send_message` future: the stream's read side
/// closes and whatever partial reply was accumulated is never persisted.
pub struct SessionController<B: ChatBackend> {
    backend: Arc<B>,
    signed_in: bool,
    conversation_id: Option<ConversationId>,
    transcript: Transcript,
    phase: SessionPhase,
}

impl<B: ChatBackend> SessionController<B> {
    pub fn new(backend: Arc<B>, signed_in: bool) -> Self {
        Self {
            backend,
            signed_in,
            conversation_id: None,
            transcript: Transcript::new(),
            phase: SessionPhase::Idle,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn conversation_id(&self) -> Option<ConversationId> {
        self.conversation_id
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Switches to another conversation (or a fresh one for `None`),
    /// discarding the current transcript and any partially streamed text.
    pub fn select_conversation(&mut self, id: Option<ConversationId>) {
        self.conversation_id = id;
        self.transcript.clear();
        self.phase = SessionPhase::Idle;
    }

    /// Runs the full send sequence: optimistic append, conversation creation
    /// if needed, durable user-message write, streamed reply, durable
    /// assistant-message write. The user message is stored before the
    /// completion request goes out so persisted history always reflects what
    /// was sent upstream.
    pub async fn send_message(&mut self, content: &str) -> Result<(), SessionError> {
        let user_entry = self.transcript.push(MessageRole::User, content);

        if self.signed_in {
            let conversation_id = match self.conversation_id {
                Some(id) => id,
                None => {
                    self.phase = SessionPhase::AwaitingConversation;
                    let title = derive_title(content);
                    match self.backend.create_conversation(&title).await {
                        Ok(id) => {
                            self.conversation_id = Some(id);
                            id
                        }
                        Err(e) => return self.fail_rollback(user_entry, None, e),
                    }
                }
            };

            self.phase = SessionPhase::PersistingUserMessage;
            match self
                .backend
                .persist_message(conversation_id, MessageRole::User, content)
                .await
            {
                Ok(server_id) => {
                    self.transcript.retag(user_entry, server_id);
                }
                Err(e) => return self.fail_rollback(user_entry, None, e),
            }
        }

        self.phase = SessionPhase::StreamingReply;
        let turns: Vec<ChatTurn> = self
            .transcript
            .entries()
            .iter()
            .map(|e| ChatTurn::new(e.role, e.content.clone()))
            .collect();

        let mut stream = match self.backend.stream_completion(&turns).await {
            Ok(stream) => stream,
            Err(e) => {
                // The user message stays: it was already sent (and, when
                // signed in, stored) before the stream was requested.
                self.phase = SessionPhase::Idle;
                return Err(SessionError::Upstream(e.to_string()));
            }
        };

        let assistant_entry = self.transcript.push(MessageRole::Assistant, "");
        let mut accumulated = String::new();

        while let Some(fragment) = stream.next().await {
            match fragment {
                Ok(text) => {
                    accumulated.push_str(&text);
                    self.transcript.set_content(assistant_entry, &accumulated);
                }
                Err(e) => {
                    // Terminal: the partial reply stays visible but is never
                    // persisted.
                    self.phase = SessionPhase::Idle;
                    return Err(SessionError::StreamFailed(e.to_string()));
                }
            }
        }

        if self.signed_in {
            if let Some(conversation_id) = self.conversation_id {
                self.phase = SessionPhase::PersistingAssistantMessage;
                match self
                    .backend
                    .persist_message(conversation_id, MessageRole::Assistant, &accumulated)
                    .await
                {
                    Ok(server_id) => {
                        self.transcript.retag(assistant_entry, server_id);
                    }
                    Err(e) => {
                        self.phase = SessionPhase::Idle;
                        return Err(SessionError::Persistence(e.to_string()));
                    }
                }
            }
        }

        self.phase = SessionPhase::Idle;
        Ok(())
    }

    fn fail_rollback(
        &mut self,
        user_entry: EntryId,
        assistant_entry: Option<EntryId>,
        err: BackendError,
    ) -> Result<(), SessionError> {
        self.transcript.remove(user_entry);
        if let Some(entry) = assistant_entry {
            self.transcript.remove(entry);
        }
        self.phase = SessionPhase::Idle;
        Err(SessionError::Persistence(err.to_string()))
    }
}

/// Title for a conversation created implicitly by its first message.
fn derive_title(content: &str) -> String {
    let first_line = content.lines().next().unwrap_or("").trim();
    if first_line.is_empty() {
        return crate::domain::UNTITLED_PLACEHOLDER.to_string();
    }
    first_line.chars().take(DERIVED_TITLE_MAX_CHARS).collect()
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("persistence failed: {0}")]
    Persistence(String),
    #[error("upstream unavailable: {0}")]
    Upstream(String),
    #[error("reply stream failed: {0}")]
    StreamFailed(String),
}
