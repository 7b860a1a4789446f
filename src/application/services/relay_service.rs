use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{ChatTurn, CompletionClient, CompletionError, TokenStream};
use crate::domain::MessageRole;

/// Tuning for the upstream connection. The persona turn is prepended to every
/// request and never appears in stored history.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub system_prompt: String,
    pub connect_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            system_prompt: "You are a helpful assistant.".to_string(),
            connect_attempts: 3,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// Forwards a conversation to the upstream completion endpoint and hands the
/// token stream back to the caller. Performs no persistence.
pub struct RelayService {
    client: Arc<dyn CompletionClient>,
    config: RelayConfig,
}

impl RelayService {
    pub fn new(client: Arc<dyn CompletionClient>, config: RelayConfig) -> Self {
        Self { client, config }
    }

    /// Opens a streaming completion, retrying connection establishment up to
    /// the configured bound with a fixed delay between attempts. Attempts are
    /// strictly sequential. Mid-stream failures are not retried here; they
    /// travel through the returned stream and are terminal.
    #[tracing::instrument(skip(self, turns), fields(turns = turns.len()))]
    pub async fn stream_reply(&self, turns: Vec<ChatTurn>) -> Result<TokenStream, RelayError> {
        let upstream = self.prepare_turns(turns)?;

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.client.open_stream(&upstream).await {
                Ok(stream) => return Ok(stream),
                Err(CompletionError::ConnectFailed(reason))
                    if attempt < self.config.connect_attempts =>
                {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.config.connect_attempts,
                        reason = %reason,
                        "Upstream connection failed, retrying"
                    );
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(e) => {
                    tracing::error!(attempt, error = %e, "Upstream connection failed");
                    return Err(RelayError::UpstreamUnavailable(e.to_string()));
                }
            }
        }
    }

    /// Non-streaming completion over the same prompt assembly.
    #[tracing::instrument(skip(self, turns), fields(turns = turns.len()))]
    pub async fn complete_reply(&self, turns: Vec<ChatTurn>) -> Result<String, RelayError> {
        let upstream = self.prepare_turns(turns)?;

        self.client
            .complete(&upstream)
            .await
            .map_err(|e| RelayError::UpstreamUnavailable(e.to_string()))
    }

    fn prepare_turns(&self, turns: Vec<ChatTurn>) -> Result<Vec<ChatTurn>, RelayError> {
        if turns.is_empty() {
            return Err(RelayError::InvalidRequest(
                "messages must not be empty".to_string(),
            ));
        }

        let mut upstream = Vec::with_capacity(turns.len() + 1);
        upstream.push(ChatTurn::new(
            MessageRole::System,
            self.config.system_prompt.clone(),
        ));
        upstream.extend(turns);
        Ok(upstream)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
}
