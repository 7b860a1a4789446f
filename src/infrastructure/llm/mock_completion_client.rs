use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{ChatTurn, CompletionClient, CompletionError, TokenStream};

/// Streams a fixed reply word by word. Used by scaffold mode and tests.
pub struct MockCompletionClient {
    reply: String,
    fragment_delay: Duration,
}

impl MockCompletionClient {
    pub fn new(reply: String, fragment_delay: Duration) -> Self {
        Self {
            reply,
            fragment_delay,
        }
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(&self, _turns: &[ChatTurn]) -> Result<String, CompletionError> {
        Ok(self.reply.clone())
    }

    async fn open_stream(&self, _turns: &[ChatTurn]) -> Result<TokenStream, CompletionError> {
        let fragments: Vec<String> = self
            .reply
            .split_inclusive(' ')
            .map(str::to_string)
            .collect();
        let delay = self.fragment_delay;

        let stream = async_stream::stream! {
            for fragment in fragments {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                yield Ok(fragment);
            }
        };

        Ok(Box::pin(stream))
    }
}
