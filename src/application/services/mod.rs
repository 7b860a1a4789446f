mod conversation_cache;
mod conversation_service;
mod relay_service;

pub use conversation_cache::ConversationListCache;
pub use conversation_service::ConversationService;
pub use relay_service::{RelayConfig, RelayError, RelayService};
