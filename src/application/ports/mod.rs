mod chat_backend;
mod completion_client;
mod conversation_repository;
mod identity_verifier;
mod repository_error;

pub use chat_backend::{BackendError, ChatBackend};
pub use completion_client::{ChatTurn, CompletionClient, CompletionError, TokenStream};
pub use conversation_repository::ConversationRepository;
pub use identity_verifier::{IdentityError, IdentityVerifier};
pub use repository_error::RepositoryError;
