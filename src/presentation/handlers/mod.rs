mod chat;
mod conversations;
mod health;
mod messages;

pub use chat::chat_handler;
pub use conversations::{
    create_conversation_handler, delete_conversation_handler, get_conversation_handler,
    list_conversations_handler, update_title_handler,
};
pub use health::health_handler;
pub use messages::{create_message_handler, list_messages_handler};
