use chrono::{DateTime, Utc};

use super::{ConversationId, UserId};

pub const UNTITLED_PLACEHOLDER: &str = "New conversation";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: ConversationId,
    pub owner_id: UserId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(owner_id: UserId, title: Option<String>) -> Self {
        let now = Utc::now();
        let title = match title {
            Some(t) if !t.trim().is_empty() => t,
            _ => UNTITLED_PLACEHOLDER.to_string(),
        };
        Self {
            id: ConversationId::new(),
            owner_id,
            title,
            created_at: now,
            updated_at: now,
        }
    }
}
