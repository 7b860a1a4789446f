use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::domain::{Conversation, UserId};

/// Time-bounded cache of per-owner conversation listings. Any mutation of an
/// owner's conversations must call `invalidate`; entries are dropped
/// wholesale, never patched in place.
pub struct ConversationListCache {
    entries: DashMap<UserId, CachedList>,
    ttl: Duration,
}

struct CachedList {
    fetched_at: Instant,
    conversations: Vec<Conversation>,
}

impl ConversationListCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, owner: &UserId) -> Option<Vec<Conversation>> {
        if self.ttl.is_zero() {
            return None;
        }

        let entry = self.entries.get(owner)?;
        if entry.fetched_at.elapsed() > self.ttl {
            drop(entry);
            self.entries.remove(owner);
            return None;
        }
        Some(entry.conversations.clone())
    }

    pub fn put(&self, owner: &UserId, conversations: Vec<Conversation>) {
        if self.ttl.is_zero() {
            return;
        }

        self.entries.insert(
            owner.clone(),
            CachedList {
                fetched_at: Instant::now(),
                conversations,
            },
        );
    }

    pub fn invalidate(&self, owner: &UserId) {
        self.entries.remove(owner);
    }
}
