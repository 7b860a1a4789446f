use std::collections::HashMap;

use crate::domain::{MessageId, MessageRole};

/// Identity of a transcript entry. Entries start out with a locally issued
/// id and are re-tagged with the server id once the write is confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryId {
    Local(u64),
    Server(MessageId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub id: EntryId,
    pub role: MessageRole,
    pub content: String,
}

/// In-memory conversation view: an ordered vector plus an id-to-index map so
/// re-tagging and in-place content updates never reshuffle the list.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    index: HashMap<EntryId, usize>,
    next_local: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, role: MessageRole, content: impl Into<String>) -> EntryId {
        let id = EntryId::Local(self.next_local);
        self.next_local += 1;

        self.index.insert(id, self.entries.len());
        self.entries.push(TranscriptEntry {
            id,
            role,
            content: content.into(),
        });
        id
    }

    /// Replaces the content of an entry, keeping its position. Returns false
    /// when the id is unknown (e.g. already rolled back).
    pub fn set_content(&mut self, id: EntryId, content: &str) -> bool {
        match self.index.get(&id) {
            Some(&pos) => {
                self.entries[pos].content = content.to_string();
                true
            }
            None => false,
        }
    }

    /// Swaps a local id for the server-issued one without touching content or
    /// order, so a just-streamed reply is never discarded by a refetch.
    pub fn retag(&mut self, id: EntryId, server_id: MessageId) -> bool {
        let Some(pos) = self.index.remove(&id) else {
            return false;
        };
        let new_id = EntryId::Server(server_id);
        self.entries[pos].id = new_id;
        self.index.insert(new_id, pos);
        true
    }

    /// Rollback of an optimistic append. Later entries shift down one slot.
    pub fn remove(&mut self, id: EntryId) -> Option<TranscriptEntry> {
        let pos = self.index.remove(&id)?;
        let entry = self.entries.remove(pos);
        for (i, e) in self.entries.iter().enumerate().skip(pos) {
            self.index.insert(e.id, i);
        }
        Some(entry)
    }

    pub fn get(&self, id: EntryId) -> Option<&TranscriptEntry> {
        self.index.get(&id).map(|&pos| &self.entries[pos])
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
