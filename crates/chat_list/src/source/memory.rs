use std::cell::Cell;
use std::collections::HashSet;

use super::ItemSource;
use crate::error::ChatListError;
use crate::types::Conversation;

/// In-memory store used by the mapping tests.
#[derive(Debug, Default)]
pub(crate) struct MemorySource {
    pub conversations: Vec<Conversation>,
    pub pins: Vec<String>,
    /// Drop one conversation from every bulk fetch
    pub short_bulk_fetch: bool,
    /// Drop one conversation from enumeration as well
    pub short_enumerate: bool,
    pub fail_queries: bool,
    pub bulk_fetch_calls: Cell<usize>,
    pub enumerate_calls: Cell<usize>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an inbox conversation; later calls get older timestamps so the
    /// insertion order is the display order.
    pub fn with_inbox(mut self, ids: &[&str]) -> Self {
        for id in ids {
            self.push(id, false);
        }
        self
    }

    pub fn with_archived(mut self, ids: &[&str]) -> Self {
        for id in ids {
            self.push(id, true);
        }
        self
    }

    pub fn with_pins(mut self, ids: &[&str]) -> Self {
        self.pins = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    fn push(&mut self, id: &str, archived: bool) {
        let date = 1_000_000 - self.conversations.len() as i64;
        let mut conv = Conversation::new(id, date);
        conv.title = id.to_uppercase();
        conv.is_archived = archived;
        self.conversations.push(conv);
    }

    pub fn set_visible(&mut self, id: &str, visible: bool) {
        if let Some(conv) = self.conversations.iter_mut().find(|c| c.id == id) {
            conv.should_be_visible = visible;
        }
    }

    /// Give a conversation the newest timestamp, moving it to the top.
    pub fn bump(&mut self, id: &str) {
        let newest = self
            .conversations
            .iter()
            .map(|c| c.last_message_date)
            .max()
            .unwrap_or(0);
        if let Some(conv) = self.conversations.iter_mut().find(|c| c.id == id) {
            conv.last_message_date = newest + 1;
        }
    }

    pub fn set_archived(&mut self, id: &str, archived: bool) {
        if let Some(conv) = self.conversations.iter_mut().find(|c| c.id == id) {
            conv.is_archived = archived;
        }
    }

    pub fn remove(&mut self, id: &str) {
        self.conversations.retain(|c| c.id != id);
    }

    fn check(&self) -> Result<(), ChatListError> {
        if self.fail_queries {
            return Err(ChatListError::StoreQuery("store unavailable".into()));
        }
        Ok(())
    }

    fn visible(&self, archived: bool) -> Vec<&Conversation> {
        let mut visible: Vec<&Conversation> = self
            .conversations
            .iter()
            .filter(|c| c.should_be_visible && c.is_archived == archived)
            .collect();
        visible.sort_by(|a, b| {
            b.last_message_date
                .cmp(&a.last_message_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        visible
    }
}

impl ItemSource for MemorySource {
    fn visible_count(&self, archived: bool) -> Result<usize, ChatListError> {
        self.check()?;
        Ok(self.visible(archived).len())
    }

    fn visible_ids(&self, archived: bool) -> Result<Vec<String>, ChatListError> {
        self.check()?;
        Ok(self.visible(archived).iter().map(|c| c.id.clone()).collect())
    }

    fn pinned_id_ordering(&self) -> Result<Vec<String>, ChatListError> {
        self.check()?;
        Ok(self.pins.clone())
    }

    fn bulk_fetch(&self, ids: &HashSet<String>) -> Result<Vec<Conversation>, ChatListError> {
        self.check()?;
        self.bulk_fetch_calls.set(self.bulk_fetch_calls.get() + 1);
        let mut loaded: Vec<Conversation> = self
            .conversations
            .iter()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect();
        if self.short_bulk_fetch {
            loaded.pop();
        }
        Ok(loaded)
    }

    fn enumerate_visible(
        &self,
        archived: bool,
        visit: &mut dyn FnMut(Conversation),
    ) -> Result<(), ChatListError> {
        self.check()?;
        self.enumerate_calls.set(self.enumerate_calls.get() + 1);
        let mut visible = self.visible(archived);
        if self.short_enumerate {
            visible.pop();
        }
        for conv in visible {
            visit(conv.clone());
        }
        Ok(())
    }

    fn fetch(&self, id: &str) -> Result<Option<Conversation>, ChatListError> {
        self.check()?;
        Ok(self.conversations.iter().find(|c| c.id == id).cloned())
    }
}
