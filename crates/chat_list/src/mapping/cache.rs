//! Bounded read cache for hydrated conversations.
//!
//! Uses `IndexMap` for LRU ordering: hits move an entry to the back and, on
//! overflow, entries are evicted from the front. The cache is owned by the
//! state builder and only touched from the list's thread, so no locking.
//! Callers must evict ids whose rows changed before the next build.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;

use crate::types::Conversation;

#[derive(Debug)]
pub struct HydrationCache {
    entries: IndexMap<String, Arc<Conversation>>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl HydrationCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: IndexMap::new(),
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, id: &str) -> Option<Arc<Conversation>> {
        let Some(idx) = self.entries.get_index_of(id) else {
            self.misses += 1;
            return None;
        };
        let last = self.entries.len() - 1;
        self.entries.move_index(idx, last);
        self.hits += 1;
        self.entries.get_index(last).map(|(_, conv)| conv.clone())
    }

    /// Look up every id, returning only the hits.
    pub fn get_many(&mut self, ids: &[String]) -> HashMap<String, Arc<Conversation>> {
        let mut found = HashMap::with_capacity(ids.len());
        for id in ids {
            if let Some(conv) = self.get(id) {
                found.insert(id.clone(), conv);
            }
        }
        found
    }

    pub fn insert(&mut self, conv: Arc<Conversation>) {
        if let Some(idx) = self.entries.get_index_of(conv.id.as_str()) {
            self.entries.shift_remove_index(idx);
        }
        while self.entries.len() >= self.capacity {
            self.entries.shift_remove_index(0);
        }
        self.entries.insert(conv.id.clone(), conv);
    }

    pub fn evict<'a>(&mut self, ids: impl IntoIterator<Item = &'a String>) {
        for id in ids {
            self.entries.shift_remove(id.as_str());
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
