use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::ChatListError;
use crate::types::{Conversation, IndexPath, Section};

/// Immutable snapshot of what the chat list should display.
///
/// Pinned conversations keep the global pin order; unpinned ones keep the
/// store's display order. The two id sets never overlap.
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    pinned: IndexMap<String, Arc<Conversation>>,
    unpinned: Vec<Arc<Conversation>>,
    archive_count: usize,
    inbox_count: usize,
}

impl RenderState {
    /// Build a state, rejecting ids that appear twice across both sections.
    pub fn new(
        pinned: Vec<Arc<Conversation>>,
        unpinned: Vec<Arc<Conversation>>,
        archive_count: usize,
        inbox_count: usize,
    ) -> Result<Self, ChatListError> {
        let mut pinned_map = IndexMap::with_capacity(pinned.len());
        for conv in pinned {
            let id = conv.id.clone();
            if pinned_map.insert(id.clone(), conv).is_some() {
                return Err(ChatListError::DiffInvariant(format!(
                    "conversation {} pinned twice",
                    id
                )));
            }
        }

        let mut seen: HashSet<&str> = HashSet::with_capacity(unpinned.len());
        for conv in &unpinned {
            if pinned_map.contains_key(conv.id.as_str()) || !seen.insert(conv.id.as_str()) {
                return Err(ChatListError::DiffInvariant(format!(
                    "conversation {} listed twice",
                    conv.id
                )));
            }
        }

        Ok(Self {
            pinned: pinned_map,
            unpinned,
            archive_count,
            inbox_count,
        })
    }

    pub fn empty(archive_count: usize, inbox_count: usize) -> Self {
        Self {
            archive_count,
            inbox_count,
            ..Self::default()
        }
    }

    pub fn archive_count(&self) -> usize {
        self.archive_count
    }

    pub fn inbox_count(&self) -> usize {
        self.inbox_count
    }

    pub fn pinned(&self) -> impl Iterator<Item = &Arc<Conversation>> {
        self.pinned.values()
    }

    pub fn unpinned(&self) -> &[Arc<Conversation>] {
        &self.unpinned
    }

    pub fn pinned_ids(&self) -> Vec<String> {
        self.pinned.keys().cloned().collect()
    }

    pub fn unpinned_ids(&self) -> Vec<String> {
        self.unpinned.iter().map(|c| c.id.clone()).collect()
    }

    pub fn all_ids(&self) -> HashSet<String> {
        self.pinned
            .keys()
            .cloned()
            .chain(self.unpinned.iter().map(|c| c.id.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pinned.len() + self.unpinned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pinned.is_empty() && self.unpinned.is_empty()
    }

    pub fn has_pinned_and_unpinned(&self) -> bool {
        !self.pinned.is_empty() && !self.unpinned.is_empty()
    }

    pub fn is_pinned(&self, id: &str) -> bool {
        self.pinned.contains_key(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_path_of(id).is_some()
    }

    pub fn number_of_rows(&self, section: Section) -> usize {
        match section {
            Section::Pinned => self.pinned.len(),
            Section::Unpinned => self.unpinned.len(),
            Section::Reminders | Section::ArchiveButton => 0,
        }
    }

    pub fn item_at(&self, path: IndexPath) -> Option<&Arc<Conversation>> {
        match path.section {
            Section::Pinned => self.pinned.get_index(path.row).map(|(_, conv)| conv),
            Section::Unpinned => self.unpinned.get(path.row),
            Section::Reminders | Section::ArchiveButton => None,
        }
    }

    /// Unpinned rows are searched first; they are the common case.
    pub fn index_path_of(&self, id: &str) -> Option<IndexPath> {
        if let Some(row) = self.unpinned.iter().position(|c| c.id == id) {
            return Some(IndexPath::unpinned(row));
        }
        self.pinned.get_index_of(id).map(IndexPath::pinned)
    }

    /// The conversation displayed above `id`. Never steps from the unpinned
    /// section back into the pinned one.
    pub fn item_before(&self, id: &str) -> Option<&Arc<Conversation>> {
        let path = self.index_path_of(id)?;
        if path.row == 0 {
            return None;
        }
        self.item_at(IndexPath::new(path.section, path.row - 1))
    }

    /// The conversation displayed below `id`. The last pinned conversation
    /// is followed by the first unpinned one.
    pub fn item_after(&self, id: &str) -> Option<&Arc<Conversation>> {
        let path = self.index_path_of(id)?;
        let next = IndexPath::new(path.section, path.row + 1);
        match self.item_at(next) {
            Some(conv) => Some(conv),
            None if path.section == Section::Pinned => self.unpinned.first(),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convs(ids: &[&str]) -> Vec<Arc<Conversation>> {
        ids.iter().map(|id| Arc::new(Conversation::new(*id, 0))).collect()
    }

    fn state(pinned: &[&str], unpinned: &[&str]) -> RenderState {
        RenderState::new(convs(pinned), convs(unpinned), 0, pinned.len() + unpinned.len())
            .expect("valid state")
    }

    #[test]
    fn test_lookups() {
        let s = state(&["p1", "p2"], &["a", "b", "c"]);

        assert_eq!(s.len(), 5);
        assert!(s.has_pinned_and_unpinned());
        assert_eq!(s.number_of_rows(Section::Pinned), 2);
        assert_eq!(s.number_of_rows(Section::Unpinned), 3);
        assert_eq!(s.number_of_rows(Section::Reminders), 0);

        assert_eq!(s.item_at(IndexPath::pinned(1)).unwrap().id, "p2");
        assert_eq!(s.item_at(IndexPath::unpinned(2)).unwrap().id, "c");
        assert!(s.item_at(IndexPath::unpinned(3)).is_none());
        assert!(s.item_at(IndexPath::new(Section::ArchiveButton, 0)).is_none());

        assert_eq!(s.index_path_of("b"), Some(IndexPath::unpinned(1)));
        assert_eq!(s.index_path_of("p1"), Some(IndexPath::pinned(0)));
        assert_eq!(s.index_path_of("zz"), None);
        assert!(s.is_pinned("p2"));
        assert!(!s.is_pinned("a"));
    }

    #[test]
    fn test_neighbors() {
        let s = state(&["p1", "p2"], &["a", "b"]);

        assert_eq!(s.item_after("p1").unwrap().id, "p2");
        assert_eq!(s.item_after("p2").unwrap().id, "a");
        assert_eq!(s.item_after("a").unwrap().id, "b");
        assert!(s.item_after("b").is_none());

        assert_eq!(s.item_before("b").unwrap().id, "a");
        assert!(s.item_before("a").is_none());
        assert_eq!(s.item_before("p2").unwrap().id, "p1");
        assert!(s.item_before("p1").is_none());
        assert!(s.item_before("missing").is_none());
    }

    #[test]
    fn test_last_pinned_without_unpinned() {
        let s = state(&["p1"], &[]);
        assert!(s.item_after("p1").is_none());
        assert!(!s.has_pinned_and_unpinned());
    }

    #[test]
    fn test_rejects_overlapping_sections() {
        let err = RenderState::new(convs(&["a"]), convs(&["a"]), 0, 1).unwrap_err();
        assert!(err.is_invariant_violation());

        assert!(RenderState::new(vec![], convs(&["a", "a"]), 0, 2).is_err());
        assert!(RenderState::new(convs(&["a", "a"]), vec![], 0, 2).is_err());
    }

    #[test]
    fn test_empty_keeps_counts() {
        let s = RenderState::empty(3, 9);
        assert!(s.is_empty());
        assert_eq!(s.archive_count(), 3);
        assert_eq!(s.inbox_count(), 9);
        assert!(s.all_ids().is_empty());
    }
}
