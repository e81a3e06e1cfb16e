//! Store boundary
//!
//! The mapping never talks to a database directly. Everything it needs is
//! read through an [`ItemSource`], which represents one consistent,
//! read-only snapshot of the conversation store.

#[cfg(test)]
pub(crate) mod memory;

use std::collections::HashSet;

use crate::error::ChatListError;
use crate::types::Conversation;

pub trait ItemSource {
    /// Number of visible conversations with the given archive state.
    fn visible_count(&self, archived: bool) -> Result<usize, ChatListError>;

    /// Ids of visible conversations in display order (most recent first).
    fn visible_ids(&self, archived: bool) -> Result<Vec<String>, ChatListError>;

    /// The global pin ordering. Not scoped to a view mode and may name
    /// conversations that are not currently visible.
    fn pinned_id_ordering(&self) -> Result<Vec<String>, ChatListError>;

    /// Load the given conversations in one query. Missing ids are simply
    /// absent from the result.
    fn bulk_fetch(&self, ids: &HashSet<String>) -> Result<Vec<Conversation>, ChatListError>;

    /// Visit every visible conversation in display order without relying on
    /// a precomputed id list. Slow but robust.
    fn enumerate_visible(
        &self,
        archived: bool,
        visit: &mut dyn FnMut(Conversation),
    ) -> Result<(), ChatListError>;

    /// Look up a single conversation, visible or not.
    fn fetch(&self, id: &str) -> Result<Option<Conversation>, ChatListError>;
}
