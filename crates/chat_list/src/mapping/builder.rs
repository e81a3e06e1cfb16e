//! Render state construction
//!
//! Loading the list is a hot path. We try to hydrate conversations from the
//! in-memory cache and fetch only the misses in one bulk query. If anything
//! looks off (too many misses, a short bulk fetch, a missing row) we fall
//! back to enumerating the visible conversations directly, which is robust
//! but expensive.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

use super::cache::HydrationCache;
use super::render_state::RenderState;
use crate::config::ListConfig;
use crate::error::ChatListError;
use crate::services::logger::fmt_ms;
use crate::source::ItemSource;
use crate::types::{Conversation, Section, ViewMode};

pub struct StateBuilder {
    cache: HydrationCache,
    max_batch_size: usize,
}

impl StateBuilder {
    pub fn new(config: &ListConfig) -> Self {
        Self {
            cache: HydrationCache::new(config.hydration_cache_capacity),
            max_batch_size: config.max_incremental_row_changes,
        }
    }

    pub fn cache(&self) -> &HydrationCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut HydrationCache {
        &mut self.cache
    }

    /// Build a fresh render state for `mode` from one store snapshot.
    pub fn build<S: ItemSource + ?Sized>(
        &mut self,
        mode: ViewMode,
        source: &S,
    ) -> Result<RenderState, ChatListError> {
        let started = Instant::now();

        // Both counts are always needed: the inbox shows "N archived".
        let archive_count = source.visible_count(true)?;
        let inbox_count = source.visible_count(false)?;

        let pinned_ordering = source.pinned_id_ordering()?;
        let conversations = self.load_conversations(mode, source)?;

        let state = partition(mode, &pinned_ordering, conversations, archive_count, inbox_count)?;

        debug!(
            "update chat list mapping ({}): {} pinned, {} unpinned in {} (cache hit rate {:.0}%)",
            mode.as_str(),
            state.number_of_rows(Section::Pinned),
            state.number_of_rows(Section::Unpinned),
            fmt_ms(started.elapsed()),
            self.cache.hit_rate() * 100.0
        );

        Ok(state)
    }

    /// Like [`build`](Self::build), but degrades to an empty state on
    /// failure. Counts that could still be read are kept.
    pub fn build_or_empty<S: ItemSource + ?Sized>(
        &mut self,
        mode: ViewMode,
        source: &S,
    ) -> RenderState {
        match self.build(mode, source) {
            Ok(state) => state,
            Err(e) => {
                error!("Failed to build chat list ({}): {}", mode.as_str(), e);
                degraded_state(source)
            }
        }
    }

    fn load_conversations<S: ItemSource + ?Sized>(
        &mut self,
        mode: ViewMode,
        source: &S,
    ) -> Result<Vec<Arc<Conversation>>, ChatListError> {
        let archived = mode.is_archive();

        // 1. Fetch the ids of the visible conversations.
        let ids = source.visible_ids(archived)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        match self.load_with_cache(&ids, source)? {
            Some(conversations) => Ok(conversations),
            None => self.load_without_cache(archived, ids.len(), source),
        }
    }

    /// Returns `None` when the fast path cannot be trusted.
    fn load_with_cache<S: ItemSource + ?Sized>(
        &mut self,
        ids: &[String],
        source: &S,
    ) -> Result<Option<Vec<Arc<Conversation>>>, ChatListError> {
        // 2. Pull as many conversations as possible from the cache.
        let mut by_id: HashMap<String, Arc<Conversation>> = self.cache.get_many(ids);

        let to_load: HashSet<String> = ids
            .iter()
            .filter(|id| !by_id.contains_key(id.as_str()))
            .cloned()
            .collect();

        // 3. Bulk load the misses in a single, bounded query.
        if to_load.len() > self.max_batch_size {
            debug!(
                "{} cache misses exceed batch size {}, enumerating instead",
                to_load.len(),
                self.max_batch_size
            );
            return Ok(None);
        }

        if !to_load.is_empty() {
            let loaded = source.bulk_fetch(&to_load)?;
            if loaded.len() != to_load.len() {
                warn!(
                    "{}",
                    ChatListError::HydrationMismatch {
                        requested: to_load.len(),
                        loaded: loaded.len(),
                    }
                );
                return Ok(None);
            }
            for conv in loaded {
                let conv = Arc::new(conv);
                self.cache.insert(conv.clone());
                by_id.insert(conv.id.clone(), conv);
            }
        }

        // 4. Assemble in display order.
        let mut ordered = Vec::with_capacity(ids.len());
        for id in ids {
            match by_id.get(id.as_str()) {
                Some(conv) => ordered.push(conv.clone()),
                None => {
                    warn!("Couldn't hydrate conversation: {}", id);
                    return Ok(None);
                }
            }
        }
        Ok(Some(ordered))
    }

    fn load_without_cache<S: ItemSource + ?Sized>(
        &mut self,
        archived: bool,
        expected: usize,
        source: &S,
    ) -> Result<Vec<Arc<Conversation>>, ChatListError> {
        let mut ordered = Vec::with_capacity(expected);
        source.enumerate_visible(archived, &mut |conv: Conversation| ordered.push(Arc::new(conv)))?;

        if ordered.len() != expected {
            return Err(ChatListError::HydrationMismatch {
                requested: expected,
                loaded: ordered.len(),
            });
        }

        for conv in &ordered {
            self.cache.insert(conv.clone());
        }
        Ok(ordered)
    }
}

/// An empty state carrying whatever counts can still be read.
pub(crate) fn degraded_state<S: ItemSource + ?Sized>(source: &S) -> RenderState {
    RenderState::empty(
        source.visible_count(true).unwrap_or(0),
        source.visible_count(false).unwrap_or(0),
    )
}

/// Split conversations into the two sections. Pinned conversations end up
/// in pin order, not display order. The archive has no pinned section.
fn partition(
    mode: ViewMode,
    pinned_ordering: &[String],
    conversations: Vec<Arc<Conversation>>,
    archive_count: usize,
    inbox_count: usize,
) -> Result<RenderState, ChatListError> {
    if mode.is_archive() {
        return RenderState::new(Vec::new(), conversations, archive_count, inbox_count);
    }

    let pinned_ids: HashSet<&str> = pinned_ordering.iter().map(String::as_str).collect();

    let mut pinned_by_id: HashMap<String, Arc<Conversation>> = HashMap::new();
    let mut unpinned = Vec::with_capacity(conversations.len());
    for conv in conversations {
        if pinned_ids.contains(conv.id.as_str()) {
            pinned_by_id.insert(conv.id.clone(), conv);
        } else {
            unpinned.push(conv);
        }
    }

    let pinned: Vec<Arc<Conversation>> = pinned_ordering
        .iter()
        .filter_map(|id| pinned_by_id.remove(id.as_str()))
        .collect();

    RenderState::new(pinned, unpinned, archive_count, inbox_count)
}
