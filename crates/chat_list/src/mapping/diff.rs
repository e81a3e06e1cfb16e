//! Row diffing between two render states
//!
//! We want to be economical and issue as few changes as possible. If the
//! first row is deleted, the rows below it don't need explicit moves. To
//! get there we track the "naive" ordering the renderer will end up with
//! after deletes and inserts, and only move rows whose relative order
//! those cheaper changes don't already produce.
//!
//! Changes use the usual batch-update contract: `old` index paths refer to
//! the previous state, `new` index paths to the next one. Applying them
//! means removing every delete/move source in descending row order, then
//! inserting every insert/move destination in ascending row order.

use std::collections::{HashMap, HashSet};
use tracing::{debug, error};

use super::builder::StateBuilder;
use super::render_state::RenderState;
use crate::error::ChatListError;
use crate::source::ItemSource;
use crate::types::{IndexPath, RowChange, Section, ViewMode};

/// A new render state together with the row changes that lead to it.
#[derive(Debug, Clone)]
pub struct ListDiff {
    pub render_state: RenderState,
    pub row_changes: Vec<RowChange>,
}

impl ListDiff {
    pub fn is_empty(&self) -> bool {
        self.row_changes.is_empty()
    }
}

/// Keep only ids that still resolve to a visible conversation. Anything
/// else was deleted or hidden and shows up as a delete, if at all.
pub fn filter_dirty_ids<S: ItemSource + ?Sized>(
    source: &S,
    updated_ids: &HashSet<String>,
) -> Result<HashSet<String>, ChatListError> {
    let mut visible = HashSet::with_capacity(updated_ids.len());
    for id in updated_ids {
        match source.fetch(id)? {
            Some(conv) if conv.should_be_visible => {
                visible.insert(id.clone());
            }
            Some(_) => debug!("Ignoring update to hidden conversation {}", id),
            None => debug!("Ignoring update to missing conversation {}", id),
        }
    }
    Ok(visible)
}

/// Rebuild the render state and diff it against `old`.
///
/// Every id in `updated_ids` is evicted from the builder's cache first, so
/// changed rows are re-hydrated from `source`.
pub fn update_and_calculate_diff<S: ItemSource + ?Sized>(
    builder: &mut StateBuilder,
    mode: ViewMode,
    old: &RenderState,
    updated_ids: &HashSet<String>,
    source: &S,
) -> Result<ListDiff, ChatListError> {
    let visible_ids = filter_dirty_ids(source, updated_ids)?;
    builder.cache_mut().evict(updated_ids);
    let updated_ids = visible_ids;
    let render_state = builder.build(mode, source)?;
    let row_changes = calculate_diff(old, &render_state, &updated_ids)?;
    Ok(ListDiff {
        render_state,
        row_changes,
    })
}

/// Ids of one render state with O(1) position lookups.
struct Snapshot {
    pinned: Vec<String>,
    unpinned: Vec<String>,
    pinned_index: HashMap<String, usize>,
    unpinned_index: HashMap<String, usize>,
}

impl Snapshot {
    fn of(state: &RenderState) -> Self {
        let pinned = state.pinned_ids();
        let unpinned = state.unpinned_ids();
        let pinned_index = positions(&pinned);
        let unpinned_index = positions(&unpinned);
        Self {
            pinned,
            unpinned,
            pinned_index,
            unpinned_index,
        }
    }

    fn contains(&self, id: &str) -> bool {
        self.pinned_index.contains_key(id) || self.unpinned_index.contains_key(id)
    }

    fn is_pinned(&self, id: &str) -> bool {
        self.pinned_index.contains_key(id)
    }

    fn path_of(&self, id: &str) -> Option<IndexPath> {
        if let Some(row) = self.pinned_index.get(id) {
            return Some(IndexPath::pinned(*row));
        }
        self.unpinned_index.get(id).map(|row| IndexPath::unpinned(*row))
    }

    fn ids(&self, section: Section) -> &[String] {
        match section {
            Section::Pinned => &self.pinned,
            _ => &self.unpinned,
        }
    }

    fn all(&self) -> impl Iterator<Item = &String> {
        self.pinned.iter().chain(self.unpinned.iter())
    }
}

fn positions(ids: &[String]) -> HashMap<String, usize> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| (id.clone(), i))
        .collect()
}

fn path_of(snapshot: &Snapshot, id: &str) -> Result<IndexPath, ChatListError> {
    snapshot
        .path_of(id)
        .ok_or_else(|| ChatListError::DiffInvariant(format!("index path missing for {}", id)))
}

/// Compute the row changes that turn `old` into `new`.
///
/// `updated_ids` are conversations whose content changed. They become
/// updates unless they are already deleted, inserted or moved.
pub fn calculate_diff(
    old: &RenderState,
    new: &RenderState,
    updated_ids: &HashSet<String>,
) -> Result<Vec<RowChange>, ChatListError> {
    let old_ids = Snapshot::of(old);
    let new_ids = Snapshot::of(new);

    let mut naive_pinned = old_ids.pinned.clone();
    let mut naive_unpinned = old_ids.unpinned.clone();

    let mut row_changes = Vec::new();
    let mut structural: HashSet<String> = HashSet::new();

    // 1. Deletes, against pre-update indices, in reverse so that each
    //    deletion leaves the indices of the remaining ones intact.
    let deleted: Vec<&String> = old_ids.all().filter(|id| !new_ids.contains(id)).collect();
    for id in deleted.iter().rev() {
        let old_path = path_of(&old_ids, id)?;
        let naive = if old_path.section == Section::Pinned {
            &mut naive_pinned
        } else {
            &mut naive_unpinned
        };
        if naive.get(old_path.row) != Some(*id) {
            return Err(ChatListError::DiffInvariant(format!(
                "could not delete {} at {}",
                id, old_path
            )));
        }
        naive.remove(old_path.row);

        row_changes.push(RowChange::Delete {
            id: (*id).clone(),
            old: old_path,
        });
        structural.insert((*id).clone());
    }

    // 2. Inserts, against post-update indices, in ascending order.
    let inserted: Vec<&String> = new_ids.all().filter(|id| !old_ids.contains(id)).collect();
    for id in inserted {
        let new_path = path_of(&new_ids, id)?;
        let naive = if new_path.section == Section::Pinned {
            &mut naive_pinned
        } else {
            &mut naive_unpinned
        };
        let at = new_path.row.min(naive.len());
        naive.insert(at, id.clone());

        row_changes.push(RowChange::Insert {
            id: id.clone(),
            new: new_path,
        });
        structural.insert(id.clone());
    }

    // 3a. Conversations that changed section get exactly one move. Their
    //     content is the same on both sides, so no reload is needed.
    let newly_pinned = new_ids
        .pinned
        .iter()
        .filter(|id| old_ids.unpinned_index.contains_key(id.as_str()));
    let newly_unpinned = new_ids
        .unpinned
        .iter()
        .filter(|id| old_ids.pinned_index.contains_key(id.as_str()));
    let changed_section: Vec<&String> = newly_pinned.chain(newly_unpinned).collect();

    for id in changed_section {
        let old_path = path_of(&old_ids, id)?;
        let new_path = path_of(&new_ids, id)?;

        let (from, to) = if old_ids.is_pinned(id) {
            (&mut naive_pinned, &mut naive_unpinned)
        } else {
            (&mut naive_unpinned, &mut naive_pinned)
        };
        let naive_index = from.iter().position(|n| n == id).ok_or_else(|| {
            ChatListError::DiffInvariant(format!("missing naive index for {}", id))
        })?;
        from.remove(naive_index);
        let at = new_path.row.min(to.len());
        to.insert(at, id.clone());

        row_changes.push(RowChange::Move {
            id: id.clone(),
            old: old_path,
            new: new_path,
        });
        structural.insert(id.clone());
    }

    // 3b. Moves within a section. Renderers apply these as remove and
    //     reinsert so the moved row also picks up new content.
    for section in [Section::Pinned, Section::Unpinned] {
        let naive = if section == Section::Pinned {
            &naive_pinned
        } else {
            &naive_unpinned
        };
        for id in moves_within_section(naive, new_ids.ids(section), &structural) {
            let old_path = path_of(&old_ids, &id)?;
            let new_path = path_of(&new_ids, &id)?;
            row_changes.push(RowChange::Move {
                id: id.clone(),
                old: old_path,
                new: new_path,
            });
            structural.insert(id);
        }
    }

    // Once the moves are complete, the predicted ordering must be exact.
    let (final_pinned, final_unpinned) =
        apply_row_changes(&old_ids.pinned, &old_ids.unpinned, &row_changes)?;
    if final_pinned != new_ids.pinned || final_unpinned != new_ids.unpinned {
        log_orderings(&old_ids, &new_ids, &final_pinned, &final_unpinned, &row_changes);
        return Err(ChatListError::DiffInvariant(
            "row changes do not reproduce the new ordering".into(),
        ));
    }

    // 4. Updates, against pre-update indices. Inserted, deleted and moved
    //    rows are never updated; a move already reloads its row.
    let mut updates: Vec<(IndexPath, &String)> = Vec::new();
    for id in updated_ids {
        if structural.contains(id) {
            continue;
        }
        match (old_ids.path_of(id), new_ids.contains(id)) {
            (Some(old_path), true) => updates.push((old_path, id)),
            _ => debug!("Skipping update for conversation {} not on screen", id),
        }
    }
    updates.sort();
    row_changes.extend(updates.into_iter().map(|(old_path, id)| RowChange::Update {
        id: id.clone(),
        old: old_path,
    }));

    Ok(row_changes)
}

/// Pick the rows of one section that need an explicit move.
///
/// `naive` is the section's predicted ordering after deletes, inserts and
/// section changes. Candidates are the rows that stayed in this section.
/// Rows whose naive index already equals their target index never move.
/// Of the rest we keep the longest chain whose relative order is already
/// right and move everything else, in ascending target order.
fn moves_within_section(
    naive: &[String],
    target: &[String],
    structural: &HashSet<String>,
) -> Vec<String> {
    let target_index = positions(target);

    // (naive index, target index) for each candidate, in naive order
    let candidates: Vec<(usize, usize)> = naive
        .iter()
        .enumerate()
        .filter(|(_, id)| !structural.contains(*id))
        .filter_map(|(n, id)| target_index.get(id.as_str()).map(|t| (n, *t)))
        .collect();

    let anchored_naive: Vec<usize> = candidates
        .iter()
        .filter(|(n, t)| n == t)
        .map(|(n, _)| *n)
        .collect();
    let anchored_target = anchored_naive.clone();

    // A candidate can stay only if its order relative to every anchored row
    // is the same on both sides. Anchored rows are sorted on both axes, so
    // comparing how many precede the candidate on each axis suffices.
    let compatible: Vec<(usize, usize)> = candidates
        .iter()
        .copied()
        .filter(|(n, t)| {
            anchored_naive.partition_point(|a| a < n) == anchored_target.partition_point(|a| a < t)
        })
        .collect();

    let kept = longest_increasing_chain(&compatible);

    let mut moved: Vec<usize> = candidates
        .iter()
        .map(|(_, t)| *t)
        .filter(|t| !kept.contains(t))
        .collect();
    moved.sort_unstable();
    moved.into_iter().map(|t| target[t].clone()).collect()
}

/// Target indices of a longest subsequence of `entries` (already sorted by
/// naive index) whose target indices strictly increase.
fn longest_increasing_chain(entries: &[(usize, usize)]) -> HashSet<usize> {
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; entries.len()];

    for (i, (_, t)) in entries.iter().enumerate() {
        let pos = tails.partition_point(|&j| entries[j].1 < *t);
        prev[i] = if pos > 0 { Some(tails[pos - 1]) } else { None };
        if pos == tails.len() {
            tails.push(i);
        } else {
            tails[pos] = i;
        }
    }

    let mut chain = HashSet::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        chain.insert(entries[i].1);
        cursor = prev[i];
    }
    chain
}

/// Apply row changes to the given orderings the way a list renderer does.
///
/// Returns the resulting pinned and unpinned orderings, or an error if a
/// change names a row that doesn't hold the expected id, touches a section
/// this mapping doesn't own, or changes the same row structurally twice.
pub fn apply_row_changes(
    old_pinned: &[String],
    old_unpinned: &[String],
    changes: &[RowChange],
) -> Result<(Vec<String>, Vec<String>), ChatListError> {
    let mut removals: Vec<(IndexPath, &str)> = Vec::new();
    let mut insertions: Vec<(IndexPath, &str)> = Vec::new();
    let mut updates: Vec<(IndexPath, &str)> = Vec::new();
    let mut touched: HashSet<&str> = HashSet::new();

    for change in changes {
        let id = change.id();
        match change {
            RowChange::Update { old, .. } => {
                updates.push((*old, id));
                continue;
            }
            RowChange::Delete { old, .. } => removals.push((*old, id)),
            RowChange::Insert { new, .. } => insertions.push((*new, id)),
            RowChange::Move { old, new, .. } => {
                removals.push((*old, id));
                insertions.push((*new, id));
            }
        }
        if !touched.insert(id) {
            return Err(ChatListError::DiffInvariant(format!(
                "conversation {} changed more than once",
                id
            )));
        }
    }

    for (path, id) in &updates {
        let old = if path.section == Section::Pinned {
            old_pinned
        } else {
            old_unpinned
        };
        if touched.contains(id) || old.get(path.row).map(String::as_str) != Some(*id) {
            return Err(ChatListError::DiffInvariant(format!(
                "invalid update for {} at {}",
                id, path
            )));
        }
    }

    let mut pinned = old_pinned.to_vec();
    let mut unpinned = old_unpinned.to_vec();

    removals.sort_by(|a, b| a.0.section.cmp(&b.0.section).then(b.0.row.cmp(&a.0.row)));
    for (path, id) in removals {
        let list = section_mut(&mut pinned, &mut unpinned, path)?;
        if list.get(path.row).map(String::as_str) != Some(id) {
            return Err(ChatListError::DiffInvariant(format!(
                "could not remove {} at {}",
                id, path
            )));
        }
        list.remove(path.row);
    }

    insertions.sort();
    for (path, id) in insertions {
        let list = section_mut(&mut pinned, &mut unpinned, path)?;
        if path.row > list.len() {
            return Err(ChatListError::DiffInvariant(format!(
                "could not insert {} at {}",
                id, path
            )));
        }
        list.insert(path.row, id.to_string());
    }

    Ok((pinned, unpinned))
}

fn section_mut<'a>(
    pinned: &'a mut Vec<String>,
    unpinned: &'a mut Vec<String>,
    path: IndexPath,
) -> Result<&'a mut Vec<String>, ChatListError> {
    match path.section {
        Section::Pinned => Ok(pinned),
        Section::Unpinned => Ok(unpinned),
        other => Err(ChatListError::DiffInvariant(format!(
            "row change in unmanaged section {:?}",
            other
        ))),
    }
}

fn log_orderings(
    old: &Snapshot,
    new: &Snapshot,
    final_pinned: &[String],
    final_unpinned: &[String],
    row_changes: &[RowChange],
) {
    error!(
        "Could not reorder chat list contents: {} row changes",
        row_changes.len()
    );
    error!("oldPinned[{}]: {}", old.pinned.len(), old.pinned.join(", "));
    error!("newPinned[{}]: {}", new.pinned.len(), new.pinned.join(", "));
    error!("naivePinned[{}]: {}", final_pinned.len(), final_pinned.join(", "));
    error!("oldUnpinned[{}]: {}", old.unpinned.len(), old.unpinned.join(", "));
    error!("newUnpinned[{}]: {}", new.unpinned.len(), new.unpinned.join(", "));
    error!(
        "naiveUnpinned[{}]: {}",
        final_unpinned.len(),
        final_unpinned.join(", ")
    );
}
