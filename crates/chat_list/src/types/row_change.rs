use serde::{Deserialize, Serialize};

use super::section::IndexPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowChangeKind {
    Delete,
    Insert,
    Move,
    Update,
}

/// One structural change between two render states.
///
/// `old` paths index the previous state, `new` paths the next one. Each
/// variant carries exactly the paths that are meaningful for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RowChange {
    Delete { id: String, old: IndexPath },
    Insert { id: String, new: IndexPath },
    Move { id: String, old: IndexPath, new: IndexPath },
    Update { id: String, old: IndexPath },
}

impl RowChange {
    pub fn id(&self) -> &str {
        match self {
            Self::Delete { id, .. }
            | Self::Insert { id, .. }
            | Self::Move { id, .. }
            | Self::Update { id, .. } => id,
        }
    }

    pub fn kind(&self) -> RowChangeKind {
        match self {
            Self::Delete { .. } => RowChangeKind::Delete,
            Self::Insert { .. } => RowChangeKind::Insert,
            Self::Move { .. } => RowChangeKind::Move,
            Self::Update { .. } => RowChangeKind::Update,
        }
    }

    pub fn old_index_path(&self) -> Option<IndexPath> {
        match self {
            Self::Delete { old, .. } | Self::Move { old, .. } | Self::Update { old, .. } => {
                Some(*old)
            }
            Self::Insert { .. } => None,
        }
    }

    pub fn new_index_path(&self) -> Option<IndexPath> {
        match self {
            Self::Insert { new, .. } | Self::Move { new, .. } => Some(*new),
            Self::Delete { .. } | Self::Update { .. } => None,
        }
    }

    /// A move within one section may also carry new content, so renderers
    /// should apply it as remove + reinsert to force the cell to reload.
    /// Moves across sections keep the cell as is.
    pub fn reloads_content(&self) -> bool {
        match self {
            Self::Move { old, new, .. } => old.section == new.section,
            _ => false,
        }
    }
}
