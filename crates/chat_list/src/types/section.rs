use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed sections of the chat list, in display order.
///
/// Only `Pinned` and `Unpinned` are produced by the mapping; the others
/// belong to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Reminders = 0,
    Pinned = 1,
    Unpinned = 2,
    ArchiveButton = 3,
}

impl Section {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Section::Reminders),
            1 => Some(Section::Pinned),
            2 => Some(Section::Unpinned),
            3 => Some(Section::ArchiveButton),
            _ => None,
        }
    }

    pub fn for_pinned(is_pinned: bool) -> Self {
        if is_pinned {
            Section::Pinned
        } else {
            Section::Unpinned
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexPath {
    pub section: Section,
    pub row: usize,
}

impl IndexPath {
    pub fn new(section: Section, row: usize) -> Self {
        Self { section, row }
    }

    pub fn pinned(row: usize) -> Self {
        Self::new(Section::Pinned, row)
    }

    pub fn unpinned(row: usize) -> Self {
        Self::new(Section::Unpinned, row)
    }
}

impl fmt::Display for IndexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.section.index(), self.row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_ordinals() {
        assert_eq!(Section::Pinned.index(), 1);
        assert_eq!(Section::Unpinned.index(), 2);
        assert_eq!(Section::from_index(3), Some(Section::ArchiveButton));
        assert_eq!(Section::from_index(4), None);
        assert_eq!(Section::for_pinned(true), Section::Pinned);
    }

    #[test]
    fn test_index_path_display() {
        assert_eq!(IndexPath::unpinned(4).to_string(), "[2, 4]");
    }
}
