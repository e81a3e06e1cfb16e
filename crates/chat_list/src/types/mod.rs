pub mod conversation;
pub mod row_change;
pub mod section;

pub use conversation::Conversation;
pub use row_change::{RowChange, RowChangeKind};
pub use section::{IndexPath, Section};

use serde::{Deserialize, Serialize};

/// Which list the user is looking at. Inbox and archive are mutually
/// exclusive; each selects its own visibility predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Inbox,
    Archive,
}

impl ViewMode {
    pub fn is_archive(self) -> bool {
        matches!(self, ViewMode::Archive)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Inbox => "inbox",
            ViewMode::Archive => "archive",
        }
    }
}
