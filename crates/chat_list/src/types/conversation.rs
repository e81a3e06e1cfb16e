use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A conversation row as hydrated from the store.
///
/// Pin membership comes from the global pin ordering, not from the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub participants: Vec<String>,
    /// Unix epoch ms of the newest message
    pub last_message_date: i64,
    pub last_message_preview: Option<String>,
    pub unread_count: u32,
    pub is_archived: bool,
    pub is_muted: bool,
    /// Whether the conversation qualifies for display at all
    pub should_be_visible: bool,
}

impl Conversation {
    pub fn new(id: impl Into<String>, last_message_date: i64) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            participants: Vec::new(),
            last_message_date,
            last_message_preview: None,
            unread_count: 0,
            is_archived: false,
            is_muted: false,
            should_be_visible: true,
        }
    }

    pub fn last_message_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.last_message_date)
    }

    pub fn has_unread(&self) -> bool {
        self.unread_count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_message_at() {
        let conv = Conversation::new("c1", 1_700_000_000_000);
        let at = conv.last_message_at().unwrap();
        assert_eq!(at.timestamp(), 1_700_000_000);
        assert!(!conv.has_unread());
        assert!(conv.should_be_visible);
    }
}
