//! Error types for the chat list
//!
//! Errors are serializable so hosts can hand them to a renderer or
//! front-end as data.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ChatListError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Store query failed: {0}")]
    StoreQuery(String),

    #[error("Hydration mismatch: requested {requested} items, loaded {loaded}")]
    HydrationMismatch { requested: usize, loaded: usize },

    #[error("Diff invariant violated: {0}")]
    DiffInvariant(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl ChatListError {
    /// Whether this failure points at a logic bug rather than the store.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, ChatListError::DiffInvariant(_))
    }
}

impl From<r2d2::Error> for ChatListError {
    fn from(e: r2d2::Error) -> Self {
        ChatListError::Database(e.to_string())
    }
}

impl From<rusqlite::Error> for ChatListError {
    fn from(e: rusqlite::Error) -> Self {
        ChatListError::Database(e.to_string())
    }
}
