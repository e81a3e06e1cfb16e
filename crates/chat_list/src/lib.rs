//! Chat list - incremental conversation list mapping
//!
//! Maintains a two-section (pinned / unpinned) snapshot of the visible
//! conversations and computes minimal row changes between snapshots, so a
//! list renderer can animate updates instead of reloading.
//!
//! ## Module Organization
//!
//! - `types/`: Conversations, sections, index paths and row changes
//! - `source/`: The read-only store boundary (`ItemSource`)
//! - `mapping/`: Render state, state builder, hydration cache and diffing
//! - `coordinator/`: Pending-change tracking and flush decisions
//! - `adapters/`: SQLite-backed store
//! - `config/`: Configuration management
//! - `services/`: Logging setup

pub mod adapters;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod mapping;
pub mod services;
pub mod source;
pub mod types;

pub use config::ListConfig;
pub use coordinator::{ChangeNotification, FlushOutcome, ListRenderer, LoadCoordinator};
pub use error::ChatListError;
pub use mapping::{calculate_diff, ListDiff, RenderState, StateBuilder};
pub use source::ItemSource;
pub use types::{Conversation, IndexPath, RowChange, RowChangeKind, Section, ViewMode};
