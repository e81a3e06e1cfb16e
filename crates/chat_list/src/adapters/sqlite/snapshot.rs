use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use std::collections::HashSet;
use tracing::warn;

use super::{conversations, pins};
use crate::error::ChatListError;
use crate::source::ItemSource;
use crate::types::Conversation;

/// A read transaction over the conversation store.
///
/// The transaction is deferred, so the point-in-time view is fixed by the
/// first read. It is rolled back when the snapshot is dropped. Holds a pool
/// connection for its whole lifetime.
pub struct SqliteSnapshot {
    conn: PooledConnection<SqliteConnectionManager>,
}

impl SqliteSnapshot {
    pub(crate) fn begin(
        conn: PooledConnection<SqliteConnectionManager>,
    ) -> Result<Self, ChatListError> {
        conn.execute_batch("BEGIN DEFERRED")?;
        Ok(Self { conn })
    }
}

impl Drop for SqliteSnapshot {
    fn drop(&mut self) {
        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            warn!("Failed to end chat list read transaction: {}", e);
        }
    }
}

impl ItemSource for SqliteSnapshot {
    fn visible_count(&self, archived: bool) -> Result<usize, ChatListError> {
        conversations::count_visible(&self.conn, archived)
    }

    fn visible_ids(&self, archived: bool) -> Result<Vec<String>, ChatListError> {
        conversations::visible_ids(&self.conn, archived)
    }

    fn pinned_id_ordering(&self) -> Result<Vec<String>, ChatListError> {
        pins::pinned_ordering(&self.conn)
    }

    fn bulk_fetch(&self, ids: &HashSet<String>) -> Result<Vec<Conversation>, ChatListError> {
        conversations::fetch_by_ids(&self.conn, ids)
    }

    fn enumerate_visible(
        &self,
        archived: bool,
        visit: &mut dyn FnMut(Conversation),
    ) -> Result<(), ChatListError> {
        conversations::for_each_visible(&self.conn, archived, visit)
    }

    fn fetch(&self, id: &str) -> Result<Option<Conversation>, ChatListError> {
        conversations::fetch_conversation(&self.conn, id)
    }
}
