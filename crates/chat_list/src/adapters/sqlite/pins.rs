use rusqlite::{params, Connection};

use super::DbPool;
use crate::error::ChatListError;

pub fn pinned_ordering(conn: &Connection) -> Result<Vec<String>, ChatListError> {
    let mut stmt = conn.prepare_cached(
        "SELECT conversation_id FROM pinned_conversations ORDER BY position ASC",
    )?;
    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

/// Replace the whole pin ordering. Duplicate ids keep their first position.
pub fn set_pinned_ordering(pool: &DbPool, ids: &[String]) -> Result<(), ChatListError> {
    let mut conn = pool.get()?;
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM pinned_conversations", [])?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO pinned_conversations (conversation_id, position)
             VALUES (?1, ?2)",
        )?;
        for (position, id) in ids.iter().enumerate() {
            stmt.execute(params![id, position as i64])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Append to the end of the pin ordering. No-op if already pinned.
pub fn pin(pool: &DbPool, id: &str) -> Result<(), ChatListError> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT OR IGNORE INTO pinned_conversations (conversation_id, position)
         VALUES (?1, (SELECT COALESCE(MAX(position), -1) + 1 FROM pinned_conversations))",
        params![id],
    )?;
    Ok(())
}

pub fn unpin(pool: &DbPool, id: &str) -> Result<bool, ChatListError> {
    let conn = pool.get()?;
    let removed = conn.execute(
        "DELETE FROM pinned_conversations WHERE conversation_id = ?1",
        params![id],
    )?;
    Ok(removed > 0)
}
