use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::HashSet;

use super::DbPool;
use crate::error::ChatListError;
use crate::types::Conversation;

const CONVERSATION_COLUMNS: &str = "id, title, participants, last_message_date,
    last_message_preview, unread_count, is_archived, is_muted, is_visible";

// Well under SQLite's bound-parameter limit
const FETCH_CHUNK_SIZE: usize = 500;

fn row_to_conversation(row: &Row<'_>) -> rusqlite::Result<Conversation> {
    let participants_json: String = row.get(2)?;
    Ok(Conversation {
        id: row.get(0)?,
        title: row.get(1)?,
        participants: serde_json::from_str(&participants_json).unwrap_or_default(),
        last_message_date: row.get(3)?,
        last_message_preview: row.get(4)?,
        unread_count: row.get(5)?,
        is_archived: row.get::<_, i32>(6)? != 0,
        is_muted: row.get::<_, i32>(7)? != 0,
        should_be_visible: row.get::<_, i32>(8)? != 0,
    })
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

// ----- Reads -----

pub fn count_visible(conn: &Connection, archived: bool) -> Result<usize, ChatListError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM conversations WHERE is_visible = 1 AND is_archived = ?1",
        params![archived as i32],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

/// Visible conversation ids, most recent first.
pub fn visible_ids(conn: &Connection, archived: bool) -> Result<Vec<String>, ChatListError> {
    let mut stmt = conn.prepare_cached(
        "SELECT id FROM conversations
         WHERE is_visible = 1 AND is_archived = ?1
         ORDER BY last_message_date DESC, id ASC",
    )?;

    let rows = stmt.query_map(params![archived as i32], |row| row.get(0))?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

/// Load the given conversations. Unknown ids are skipped; order is
/// unspecified.
pub fn fetch_by_ids(
    conn: &Connection,
    ids: &HashSet<String>,
) -> Result<Vec<Conversation>, ChatListError> {
    let ids: Vec<&String> = ids.iter().collect();
    let mut conversations = Vec::with_capacity(ids.len());

    for chunk in ids.chunks(FETCH_CHUNK_SIZE) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM conversations WHERE id IN ({})",
            CONVERSATION_COLUMNS, placeholders
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(chunk.iter()), row_to_conversation)?;
        for row in rows {
            conversations.push(row?);
        }
    }
    Ok(conversations)
}

/// Visit visible conversations in display order, one row at a time.
pub fn for_each_visible(
    conn: &Connection,
    archived: bool,
    visit: &mut dyn FnMut(Conversation),
) -> Result<(), ChatListError> {
    let sql = format!(
        "SELECT {} FROM conversations
         WHERE is_visible = 1 AND is_archived = ?1
         ORDER BY last_message_date DESC, id ASC",
        CONVERSATION_COLUMNS
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map(params![archived as i32], row_to_conversation)?;
    for row in rows {
        visit(row?);
    }
    Ok(())
}

pub fn fetch_conversation(
    conn: &Connection,
    id: &str,
) -> Result<Option<Conversation>, ChatListError> {
    let sql = format!("SELECT {} FROM conversations WHERE id = ?1", CONVERSATION_COLUMNS);
    let conv = conn
        .query_row(&sql, params![id], row_to_conversation)
        .optional()?;
    Ok(conv)
}

// ----- Writes -----

/// Create a conversation with a fresh id and the current time as its
/// recency.
pub fn create_conversation(
    pool: &DbPool,
    title: &str,
    participants: &[String],
) -> Result<Conversation, ChatListError> {
    let mut conv = Conversation::new(uuid::Uuid::new_v4().to_string(), now_ms());
    conv.title = title.to_string();
    conv.participants = participants.to_vec();
    upsert_conversation(pool, &conv)?;
    Ok(conv)
}

pub fn upsert_conversation(pool: &DbPool, conv: &Conversation) -> Result<(), ChatListError> {
    let conn = pool.get()?;
    let participants = serde_json::to_string(&conv.participants)
        .map_err(|e| ChatListError::Database(e.to_string()))?;

    conn.execute(
        "INSERT INTO conversations (id, title, participants, last_message_date,
            last_message_preview, unread_count, is_archived, is_muted, is_visible, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            participants = excluded.participants,
            last_message_date = excluded.last_message_date,
            last_message_preview = excluded.last_message_preview,
            unread_count = excluded.unread_count,
            is_archived = excluded.is_archived,
            is_muted = excluded.is_muted,
            is_visible = excluded.is_visible,
            updated_at = excluded.updated_at",
        params![
            conv.id,
            conv.title,
            participants,
            conv.last_message_date,
            conv.last_message_preview,
            conv.unread_count,
            conv.is_archived as i32,
            conv.is_muted as i32,
            conv.should_be_visible as i32,
            now_ms(),
        ],
    )?;
    Ok(())
}

/// Returns whether a row was deleted. The conversation also loses its pin.
pub fn delete_conversation(pool: &DbPool, id: &str) -> Result<bool, ChatListError> {
    let mut conn = pool.get()?;
    let tx = conn.transaction()?;
    tx.execute(
        "DELETE FROM pinned_conversations WHERE conversation_id = ?1",
        params![id],
    )?;
    let deleted = tx.execute("DELETE FROM conversations WHERE id = ?1", params![id])?;
    tx.commit()?;
    Ok(deleted > 0)
}

pub fn set_archived(pool: &DbPool, id: &str, archived: bool) -> Result<bool, ChatListError> {
    let conn = pool.get()?;
    let updated = conn.execute(
        "UPDATE conversations SET is_archived = ?1, updated_at = ?2 WHERE id = ?3",
        params![archived as i32, now_ms(), id],
    )?;
    Ok(updated > 0)
}

pub fn set_visible(pool: &DbPool, id: &str, visible: bool) -> Result<bool, ChatListError> {
    let conn = pool.get()?;
    let updated = conn.execute(
        "UPDATE conversations SET is_visible = ?1, updated_at = ?2 WHERE id = ?3",
        params![visible as i32, now_ms(), id],
    )?;
    Ok(updated > 0)
}
