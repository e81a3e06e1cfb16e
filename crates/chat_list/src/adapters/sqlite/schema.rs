use rusqlite::Connection;

use crate::error::ChatListError;

pub fn initialize_schema(conn: &Connection) -> Result<(), ChatListError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS conversations (
            id                   TEXT PRIMARY KEY,   -- UUID
            title                TEXT NOT NULL DEFAULT '',
            participants         TEXT NOT NULL DEFAULT '[]',  -- JSON array
            last_message_date    INTEGER NOT NULL,   -- unix epoch ms
            last_message_preview TEXT,
            unread_count         INTEGER DEFAULT 0,
            is_archived          INTEGER DEFAULT 0,
            is_muted             INTEGER DEFAULT 0,
            is_visible           INTEGER DEFAULT 1,  -- 0 for empty or blocked
            updated_at           INTEGER NOT NULL    -- unix epoch ms
        );

        CREATE INDEX IF NOT EXISTS idx_conversations_visible
            ON conversations(is_visible, is_archived, last_message_date DESC);

        -- Global pin ordering. May name conversations that are hidden or
        -- no longer exist; readers filter against the visible set.
        CREATE TABLE IF NOT EXISTS pinned_conversations (
            conversation_id TEXT PRIMARY KEY,
            position        INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_pinned_position ON pinned_conversations(position);
        ",
    )?;

    Ok(())
}
