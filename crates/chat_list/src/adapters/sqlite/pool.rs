use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

use crate::error::ChatListError;

pub type DbPool = Pool<SqliteConnectionManager>;

pub fn create_pool(db_path: &Path) -> Result<DbPool, ChatListError> {
    let manager = SqliteConnectionManager::file(db_path);

    let pool = Pool::builder().max_size(4).build(manager)?;

    // Readers keep a transaction open for a whole flush; WAL lets writers
    // proceed meanwhile.
    let conn = pool.get()?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA temp_store = MEMORY;
         PRAGMA foreign_keys = ON;",
    )?;

    Ok(pool)
}

/// Every in-memory connection is its own database, so the pool must hold
/// exactly one.
pub fn create_memory_pool() -> Result<DbPool, ChatListError> {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager)?;

    let conn = pool.get()?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    Ok(pool)
}
