//! SQLite-backed conversation store
//!
//! Hosts write through the helpers in [`conversations`] and [`pins`]; the
//! chat list reads through a [`SqliteSnapshot`], one per flush.

pub mod conversations;
pub mod pins;
pub mod pool;
pub mod schema;
pub mod snapshot;

pub use pool::DbPool;
pub use snapshot::SqliteSnapshot;

use std::path::Path;
use tracing::info;

use crate::config::ListConfig;
use crate::error::ChatListError;

pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, ChatListError> {
        info!("Opening conversation store at {:?}", path);
        let pool = pool::create_pool(path)?;
        Self::with_pool(pool)
    }

    pub fn from_config(config: &ListConfig) -> Result<Self, ChatListError> {
        let path = config
            .database_path
            .as_deref()
            .ok_or_else(|| ChatListError::Config("database_path is not set".into()))?;
        Self::open(path)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self, ChatListError> {
        Self::with_pool(pool::create_memory_pool()?)
    }

    fn with_pool(pool: DbPool) -> Result<Self, ChatListError> {
        let conn = pool.get()?;
        schema::initialize_schema(&conn)?;
        drop(conn);
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Start a consistent read of the store. Drop the snapshot as soon as
    /// the flush is done; it pins a pool connection.
    pub fn snapshot(&self) -> Result<SqliteSnapshot, ChatListError> {
        SqliteSnapshot::begin(self.pool.get()?)
    }
}
