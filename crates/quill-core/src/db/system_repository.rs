//! System key-value repository implementation

use crate::error::{Error, Result};
use rusqlite::{params, Connection, OptionalExtension};

/// Highest USN this client has fully merged
pub const LAST_MAX_USN_KEY: &str = "last_max_usn";

/// Server clock (Unix seconds) at the end of the last successful sync
pub const LAST_SYNC_TIME_KEY: &str = "last_sync_time";

/// Trait for system bookkeeping storage operations
pub trait SystemRepository {
    /// Read a raw value
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a raw value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Read an integer value, defaulting to 0 when absent
    fn get_i64(&self, key: &str) -> Result<i64> {
        match self.get(key)? {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| Error::Database(format!("system key '{key}' is not an integer: {raw}"))),
            None => Ok(0),
        }
    }

    /// Write an integer value
    fn set_i64(&self, key: &str, value: i64) -> Result<()> {
        self.set(key, &value.to_string())
    }
}

/// `SQLite` implementation of `SystemRepository`
pub struct SqliteSystemRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteSystemRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl SystemRepository for SqliteSystemRepository<'_> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM system WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO system (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}
