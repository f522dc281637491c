//! Database migrations

use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension};

use super::actions;

/// Current schema version
const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
pub fn run(conn: &mut Connection) -> Result<()> {
    let version = get_version(conn)?;

    if version < 1 {
        migrate_v1(conn)?;
    }
    if version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Get the current schema version
fn get_version(conn: &Connection) -> Result<i32> {
    if !table_exists(conn, "schema_version")? {
        return Ok(0);
    }

    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?",
            params![name],
            |row| row.get::<_, i32>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Migration to version 1: books, notes and system bookkeeping
fn migrate_v1(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );
        CREATE TABLE IF NOT EXISTS books (
            uuid TEXT PRIMARY KEY,
            label TEXT NOT NULL,
            usn INTEGER NOT NULL DEFAULT 0,
            deleted INTEGER NOT NULL DEFAULT 0,
            dirty INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_books_label ON books(label);
        CREATE TABLE IF NOT EXISTS notes (
            uuid TEXT PRIMARY KEY,
            book_uuid TEXT NOT NULL,
            body TEXT NOT NULL,
            added_on INTEGER NOT NULL,
            edited_on INTEGER NOT NULL DEFAULT 0,
            usn INTEGER NOT NULL DEFAULT 0,
            deleted INTEGER NOT NULL DEFAULT 0,
            dirty INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_notes_book_uuid ON notes(book_uuid);
        CREATE INDEX IF NOT EXISTS idx_notes_dirty ON notes(dirty);
        CREATE TABLE IF NOT EXISTS system (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        INSERT INTO schema_version (version) VALUES (1);",
    )?;

    tx.commit()?;
    tracing::info!("Migrated database to version 1");
    Ok(())
}

/// Migration to version 2: fold a pre-sync action log into books and notes
fn migrate_v2(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;

    if table_exists(&tx, "actions")? {
        let log = actions::load_legacy_log(&tx)?;
        tracing::info!("Replaying {} legacy actions", log.len());
        actions::replay_actions(&tx, &log)?;
        tx.execute("DROP TABLE actions", [])?;
    }
    tx.execute("INSERT INTO schema_version (version) VALUES (2)", [])?;

    tx.commit()?;
    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}
