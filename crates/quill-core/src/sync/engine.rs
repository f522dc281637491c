//! Sync orchestration: decide the mode, pull, reconcile, push
//!
//! Network reads happen before the local transaction opens, so a transport
//! failure never leaves a half-applied merge behind.

use rusqlite::Connection;

use super::cleanup::{cleanup_local, CleanupStats};
use super::client::{fetch_fragments, SyncClient};
use super::fragment::SyncState;
use super::list::{build_sync_list, SyncList};
use super::merge::{merge_books, merge_notes, MergeStats};
use super::push::send_changes;
use crate::db::{
    Database, SqliteSystemRepository, SystemRepository, LAST_MAX_USN_KEY, LAST_SYNC_TIME_KEY,
};
use crate::error::Result;

/// Options for one sync run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Replay the whole server stream instead of changes since the cursor
    pub full: bool,
    /// Skip uploading local changes
    pub pull_only: bool,
}

/// What a sync run did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub full: bool,
    pub books: MergeStats,
    pub notes: MergeStats,
    pub cleanup: CleanupStats,
    pub pushed_books: usize,
    pub pushed_notes: usize,
    /// A second pull ran because another client wrote during the push
    pub repulled: bool,
    pub last_max_usn: i64,
}

impl SyncSummary {
    /// Number of entities that ended up with a conflict artifact
    pub const fn conflicts(&self) -> usize {
        self.books.conflicted + self.notes.conflicted
    }

    fn absorb_pull(&mut self, other: Self) {
        self.books.absorb(other.books);
        self.notes.absorb(other.notes);
        self.cleanup.absorb(other.cleanup);
        self.last_max_usn = other.last_max_usn;
    }
}

/// Whether this run must replay the whole stream
pub fn needs_full_sync(
    options: SyncOptions,
    state: &SyncState,
    last_max_usn: i64,
    last_sync_time: i64,
) -> bool {
    if options.full {
        return true;
    }
    if last_sync_time == 0 || last_sync_time < state.full_sync_before {
        return true;
    }
    if state.max_usn < last_max_usn {
        tracing::warn!(
            "Server max usn {} is behind local cursor {last_max_usn}; running a full sync",
            state.max_usn
        );
        return true;
    }
    false
}

/// Run one sync against `client`
pub async fn sync(
    db: &mut Database,
    client: &impl SyncClient,
    options: SyncOptions,
) -> Result<SyncSummary> {
    let (last_max_usn, last_sync_time) = {
        let system = SqliteSystemRepository::new(db.connection());
        (
            system.get_i64(LAST_MAX_USN_KEY)?,
            system.get_i64(LAST_SYNC_TIME_KEY)?,
        )
    };

    let state = client.get_sync_state().await?;
    tracing::info!(
        "Server at usn {}, local cursor at usn {last_max_usn}",
        state.max_usn
    );

    let full = needs_full_sync(options, &state, last_max_usn, last_sync_time);
    let mut summary = pull(db, client, full, last_max_usn, &state).await?;
    if options.pull_only {
        return Ok(summary);
    }

    let pushed = send_changes(db.connection(), client, summary.last_max_usn).await?;
    summary.pushed_books = pushed.books;
    summary.pushed_notes = pushed.notes;
    summary.last_max_usn = pushed.last_max_usn;

    if pushed.behind {
        tracing::info!("Server changed during push; pulling again");
        let repull = pull(db, client, false, pushed.last_max_usn, &state).await?;
        summary.absorb_pull(repull);
        summary.repulled = true;
    }

    Ok(summary)
}

async fn pull(
    db: &mut Database,
    client: &impl SyncClient,
    full: bool,
    last_max_usn: i64,
    state: &SyncState,
) -> Result<SyncSummary> {
    let after_usn = if full { 0 } else { last_max_usn };
    tracing::info!(
        "Running {} sync after usn {after_usn}",
        if full { "full" } else { "incremental" }
    );

    let fragments = fetch_fragments(client, after_usn).await?;
    let list = build_sync_list(&fragments);
    tracing::info!(
        "Fetched {} fragments: {} books, {} notes",
        fragments.len(),
        list.books.len(),
        list.notes.len()
    );

    let tx = db.transaction()?;
    let summary = apply_sync_list(&tx, &list, full, last_max_usn, state.current_time)?;
    tx.commit()?;
    Ok(summary)
}

/// Merge, clean up and advance the cursor. Callers run this inside a
/// transaction so any error leaves the store untouched.
pub fn apply_sync_list(
    conn: &Connection,
    list: &SyncList,
    full: bool,
    last_max_usn: i64,
    server_time: i64,
) -> Result<SyncSummary> {
    let books = merge_books(conn, list)?;
    let notes = merge_notes(conn, list)?;
    tracing::info!(
        "Merged {} books and {} notes, {} conflicts",
        books.changed(),
        notes.changed(),
        books.conflicted + notes.conflicted
    );

    let cleanup = cleanup_local(conn, list, full)?;
    tracing::info!(
        "Cleanup removed {} expunged and {} forgotten rows",
        cleanup.expunged,
        cleanup.purged
    );

    let next_max_usn = if full {
        list.max_usn
    } else {
        last_max_usn.max(list.max_usn)
    };
    let sync_time = if list.max_current_time > 0 {
        list.max_current_time
    } else {
        server_time
    };
    let system = SqliteSystemRepository::new(conn);
    system.set_i64(LAST_MAX_USN_KEY, next_max_usn)?;
    system.set_i64(LAST_SYNC_TIME_KEY, sync_time)?;

    Ok(SyncSummary {
        full,
        books,
        notes,
        cleanup,
        last_max_usn: next_max_usn,
        ..SyncSummary::default()
    })
}
