//! Local garbage collection after a merge
//!
//! Reconciles every locally known UUID with the server's view carried by the
//! sync list. Only a full sync lists every live resource, so the rule for
//! rows absent from the list is applied to full syncs alone.

use rusqlite::Connection;

use super::list::{check_book_in_list, check_note_in_list, SyncList};
use super::report::get_or_create_conflicts_book;
use crate::db::{BookRepository, NoteRepository, SqliteBookRepository, SqliteNoteRepository};
use crate::error::Result;
use crate::models::BookId;

/// What the cleanup pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupStats {
    /// Rows removed because the server expunged them
    pub expunged: usize,
    /// Local tombstones the server has already forgotten
    pub purged: usize,
    /// Never-synced rows left for the next push
    pub unsynced: usize,
    /// Synced live rows the server no longer lists, left untouched
    pub stale: usize,
}

impl CleanupStats {
    /// Fold another pass into this one
    pub fn absorb(&mut self, other: Self) {
        self.expunged += other.expunged;
        self.purged += other.purged;
        self.unsynced += other.unsynced;
        self.stale += other.stale;
    }
}

/// What to do with a row the server has no opinion about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Absent {
    Keep,
    Purge,
    Stale,
}

fn classify(usn: i64, deleted: bool) -> Absent {
    if usn == 0 {
        Absent::Keep
    } else if deleted {
        Absent::Purge
    } else {
        Absent::Stale
    }
}

/// Hard-delete a book without leaving notes behind it
///
/// Tombstones of the book's notes go with it. Live notes move to the
/// conflicts book and become dirty so they are pushed there.
fn drop_book(conn: &Connection, uuid: &BookId) -> Result<bool> {
    let notes = SqliteNoteRepository::new(conn);
    if !SqliteBookRepository::new(conn).hard_delete(uuid)? {
        return Ok(false);
    }

    let mut conflicts = None;
    for mut note in notes.list_all()? {
        if note.book_uuid != *uuid {
            continue;
        }
        if note.deleted {
            notes.hard_delete(&note.uuid)?;
            continue;
        }
        let target = match conflicts {
            Some(target) => target,
            None => *conflicts.insert(get_or_create_conflicts_book(conn)?),
        };
        tracing::warn!("Note {} lost its book {uuid}; moving it to conflicts", note.uuid);
        note.book_uuid = target;
        note.dirty = true;
        notes.update(&note)?;
    }
    Ok(true)
}

/// Run the cleanup pass over notes, then books
pub fn cleanup_local(conn: &Connection, list: &SyncList, full: bool) -> Result<CleanupStats> {
    let notes = SqliteNoteRepository::new(conn);
    let books = SqliteBookRepository::new(conn);
    let mut stats = CleanupStats::default();

    for uuid in &list.expunged_notes {
        if notes.hard_delete(uuid)? {
            tracing::debug!("Expunged note {uuid}");
            stats.expunged += 1;
        }
    }
    for uuid in &list.expunged_books {
        if drop_book(conn, uuid)? {
            tracing::debug!("Expunged book {uuid}");
            stats.expunged += 1;
        }
    }

    if !full {
        return Ok(stats);
    }

    for note in notes.list_all()? {
        if check_note_in_list(&note.uuid, list) {
            continue;
        }
        match classify(note.usn, note.deleted) {
            Absent::Keep => stats.unsynced += 1,
            Absent::Purge => {
                notes.hard_delete(&note.uuid)?;
                tracing::debug!("Purged forgotten note tombstone {}", note.uuid);
                stats.purged += 1;
            }
            Absent::Stale => {
                tracing::debug!("Note {} at usn {} is unknown to the server", note.uuid, note.usn);
                stats.stale += 1;
            }
        }
    }

    for book in books.list_all()? {
        if check_book_in_list(&book.uuid, list) {
            continue;
        }
        match classify(book.usn, book.deleted) {
            Absent::Keep => stats.unsynced += 1,
            Absent::Purge => {
                drop_book(conn, &book.uuid)?;
                tracing::debug!("Purged forgotten book tombstone {}", book.uuid);
                stats.purged += 1;
            }
            Absent::Stale => {
                tracing::debug!("Book '{}' at usn {} is unknown to the server", book.label, book.usn);
                stats.stale += 1;
            }
        }
    }

    if stats.stale > 0 {
        tracing::warn!("{} synced rows are missing from the server stream", stats.stale);
    }
    Ok(stats)
}
