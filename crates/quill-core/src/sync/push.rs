//! Upload of locally dirty books and notes
//!
//! Books go first so that notes created in a new book can reference the UUID
//! the server assigned to it. Each acknowledgement is written as soon as it
//! arrives; a failure midway leaves the remaining rows dirty for next time.

use rusqlite::Connection;

use super::client::SyncClient;
use crate::db::{
    BookRepository, NoteRepository, SqliteBookRepository, SqliteNoteRepository,
    SqliteSystemRepository, SystemRepository, LAST_MAX_USN_KEY,
};
use crate::error::Result;
use crate::models::{Book, Note};

/// Result of a push pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushOutcome {
    pub books: usize,
    pub notes: usize,
    /// Never-synced rows deleted before they reached the server
    pub discarded: usize,
    /// Cursor after the push
    pub last_max_usn: i64,
    /// Another client wrote between our acknowledgements
    pub behind: bool,
}

/// Follows acknowledged USNs while they stay contiguous with the cursor
#[derive(Debug, Clone, Copy)]
struct UsnTracker {
    max_usn: i64,
    behind: bool,
}

impl UsnTracker {
    const fn new(last_max_usn: i64) -> Self {
        Self {
            max_usn: last_max_usn,
            behind: false,
        }
    }

    /// Returns true when the cursor advanced
    fn observe(&mut self, usn: i64) -> bool {
        if !self.behind && usn == self.max_usn + 1 {
            self.max_usn = usn;
            return true;
        }
        if !self.behind {
            tracing::debug!("Expected usn {} but got {usn}", self.max_usn + 1);
        }
        self.behind = true;
        false
    }
}

/// Push every dirty book, then every dirty note
pub async fn send_changes(
    conn: &Connection,
    client: &impl SyncClient,
    last_max_usn: i64,
) -> Result<PushOutcome> {
    let system = SqliteSystemRepository::new(conn);
    let mut tracker = UsnTracker::new(last_max_usn);
    let mut outcome = PushOutcome::default();

    for book in SqliteBookRepository::new(conn).list_dirty()? {
        match send_book(conn, client, book).await? {
            Some(usn) => {
                outcome.books += 1;
                if tracker.observe(usn) {
                    system.set_i64(LAST_MAX_USN_KEY, usn)?;
                }
            }
            None => outcome.discarded += 1,
        }
    }

    for note in SqliteNoteRepository::new(conn).list_dirty()? {
        match send_note(conn, client, note).await? {
            Some(usn) => {
                outcome.notes += 1;
                if tracker.observe(usn) {
                    system.set_i64(LAST_MAX_USN_KEY, usn)?;
                }
            }
            None => outcome.discarded += 1,
        }
    }

    outcome.last_max_usn = tracker.max_usn;
    outcome.behind = tracker.behind;
    tracing::info!(
        "Pushed {} books and {} notes",
        outcome.books,
        outcome.notes
    );
    Ok(outcome)
}

async fn send_book(conn: &Connection, client: &impl SyncClient, book: Book) -> Result<Option<i64>> {
    let books = SqliteBookRepository::new(conn);

    if book.usn == 0 && book.deleted {
        books.hard_delete(&book.uuid)?;
        tracing::debug!("Discarded unsynced book '{}'", book.label);
        return Ok(None);
    }

    let ack = if book.usn == 0 {
        client.create_book(&book.label).await?
    } else if book.deleted {
        client.delete_book(&book.uuid).await?
    } else {
        client.update_book(&book.uuid, &book.label).await?
    };

    if ack.uuid != book.uuid {
        tracing::debug!("Server assigned book '{}' uuid {}", book.label, ack.uuid);
        books.change_uuid(&book.uuid, &ack.uuid)?;
    }
    books.update(&Book {
        uuid: ack.uuid,
        usn: ack.usn,
        dirty: false,
        ..book
    })?;
    Ok(Some(ack.usn))
}

async fn send_note(conn: &Connection, client: &impl SyncClient, note: Note) -> Result<Option<i64>> {
    let notes = SqliteNoteRepository::new(conn);

    if note.usn == 0 && note.deleted {
        notes.hard_delete(&note.uuid)?;
        tracing::debug!("Discarded unsynced note {}", note.uuid);
        return Ok(None);
    }

    let ack = if note.usn == 0 {
        client.create_note(&note.book_uuid, &note.body).await?
    } else if note.deleted {
        client.delete_note(&note.uuid).await?
    } else {
        client
            .update_note(&note.uuid, &note.book_uuid, &note.body)
            .await?
    };

    if ack.uuid != note.uuid {
        tracing::debug!("Server assigned note {} uuid {}", note.uuid, ack.uuid);
        notes.change_uuid(&note.uuid, &ack.uuid)?;
    }
    notes.update(&Note {
        uuid: ack.uuid,
        usn: ack.usn,
        dirty: false,
        ..note
    })?;
    Ok(Some(ack.usn))
}
