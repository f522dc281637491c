//! Legacy action log replay
//!
//! Clients that predate sync recorded every mutation as a row in an `actions`
//! table. Each row carries a `type` discriminator and a JSON `data` payload;
//! replaying them in order rebuilds the books and notes they describe.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::{BookRepository, NoteRepository, SqliteBookRepository, SqliteNoteRepository};
use crate::error::{Error, Result};
use crate::models::{Book, BookId, Note, NoteId};

/// One mutation recorded in the legacy log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Action {
    AddBook {
        book_name: String,
    },
    RemoveBook {
        book_name: String,
    },
    AddNote {
        note_uuid: String,
        book_name: String,
        content: String,
    },
    EditNote {
        note_uuid: String,
        #[serde(default)]
        to_book: Option<String>,
        #[serde(default)]
        content: Option<String>,
    },
    RemoveNote {
        note_uuid: String,
    },
}

/// A decoded log row with its timestamp (Unix seconds)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedAction {
    pub action: Action,
    pub timestamp: i64,
}

/// Read and decode the whole `actions` table in insertion order
pub(crate) fn load_legacy_log(conn: &Connection) -> Result<Vec<LoggedAction>> {
    let mut stmt = conn.prepare("SELECT type, data, timestamp FROM actions ORDER BY rowid")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(kind, data, timestamp)| {
            let payload: serde_json::Value = serde_json::from_str(&data)?;
            let action = serde_json::from_value(serde_json::json!({
                "type": kind,
                "data": payload,
            }))?;
            Ok(LoggedAction { action, timestamp })
        })
        .collect()
}

/// Apply logged actions to the store as dirty, never-synced rows
pub fn replay_actions(conn: &Connection, log: &[LoggedAction]) -> Result<()> {
    let books = SqliteBookRepository::new(conn);
    let notes = SqliteNoteRepository::new(conn);

    for entry in log {
        let at = entry.timestamp.saturating_mul(1_000_000_000);
        match &entry.action {
            Action::AddBook { book_name } => {
                ensure_book(&books, book_name)?;
            }
            Action::RemoveBook { book_name } => {
                let Some(mut book) = books.find_live_by_label(book_name)? else {
                    tracing::warn!("Legacy log removes unknown book '{book_name}'");
                    continue;
                };
                for mut note in notes.list_by_book(&book.uuid)? {
                    note.deleted = true;
                    note.body.clear();
                    note.dirty = true;
                    notes.update(&note)?;
                }
                book.deleted = true;
                book.dirty = true;
                books.update(&book)?;
            }
            Action::AddNote {
                note_uuid,
                book_name,
                content,
            } => {
                let book_uuid = ensure_book(&books, book_name)?;
                let mut note = Note::new(book_uuid, content.clone());
                note.uuid = parse_note_uuid(note_uuid)?;
                note.added_on = at;
                notes.insert(&note)?;
            }
            Action::EditNote {
                note_uuid,
                to_book,
                content,
            } => {
                let Some(mut note) = notes.get(&parse_note_uuid(note_uuid)?)? else {
                    tracing::warn!("Legacy log edits unknown note {note_uuid}");
                    continue;
                };
                if let Some(label) = to_book {
                    note.book_uuid = ensure_book(&books, label)?;
                }
                if let Some(body) = content {
                    note.body.clone_from(body);
                }
                note.edited_on = at;
                note.dirty = true;
                notes.update(&note)?;
            }
            Action::RemoveNote { note_uuid } => {
                let Some(mut note) = notes.get(&parse_note_uuid(note_uuid)?)? else {
                    tracing::warn!("Legacy log removes unknown note {note_uuid}");
                    continue;
                };
                note.deleted = true;
                note.body.clear();
                note.dirty = true;
                notes.update(&note)?;
            }
        }
    }

    Ok(())
}

fn ensure_book(books: &SqliteBookRepository<'_>, label: &str) -> Result<BookId> {
    if let Some(book) = books.find_live_by_label(label)? {
        return Ok(book.uuid);
    }
    let book = Book::new(label);
    books.insert(&book)?;
    Ok(book.uuid)
}

fn parse_note_uuid(raw: &str) -> Result<NoteId> {
    raw.parse()
        .map_err(|_| Error::InvalidInput(format!("invalid note uuid in action log: {raw}")))
}
