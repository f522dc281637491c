//! Note repository implementation

use crate::error::Result;
use crate::models::{BookId, Note, NoteId};
use rusqlite::{params, Connection, OptionalExtension};

use super::parse_id;

const NOTE_COLUMNS: &str = "uuid, book_uuid, body, added_on, edited_on, usn, deleted, dirty";

/// Trait for note storage operations
pub trait NoteRepository {
    /// Get a note by ID, tombstones included
    fn get(&self, id: &NoteId) -> Result<Option<Note>>;

    /// Insert a note row as-is
    fn insert(&self, note: &Note) -> Result<()>;

    /// Overwrite every mutable column of an existing note
    fn update(&self, note: &Note) -> Result<()>;

    /// List live notes of a book, oldest first
    fn list_by_book(&self, book: &BookId) -> Result<Vec<Note>>;

    /// Count live notes of a book
    fn count_by_book(&self, book: &BookId) -> Result<usize>;

    /// List every note row, tombstones included
    fn list_all(&self) -> Result<Vec<Note>>;

    /// List notes waiting to be pushed
    fn list_dirty(&self) -> Result<Vec<Note>>;

    /// Remove a note row permanently; returns whether a row existed
    fn hard_delete(&self, id: &NoteId) -> Result<bool>;

    /// Re-key a note
    fn change_uuid(&self, old: &NoteId, new: &NoteId) -> Result<()>;
}

/// `SQLite` implementation of `NoteRepository`
pub struct SqliteNoteRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteNoteRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a note from a database row
    fn parse_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<Note> {
        Ok(Note {
            uuid: parse_id(row, 0)?,
            book_uuid: parse_id(row, 1)?,
            body: row.get(2)?,
            added_on: row.get(3)?,
            edited_on: row.get(4)?,
            usn: row.get(5)?,
            deleted: row.get(6)?,
            dirty: row.get(7)?,
        })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn get(&self, id: &NoteId) -> Result<Option<Note>> {
        let note = self
            .conn
            .query_row(
                &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE uuid = ?"),
                params![id.as_str()],
                Self::parse_note,
            )
            .optional()?;
        Ok(note)
    }

    fn insert(&self, note: &Note) -> Result<()> {
        self.conn.execute(
            &format!("INSERT INTO notes ({NOTE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"),
            params![
                note.uuid.as_str(),
                note.book_uuid.as_str(),
                note.body,
                note.added_on,
                note.edited_on,
                note.usn,
                note.deleted,
                note.dirty
            ],
        )?;
        Ok(())
    }

    fn update(&self, note: &Note) -> Result<()> {
        self.conn.execute(
            "UPDATE notes
             SET book_uuid = ?, body = ?, added_on = ?, edited_on = ?, usn = ?, deleted = ?, dirty = ?
             WHERE uuid = ?",
            params![
                note.book_uuid.as_str(),
                note.body,
                note.added_on,
                note.edited_on,
                note.usn,
                note.deleted,
                note.dirty,
                note.uuid.as_str()
            ],
        )?;
        Ok(())
    }

    fn list_by_book(&self, book: &BookId) -> Result<Vec<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes
             WHERE book_uuid = ? AND deleted = 0
             ORDER BY added_on ASC"
        ))?;
        let notes = stmt
            .query_map(params![book.as_str()], Self::parse_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notes)
    }

    fn count_by_book(&self, book: &BookId) -> Result<usize> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM notes WHERE book_uuid = ? AND deleted = 0",
            params![book.as_str()],
            |row| row.get::<_, usize>(0),
        )?;
        Ok(count)
    }

    fn list_all(&self) -> Result<Vec<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {NOTE_COLUMNS} FROM notes ORDER BY uuid"))?;
        let notes = stmt
            .query_map([], Self::parse_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notes)
    }

    fn list_dirty(&self) -> Result<Vec<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE dirty = 1 ORDER BY rowid"
        ))?;
        let notes = stmt
            .query_map([], Self::parse_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notes)
    }

    fn hard_delete(&self, id: &NoteId) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM notes WHERE uuid = ?", params![id.as_str()])?;
        Ok(rows > 0)
    }

    fn change_uuid(&self, old: &NoteId, new: &NoteId) -> Result<()> {
        self.conn.execute(
            "UPDATE notes SET uuid = ? WHERE uuid = ?",
            params![new.as_str(), old.as_str()],
        )?;
        Ok(())
    }
}
