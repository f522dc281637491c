//! Book repository implementation

use crate::error::Result;
use crate::models::{Book, BookId};
use rusqlite::{params, Connection, OptionalExtension};

use super::parse_id;

/// Trait for book storage operations
pub trait BookRepository {
    /// Get a book by ID, tombstones included
    fn get(&self, id: &BookId) -> Result<Option<Book>>;

    /// Find the live book carrying a label
    fn find_live_by_label(&self, label: &str) -> Result<Option<Book>>;

    /// Insert a book row as-is
    fn insert(&self, book: &Book) -> Result<()>;

    /// Overwrite every column of an existing book
    fn update(&self, book: &Book) -> Result<()>;

    /// List live books ordered by label
    fn list_live(&self) -> Result<Vec<Book>>;

    /// List every book row, tombstones included
    fn list_all(&self) -> Result<Vec<Book>>;

    /// List books waiting to be pushed
    fn list_dirty(&self) -> Result<Vec<Book>>;

    /// Remove a book row permanently; returns whether a row existed
    fn hard_delete(&self, id: &BookId) -> Result<bool>;

    /// Re-key a book and every note that references it
    fn change_uuid(&self, old: &BookId, new: &BookId) -> Result<()>;
}

/// `SQLite` implementation of `BookRepository`
pub struct SqliteBookRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteBookRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a book from a database row
    fn parse_book(row: &rusqlite::Row<'_>) -> rusqlite::Result<Book> {
        Ok(Book {
            uuid: parse_id(row, 0)?,
            label: row.get(1)?,
            usn: row.get(2)?,
            deleted: row.get(3)?,
            dirty: row.get(4)?,
        })
    }

    fn query_books(&self, sql: &str) -> Result<Vec<Book>> {
        let mut stmt = self.conn.prepare(sql)?;
        let books = stmt
            .query_map([], Self::parse_book)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(books)
    }
}

impl BookRepository for SqliteBookRepository<'_> {
    fn get(&self, id: &BookId) -> Result<Option<Book>> {
        let book = self
            .conn
            .query_row(
                "SELECT uuid, label, usn, deleted, dirty FROM books WHERE uuid = ?",
                params![id.as_str()],
                Self::parse_book,
            )
            .optional()?;
        Ok(book)
    }

    fn find_live_by_label(&self, label: &str) -> Result<Option<Book>> {
        let book = self
            .conn
            .query_row(
                "SELECT uuid, label, usn, deleted, dirty FROM books
                 WHERE label = ? AND deleted = 0",
                params![label],
                Self::parse_book,
            )
            .optional()?;
        Ok(book)
    }

    fn insert(&self, book: &Book) -> Result<()> {
        self.conn.execute(
            "INSERT INTO books (uuid, label, usn, deleted, dirty) VALUES (?, ?, ?, ?, ?)",
            params![
                book.uuid.as_str(),
                book.label,
                book.usn,
                book.deleted,
                book.dirty
            ],
        )?;
        Ok(())
    }

    fn update(&self, book: &Book) -> Result<()> {
        self.conn.execute(
            "UPDATE books SET label = ?, usn = ?, deleted = ?, dirty = ? WHERE uuid = ?",
            params![
                book.label,
                book.usn,
                book.deleted,
                book.dirty,
                book.uuid.as_str()
            ],
        )?;
        Ok(())
    }

    fn list_live(&self) -> Result<Vec<Book>> {
        self.query_books(
            "SELECT uuid, label, usn, deleted, dirty FROM books
             WHERE deleted = 0 ORDER BY label ASC",
        )
    }

    fn list_all(&self) -> Result<Vec<Book>> {
        self.query_books("SELECT uuid, label, usn, deleted, dirty FROM books ORDER BY uuid")
    }

    fn list_dirty(&self) -> Result<Vec<Book>> {
        self.query_books(
            "SELECT uuid, label, usn, deleted, dirty FROM books
             WHERE dirty = 1 ORDER BY rowid",
        )
    }

    fn hard_delete(&self, id: &BookId) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM books WHERE uuid = ?", params![id.as_str()])?;
        Ok(rows > 0)
    }

    fn change_uuid(&self, old: &BookId, new: &BookId) -> Result<()> {
        self.conn.execute(
            "UPDATE books SET uuid = ? WHERE uuid = ?",
            params![new.as_str(), old.as_str()],
        )?;
        self.conn.execute(
            "UPDATE notes SET book_uuid = ? WHERE book_uuid = ?",
            params![new.as_str(), old.as_str()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, NoteRepository, SqliteNoteRepository};
    use crate::models::Note;
    use pretty_assertions::assert_eq;

    fn setup() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup();
        let repo = SqliteBookRepository::new(db.connection());

        let book = Book::new("js");
        repo.insert(&book).unwrap();

        assert_eq!(repo.get(&book.uuid).unwrap(), Some(book));
    }

    #[test]
    fn test_find_live_by_label_skips_tombstones() {
        let db = setup();
        let repo = SqliteBookRepository::new(db.connection());

        let mut book = Book::new("js");
        book.deleted = true;
        repo.insert(&book).unwrap();

        assert!(repo.find_live_by_label("js").unwrap().is_none());
        assert!(repo.get(&book.uuid).unwrap().is_some());
    }

    #[test]
    fn test_list_dirty_and_live() {
        let db = setup();
        let repo = SqliteBookRepository::new(db.connection());

        let dirty = Book::new("b");
        let mut clean = Book::new("a");
        clean.dirty = false;
        clean.usn = 3;
        repo.insert(&dirty).unwrap();
        repo.insert(&clean).unwrap();

        let live = repo.list_live().unwrap();
        assert_eq!(
            live.iter().map(|b| b.label.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert_eq!(repo.list_dirty().unwrap(), vec![dirty]);
    }

    #[test]
    fn test_change_uuid_rewrites_note_references() {
        let db = setup();
        let books = SqliteBookRepository::new(db.connection());
        let notes = SqliteNoteRepository::new(db.connection());

        let book = Book::new("js");
        books.insert(&book).unwrap();
        let note = Note::new(book.uuid, "body");
        notes.insert(&note).unwrap();

        let new_id = BookId::new();
        books.change_uuid(&book.uuid, &new_id).unwrap();

        assert!(books.get(&book.uuid).unwrap().is_none());
        assert!(books.get(&new_id).unwrap().is_some());
        assert_eq!(notes.get(&note.uuid).unwrap().unwrap().book_uuid, new_id);
    }

    #[test]
    fn test_hard_delete_reports_presence() {
        let db = setup();
        let repo = SqliteBookRepository::new(db.connection());

        let book = Book::new("js");
        repo.insert(&book).unwrap();

        assert!(repo.hard_delete(&book.uuid).unwrap());
        assert!(!repo.hard_delete(&book.uuid).unwrap());
    }
}
