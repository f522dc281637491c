use std::path::Path;

use quill_core::db::{BookRepository, NoteRepository, SqliteBookRepository, SqliteNoteRepository};
use quill_core::models::validate_book_label;
use quill_core::{Book, Note};

use crate::commands::common::{open_database, resolve_note_content};
use crate::error::CliError;

pub fn run_add(book_label: &str, content_parts: &[String], db_path: &Path) -> Result<(), CliError> {
    let note = add_note(book_label, content_parts, db_path)?;
    println!("{}", note.uuid);
    Ok(())
}

pub fn add_note(book_label: &str, content_parts: &[String], db_path: &Path) -> Result<Note, CliError> {
    let label = book_label.trim();
    validate_book_label(label).map_err(|error| match error {
        quill_core::Error::InvalidInput(message) => CliError::InvalidBookLabel(message),
        other => other.into(),
    })?;
    let content = resolve_note_content(content_parts)?;

    let mut db = open_database(db_path)?;
    let tx = db.transaction()?;
    let books = SqliteBookRepository::new(&tx);
    let book = if let Some(book) = books.find_live_by_label(label)? {
        book
    } else {
        let book = Book::new(label);
        books.insert(&book)?;
        tracing::debug!("Created book '{label}'");
        book
    };

    let note = Note::new(book.uuid, content);
    SqliteNoteRepository::new(&tx).insert(&note)?;
    tx.commit().map_err(quill_core::Error::from)?;
    Ok(note)
}
