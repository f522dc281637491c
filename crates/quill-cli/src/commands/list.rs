use std::path::Path;

use quill_core::db::{BookRepository, NoteRepository, SqliteBookRepository, SqliteNoteRepository};
use quill_core::util::unix_timestamp_nanos_now;

use crate::commands::common::{
    format_note_lines, note_to_list_item, open_database, BookListItem, NoteListItem,
};
use crate::error::CliError;

pub fn run_list(book_label: Option<&str>, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    match book_label {
        Some(label) => list_notes(label, as_json, db_path),
        None => list_books(as_json, db_path),
    }
}

pub fn book_items(db_path: &Path) -> Result<Vec<BookListItem>, CliError> {
    let db = open_database(db_path)?;
    let notes = SqliteNoteRepository::new(db.connection());

    SqliteBookRepository::new(db.connection())
        .list_live()?
        .into_iter()
        .map(|book| -> Result<BookListItem, CliError> {
            Ok(BookListItem {
                uuid: book.uuid.as_str(),
                note_count: notes.count_by_book(&book.uuid)?,
                label: book.label,
                dirty: book.dirty,
            })
        })
        .collect()
}

fn list_books(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let items = book_items(db_path)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No books yet. Add a note with `quill add <book> <content>`.");
        return Ok(());
    }
    for item in items {
        println!("{} ({})", item.label, item.note_count);
    }
    Ok(())
}

fn list_notes(label: &str, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let book = SqliteBookRepository::new(db.connection())
        .find_live_by_label(label.trim())?
        .ok_or_else(|| CliError::BookNotFound(label.to_string()))?;
    let notes = SqliteNoteRepository::new(db.connection()).list_by_book(&book.uuid)?;
    let now = unix_timestamp_nanos_now();

    if as_json {
        let json_items = notes
            .iter()
            .map(|note| note_to_list_item(note, now))
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        println!("on book {}", book.label);
        for line in format_note_lines(&notes, now) {
            println!("{line}");
        }
    }

    Ok(())
}
