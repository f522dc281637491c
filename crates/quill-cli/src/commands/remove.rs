use std::path::Path;

use quill_core::db::{NoteRepository, SqliteNoteRepository};
use quill_core::Note;

use crate::commands::common::{normalize_note_identifier, open_database, resolve_note};
use crate::error::CliError;

pub fn run_remove(id: &str, db_path: &Path) -> Result<(), CliError> {
    let note = remove_note(id, db_path)?;
    println!("{}", note.uuid);
    Ok(())
}

/// Tombstone a note so the deletion is pushed on the next sync
pub fn remove_note(id: &str, db_path: &Path) -> Result<Note, CliError> {
    let normalized_id = normalize_note_identifier(id)?;
    let db = open_database(db_path)?;
    let note = resolve_note(&normalized_id, &db)?;

    let removed = Note {
        body: String::new(),
        deleted: true,
        dirty: true,
        ..note
    };
    SqliteNoteRepository::new(db.connection()).update(&removed)?;
    Ok(removed)
}
