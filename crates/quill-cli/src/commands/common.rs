use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use quill_core::db::{Database, NoteRepository, SqliteNoteRepository};
use quill_core::{Note, NoteId};
use serde::Serialize;

use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub uuid: String,
    pub preview: String,
    pub body: String,
    pub added_on: i64,
    pub relative_time: String,
    pub dirty: bool,
}

#[derive(Debug, Serialize)]
pub struct BookListItem {
    pub uuid: String,
    pub label: String,
    pub note_count: usize,
    pub dirty: bool,
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    match cli_db_path {
        Some(path) => Ok(path),
        None => default_db_path(),
    }
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    let dir = dirs::data_dir()
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))?;
    Ok(dir.join("quill").join("quill.db"))
}

pub fn open_database(path: &Path) -> Result<Database, CliError> {
    Ok(Database::open(path)?)
}

pub fn resolve_note_content(content_parts: &[String]) -> Result<String, CliError> {
    if let Some(content) = normalize_content(&content_parts.join(" ")) {
        return Ok(content);
    }

    if let Some(content) = read_piped_stdin()? {
        return Ok(content);
    }

    Err(CliError::EmptyContent)
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_note_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyNoteId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

/// Find a live note by full UUID or unique UUID prefix
pub fn resolve_note(note_query: &str, db: &Database) -> Result<Note, CliError> {
    let repo = SqliteNoteRepository::new(db.connection());

    if let Ok(note_id) = note_query.parse::<NoteId>() {
        return match repo.get(&note_id)? {
            Some(note) if !note.deleted => Ok(note),
            _ => Err(CliError::NoteNotFound(note_query.to_string())),
        };
    }

    let query = note_query.to_lowercase();
    let mut matching = repo
        .list_all()?
        .into_iter()
        .filter(|note| !note.deleted && note.uuid.as_str().starts_with(&query))
        .collect::<Vec<_>>();

    match matching.len() {
        0 => Err(CliError::NoteNotFound(note_query.to_string())),
        1 => Ok(matching.remove(0)),
        _ => {
            let options = matching
                .iter()
                .take(3)
                .map(|note| note.uuid.as_str().chars().take(13).collect::<String>())
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousNoteId(format!(
                "Note ID prefix '{note_query}' is ambiguous. Matches include: {options}"
            )))
        }
    }
}

pub fn note_to_list_item(note: &Note, now_ns: i64) -> NoteListItem {
    NoteListItem {
        uuid: note.uuid.as_str(),
        preview: note.title_preview(60),
        body: note.body.clone(),
        added_on: note.added_on,
        relative_time: format_relative_time(note.added_on, now_ns),
        dirty: note.dirty,
    }
}

pub fn format_note_lines(notes: &[Note], now_ns: i64) -> Vec<String> {
    notes
        .iter()
        .map(|note| {
            let short_id: String = note.uuid.as_str().chars().take(8).collect();
            let marker = if note.dirty { "*" } else { " " };
            format!(
                "{short_id}{marker} {:<60}  {}",
                note.title_preview(60),
                format_relative_time(note.added_on, now_ns)
            )
        })
        .collect()
}

pub fn format_timestamp(timestamp_ns: i64) -> String {
    DateTime::<Utc>::from_timestamp_nanos(timestamp_ns)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

pub fn format_relative_time(timestamp_ns: i64, now_ns: i64) -> String {
    const NANOS_PER_MINUTE: i64 = 60 * 1_000_000_000;

    let diff = now_ns.saturating_sub(timestamp_ns).max(0) / NANOS_PER_MINUTE;
    let hour = 60;
    let day = 24 * hour;
    let week = 7 * day;

    if diff < 1 {
        "just now".to_string()
    } else if diff < hour {
        format!("{diff}m ago")
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else {
        format_timestamp(timestamp_ns)
    }
}
