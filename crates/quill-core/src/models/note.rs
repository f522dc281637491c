//! Note model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::BookId;
use crate::util::unix_timestamp_nanos_now;

/// A unique identifier for a note, stable across edits and moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NoteId(Uuid);

impl NoteId {
    /// Create a new unique note ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A note in the local store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier
    pub uuid: NoteId,
    /// Owning book
    pub book_uuid: BookId,
    /// Plain text body, blank when `deleted`
    pub body: String,
    /// Creation timestamp (Unix ns)
    pub added_on: i64,
    /// Last edit timestamp (Unix ns)
    pub edited_on: i64,
    /// Server update sequence number, 0 until first synced
    pub usn: i64,
    /// Tombstone flag
    pub deleted: bool,
    /// Modified locally since the last acknowledged sync
    pub dirty: bool,
}

impl Note {
    /// Create a new, never-synced note in the given book
    #[must_use]
    pub fn new(book_uuid: BookId, body: impl Into<String>) -> Self {
        Self {
            uuid: NoteId::new(),
            book_uuid,
            body: body.into(),
            added_on: unix_timestamp_nanos_now(),
            edited_on: 0,
            usn: 0,
            deleted: false,
            dirty: true,
        }
    }

    /// Get first line as title preview, truncated to `max_len` characters
    #[must_use]
    pub fn title_preview(&self, max_len: usize) -> String {
        self.body
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(max_len)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_id_unique() {
        let id1 = NoteId::new();
        let id2 = NoteId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_note_id_parse() {
        let id = NoteId::new();
        let parsed: NoteId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_note_new_is_dirty_and_unsynced() {
        let note = Note::new(BookId::new(), "Hello world");
        assert_eq!(note.body, "Hello world");
        assert!(note.dirty);
        assert!(!note.deleted);
        assert_eq!(note.usn, 0);
        assert!(note.added_on > 0);
    }

    #[test]
    fn test_title_preview() {
        let note = Note::new(BookId::new(), "First line\nSecond line\nThird line");
        assert_eq!(note.title_preview(50), "First line");
        assert_eq!(note.title_preview(5), "First");
    }

    #[test]
    fn test_note_id_serializes_as_plain_uuid() {
        let id: NoteId = "f0b8a1a4-1d3c-4c55-9b7e-2d1c3a6e9f10".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"f0b8a1a4-1d3c-4c55-9b7e-2d1c3a6e9f10\"");
    }
}
