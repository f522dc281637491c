//! Wire types exchanged with the sync server

use serde::{Deserialize, Serialize};

use crate::models::{BookId, NoteId};

/// Server-side note state as carried in fragments and push acknowledgements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSnapshot {
    pub uuid: NoteId,
    pub book_uuid: BookId,
    pub usn: i64,
    /// Unix ns
    #[serde(default)]
    pub added_on: i64,
    /// Unix ns
    #[serde(default)]
    pub edited_on: i64,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub deleted: bool,
}

/// Server-side book state as carried in fragments and push acknowledgements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub uuid: BookId,
    pub usn: i64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub deleted: bool,
}

/// One page of the server's change stream.
///
/// A `frag_max_usn` of 0 marks the end of the stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncFragment {
    pub frag_max_usn: i64,
    pub user_max_usn: i64,
    /// Server clock, Unix seconds
    pub current_time: i64,
    #[serde(default)]
    pub notes: Vec<NoteSnapshot>,
    #[serde(default)]
    pub books: Vec<BookSnapshot>,
    #[serde(default)]
    pub expunged_notes: Vec<NoteId>,
    #[serde(default)]
    pub expunged_books: Vec<BookId>,
}

/// Response of `GET /v1/sync/state`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// Clients whose last sync predates this time (Unix seconds) must run a full sync
    pub full_sync_before: i64,
    pub max_usn: i64,
    pub current_time: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FragmentEnvelope {
    pub fragment: SyncFragment,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BookEnvelope {
    pub book: BookSnapshot,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NoteEnvelope {
    pub result: NoteSnapshot,
}
