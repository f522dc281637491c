//! In-memory sync server for engine tests

use std::collections::HashMap;
use std::sync::Mutex;

use super::client::SyncClient;
use super::fragment::{BookSnapshot, NoteSnapshot, SyncFragment, SyncState};
use crate::error::{Error, Result};
use crate::models::{BookId, NoteId};

pub(crate) const ADDED_ON: i64 = 1_541_108_743_000_000_000;

/// A push request as received by the scripted server
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PushCall {
    CreateBook { label: String },
    UpdateBook { uuid: BookId, label: String },
    DeleteBook { uuid: BookId },
    CreateNote { book_uuid: BookId, body: String },
    UpdateNote { uuid: NoteId, book_uuid: BookId, body: String },
    DeleteNote { uuid: NoteId },
}

#[derive(Debug, Default)]
struct ScriptState {
    sync_state: SyncState,
    fragments: Vec<SyncFragment>,
    fragment_requests: Vec<i64>,
    fail_fragments_after: Option<i64>,
    fail_pushes: bool,
    concurrent_write: Option<SyncFragment>,
    pushes: Vec<PushCall>,
    note_books: HashMap<NoteId, BookId>,
}

impl ScriptState {
    /// Assign the next USN, letting a pending concurrent write land first
    fn next_usn(&mut self) -> i64 {
        if let Some(fragment) = self.concurrent_write.take() {
            self.sync_state.max_usn = self.sync_state.max_usn.max(fragment.frag_max_usn);
            self.fragments.push(fragment);
        }
        self.sync_state.max_usn += 1;
        self.sync_state.max_usn
    }

    fn push(&mut self, call: PushCall) -> Result<i64> {
        self.pushes.push(call);
        if self.fail_pushes {
            return Err(Error::Api {
                status: 500,
                message: "push rejected".to_string(),
            });
        }
        Ok(self.next_usn())
    }
}

/// A `SyncClient` serving a fixed change stream and acknowledging pushes
#[derive(Debug, Default)]
pub(crate) struct ScriptedClient {
    state: Mutex<ScriptState>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty fragment ending at `usn`
    pub fn fragment(usn: i64, current_time: i64) -> SyncFragment {
        SyncFragment {
            frag_max_usn: usn,
            user_max_usn: usn,
            current_time,
            ..SyncFragment::default()
        }
    }

    pub fn with_state(self, sync_state: SyncState) -> Self {
        self.state.lock().unwrap().sync_state = sync_state;
        self
    }

    /// Append a fragment; fragments must be added in ascending USN order
    pub fn with_fragment(self, fragment: SyncFragment) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.sync_state.max_usn = state.sync_state.max_usn.max(fragment.frag_max_usn);
            state.sync_state.current_time = state.sync_state.current_time.max(fragment.current_time);
            for note in &fragment.notes {
                state.note_books.insert(note.uuid, note.book_uuid);
            }
            state.fragments.push(fragment);
        }
        self
    }

    pub fn failing_fragments_after(self, usn: i64) -> Self {
        self.state.lock().unwrap().fail_fragments_after = Some(usn);
        self
    }

    pub fn failing_pushes(self) -> Self {
        self.state.lock().unwrap().fail_pushes = true;
        self
    }

    /// Another client writes `fragment` right before the first push lands
    pub fn with_concurrent_write(self, fragment: SyncFragment) -> Self {
        self.state.lock().unwrap().concurrent_write = Some(fragment);
        self
    }

    pub fn fragment_requests(&self) -> Vec<i64> {
        self.state.lock().unwrap().fragment_requests.clone()
    }

    pub fn pushes(&self) -> Vec<PushCall> {
        self.state.lock().unwrap().pushes.clone()
    }
}

impl SyncClient for ScriptedClient {
    async fn get_sync_state(&self) -> Result<SyncState> {
        Ok(self.state.lock().unwrap().sync_state)
    }

    async fn get_sync_fragment(&self, after_usn: i64) -> Result<SyncFragment> {
        let mut state = self.state.lock().unwrap();
        state.fragment_requests.push(after_usn);
        if state.fail_fragments_after == Some(after_usn) {
            return Err(Error::Api {
                status: 503,
                message: "Service Unavailable".to_string(),
            });
        }

        let next = state
            .fragments
            .iter()
            .find(|fragment| fragment.frag_max_usn > after_usn)
            .cloned();
        Ok(next.unwrap_or_else(|| SyncFragment {
            frag_max_usn: 0,
            user_max_usn: state.sync_state.max_usn,
            current_time: state.sync_state.current_time,
            ..SyncFragment::default()
        }))
    }

    async fn create_book(&self, label: &str) -> Result<BookSnapshot> {
        let usn = self.state.lock().unwrap().push(PushCall::CreateBook {
            label: label.to_string(),
        })?;
        Ok(book_snapshot(BookId::new(), usn, label))
    }

    async fn update_book(&self, uuid: &BookId, label: &str) -> Result<BookSnapshot> {
        let usn = self.state.lock().unwrap().push(PushCall::UpdateBook {
            uuid: *uuid,
            label: label.to_string(),
        })?;
        Ok(book_snapshot(*uuid, usn, label))
    }

    async fn delete_book(&self, uuid: &BookId) -> Result<BookSnapshot> {
        let usn = self
            .state
            .lock()
            .unwrap()
            .push(PushCall::DeleteBook { uuid: *uuid })?;
        Ok(BookSnapshot {
            deleted: true,
            ..book_snapshot(*uuid, usn, "")
        })
    }

    async fn create_note(&self, book_uuid: &BookId, body: &str) -> Result<NoteSnapshot> {
        let mut state = self.state.lock().unwrap();
        let usn = state.push(PushCall::CreateNote {
            book_uuid: *book_uuid,
            body: body.to_string(),
        })?;
        let uuid = NoteId::new();
        state.note_books.insert(uuid, *book_uuid);
        Ok(note_snapshot(uuid, *book_uuid, usn, body))
    }

    async fn update_note(
        &self,
        uuid: &NoteId,
        book_uuid: &BookId,
        body: &str,
    ) -> Result<NoteSnapshot> {
        let mut state = self.state.lock().unwrap();
        let usn = state.push(PushCall::UpdateNote {
            uuid: *uuid,
            book_uuid: *book_uuid,
            body: body.to_string(),
        })?;
        state.note_books.insert(*uuid, *book_uuid);
        Ok(note_snapshot(*uuid, *book_uuid, usn, body))
    }

    async fn delete_note(&self, uuid: &NoteId) -> Result<NoteSnapshot> {
        let mut state = self.state.lock().unwrap();
        let usn = state.push(PushCall::DeleteNote { uuid: *uuid })?;
        let book_uuid = state.note_books.get(uuid).copied().unwrap_or_default();
        Ok(NoteSnapshot {
            deleted: true,
            ..note_snapshot(*uuid, book_uuid, usn, "")
        })
    }
}

pub(crate) fn note_snapshot(uuid: NoteId, book_uuid: BookId, usn: i64, body: &str) -> NoteSnapshot {
    NoteSnapshot {
        uuid,
        book_uuid,
        usn,
        added_on: ADDED_ON,
        edited_on: ADDED_ON + usn,
        body: body.to_string(),
        deleted: false,
    }
}

pub(crate) fn book_snapshot(uuid: BookId, usn: i64, label: &str) -> BookSnapshot {
    BookSnapshot {
        uuid,
        usn,
        label: label.to_string(),
        deleted: false,
    }
}
