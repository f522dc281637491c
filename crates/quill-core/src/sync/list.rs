//! Aggregation of fragments into a single view of server changes

use std::collections::{BTreeMap, BTreeSet};

use super::fragment::{BookSnapshot, NoteSnapshot, SyncFragment};
use crate::models::{BookId, NoteId};

/// Every change a run has to reconcile, keyed by UUID.
///
/// A UUID is either live (in `notes`/`books`) or expunged, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncList {
    pub notes: BTreeMap<NoteId, NoteSnapshot>,
    pub books: BTreeMap<BookId, BookSnapshot>,
    pub expunged_notes: BTreeSet<NoteId>,
    pub expunged_books: BTreeSet<BookId>,
    pub max_usn: i64,
    /// Unix seconds
    pub max_current_time: i64,
}

impl SyncList {
    /// Whether the server has an opinion about this note
    pub fn contains_note(&self, uuid: &NoteId) -> bool {
        self.notes.contains_key(uuid) || self.expunged_notes.contains(uuid)
    }

    /// Whether the server has an opinion about this book
    pub fn contains_book(&self, uuid: &BookId) -> bool {
        self.books.contains_key(uuid) || self.expunged_books.contains(uuid)
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
            && self.books.is_empty()
            && self.expunged_notes.is_empty()
            && self.expunged_books.is_empty()
    }
}

/// Fold fragments into a [`SyncList`].
///
/// Fragments are applied in ascending `frag_max_usn` order and application
/// order is precedence: whatever a later fragment says about a UUID replaces
/// what an earlier one said, including moves between live and expunged.
/// Within one fragment, expunges are applied after live entries.
pub fn build_sync_list(fragments: &[SyncFragment]) -> SyncList {
    let mut ordered = fragments.iter().collect::<Vec<_>>();
    ordered.sort_by_key(|fragment| fragment.frag_max_usn);

    let mut list = SyncList::default();
    for fragment in ordered {
        for note in &fragment.notes {
            list.expunged_notes.remove(&note.uuid);
            list.notes.insert(note.uuid, note.clone());
        }
        for book in &fragment.books {
            list.expunged_books.remove(&book.uuid);
            list.books.insert(book.uuid, book.clone());
        }
        for uuid in &fragment.expunged_notes {
            list.notes.remove(uuid);
            list.expunged_notes.insert(*uuid);
        }
        for uuid in &fragment.expunged_books {
            list.books.remove(uuid);
            list.expunged_books.insert(*uuid);
        }

        list.max_usn = fragment.frag_max_usn;
        list.max_current_time = fragment.current_time;
    }

    list
}

/// True iff the note is live or expunged in the list
pub fn check_note_in_list(uuid: &NoteId, list: &SyncList) -> bool {
    list.contains_note(uuid)
}

/// True iff the book is live or expunged in the list
pub fn check_book_in_list(uuid: &BookId, list: &SyncList) -> bool {
    list.contains_book(uuid)
}
