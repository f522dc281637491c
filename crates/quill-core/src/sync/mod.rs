//! Synchronization with the quill server
//!
//! A run pulls the server's change stream in fragments, folds them into a
//! [`SyncList`], reconciles that list with the local store inside one
//! transaction, then pushes whatever is still dirty.

mod cleanup;
mod client;
mod engine;
mod fragment;
mod list;
mod merge;
mod push;
mod report;

#[cfg(test)]
pub(crate) mod test_support;

pub use cleanup::{cleanup_local, CleanupStats};
pub use client::{fetch_fragments, HttpSyncClient, SyncClient};
pub use engine::{apply_sync_list, needs_full_sync, sync, SyncOptions, SyncSummary};
pub use fragment::{BookSnapshot, NoteSnapshot, SyncFragment, SyncState};
pub use list::{build_sync_list, check_book_in_list, check_note_in_list, SyncList};
pub use merge::{
    merge_book, merge_books, merge_note, merge_note_fields, merge_notes, MergeOutcome,
    MergeReport, MergeStats,
};
pub use push::{send_changes, PushOutcome};
pub use report::{
    get_or_create_conflicts_book, report_body_conflict, report_book_conflict,
    report_label_conflict,
};
