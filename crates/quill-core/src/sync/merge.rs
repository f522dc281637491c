//! Per-entity reconciliation of server snapshots with local rows
//!
//! Books are merged before notes so every note can be placed in a book that
//! already exists locally. A snapshot only touches an existing row when its
//! USN is newer than the row's: a row that has already absorbed a revision
//! is left alone, which makes replaying a full stream a no-op.

use std::collections::BTreeMap;

use rusqlite::Connection;

use super::fragment::{BookSnapshot, NoteSnapshot};
use super::list::SyncList;
use super::report::{
    get_or_create_conflicts_book, report_body_conflict, report_book_conflict,
    report_label_conflict,
};
use crate::db::{BookRepository, NoteRepository, SqliteBookRepository, SqliteNoteRepository};
use crate::error::{Error, Result};
use crate::models::{Book, BookId, Note, NoteId};

/// What happened to one entity during a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Server copy inserted, no local row existed
    Inserted,
    /// Local row overwritten with the server copy
    TookServer,
    /// Both sides changed; a conflict artifact was written
    Conflicted,
    /// Nothing to do (tombstone for an unknown row, or revision already seen)
    Skipped,
}

/// Tally of merge outcomes for one resource kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub inserted: usize,
    pub took_server: usize,
    pub conflicted: usize,
    pub skipped: usize,
}

impl MergeStats {
    fn record(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Inserted => self.inserted += 1,
            MergeOutcome::TookServer => self.took_server += 1,
            MergeOutcome::Conflicted => self.conflicted += 1,
            MergeOutcome::Skipped => self.skipped += 1,
        }
    }

    /// Add another tally into this one
    pub fn absorb(&mut self, other: Self) {
        self.inserted += other.inserted;
        self.took_server += other.took_server;
        self.conflicted += other.conflicted;
        self.skipped += other.skipped;
    }

    /// Number of rows this merge wrote
    pub const fn changed(&self) -> usize {
        self.inserted + self.took_server + self.conflicted
    }
}

/// Resolved state of a note that changed on both sides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub body: String,
    pub book_uuid: BookId,
    pub edited_on: i64,
}

/// Merge every book in the list, in UUID order
pub fn merge_books(conn: &Connection, list: &SyncList) -> Result<MergeStats> {
    let mut stats = MergeStats::default();
    for book in list.books.values() {
        stats.record(merge_book_with(conn, book, &list.books)?);
    }
    Ok(stats)
}

/// Merge every note in the list, in UUID order
pub fn merge_notes(conn: &Connection, list: &SyncList) -> Result<MergeStats> {
    let mut stats = MergeStats::default();
    for note in list.notes.values() {
        stats.record(merge_note(conn, note)?);
    }
    Ok(stats)
}

/// Reconcile one server book with the local store
pub fn merge_book(conn: &Connection, server: &BookSnapshot) -> Result<MergeOutcome> {
    merge_book_with(conn, server, &BTreeMap::new())
}

/// `pending` holds the snapshots still to be merged in this run, so a book
/// displaced from its label can be recognised as one the server also moved.
fn merge_book_with(
    conn: &Connection,
    server: &BookSnapshot,
    pending: &BTreeMap<BookId, BookSnapshot>,
) -> Result<MergeOutcome> {
    let books = SqliteBookRepository::new(conn);

    let Some(local) = books.get(&server.uuid)? else {
        if server.deleted {
            tracing::debug!("Skipping tombstone for unknown book {}", server.uuid);
            return Ok(MergeOutcome::Skipped);
        }
        make_label_available(&books, &server.label, &server.uuid, pending)?;
        books.insert(&server_book(server))?;
        tracing::debug!("Inserted book {} '{}'", server.uuid, server.label);
        return Ok(MergeOutcome::Inserted);
    };

    if server.usn <= local.usn {
        return Ok(MergeOutcome::Skipped);
    }

    // A local deletion loses to a server edit: the server's notes may still live there
    let server_wins = !local.dirty || local.deleted;
    let converged = !server.deleted && local.label == server.label;
    if server_wins || converged {
        if !server.deleted {
            make_label_available(&books, &server.label, &server.uuid, pending)?;
        }
        books.update(&server_book(server))?;
        tracing::debug!("Book {} takes server state at usn {}", server.uuid, server.usn);
        return Ok(MergeOutcome::TookServer);
    }

    // Local rename pending: keep it alive under the local label for the next push
    books.update(&Book {
        usn: server.usn,
        ..local.clone()
    })?;

    if server.deleted {
        tracing::warn!(
            "Book '{}' was renamed locally but deleted on the server; keeping it",
            local.label
        );
    } else {
        let conflicts = get_or_create_conflicts_book(conn)?;
        let body = report_label_conflict(&local.uuid, &local.label, &server.label);
        SqliteNoteRepository::new(conn).insert(&Note::new(conflicts, body))?;
        tracing::warn!(
            "Book {} renamed to '{}' locally and '{}' on the server",
            local.uuid,
            local.label,
            server.label
        );
    }
    Ok(MergeOutcome::Conflicted)
}

/// Reconcile one server note with the local store
pub fn merge_note(conn: &Connection, server: &NoteSnapshot) -> Result<MergeOutcome> {
    let notes = SqliteNoteRepository::new(conn);

    let Some(local) = notes.get(&server.uuid)? else {
        if server.deleted {
            tracing::debug!("Skipping tombstone for unknown note {}", server.uuid);
            return Ok(MergeOutcome::Skipped);
        }
        let mut note = server_note(server);
        place_note(conn, &mut note)?;
        notes.insert(&note)?;
        tracing::debug!("Inserted note {}", server.uuid);
        return Ok(MergeOutcome::Inserted);
    };

    if server.usn <= local.usn {
        return Ok(MergeOutcome::Skipped);
    }

    let server_body = if server.deleted { "" } else { server.body.as_str() };
    let converged = local.deleted == server.deleted
        && local.body == server_body
        && local.book_uuid == server.book_uuid;
    if !local.dirty || converged {
        let mut note = server_note(server);
        if note.added_on == 0 {
            note.added_on = local.added_on;
        }
        if !note.deleted {
            place_note(conn, &mut note)?;
        }
        notes.update(&note)?;
        tracing::debug!("Note {} takes server state at usn {}", server.uuid, server.usn);
        return Ok(MergeOutcome::TookServer);
    }

    let report = merge_note_fields(conn, &local, server)?;
    let mut note = Note {
        uuid: local.uuid,
        book_uuid: report.book_uuid,
        body: report.body,
        added_on: local.added_on,
        edited_on: report.edited_on,
        usn: server.usn,
        deleted: false,
        dirty: true,
    };
    place_note(conn, &mut note)?;
    notes.update(&note)?;
    tracing::warn!("Note {} changed on both sides; conflict written", local.uuid);
    Ok(MergeOutcome::Conflicted)
}

/// Resolve body, book and edit time of a note that changed on both sides.
///
/// A local deletion takes part as an empty body, so deleted-here versus
/// edited-there surfaces as a body conflict rather than either side winning.
pub fn merge_note_fields(
    conn: &Connection,
    local: &Note,
    server: &NoteSnapshot,
) -> Result<MergeReport> {
    let server_body = if server.deleted { "" } else { server.body.as_str() };
    let mut body = if local.body == server_body {
        local.body.clone()
    } else {
        report_body_conflict(&local.body, server_body)
    };

    let book_uuid = if local.book_uuid == server.book_uuid {
        server.book_uuid
    } else {
        let books = SqliteBookRepository::new(conn);
        let local_label = book_label(&books, &local.book_uuid, &local.uuid)?;
        let server_label = book_label(&books, &server.book_uuid, &local.uuid)?;
        body = report_book_conflict(&local_label, &server_label, &body);
        get_or_create_conflicts_book(conn)?
    };

    Ok(MergeReport {
        body,
        book_uuid,
        edited_on: local.edited_on.max(server.edited_on),
    })
}

fn server_book(server: &BookSnapshot) -> Book {
    Book {
        uuid: server.uuid,
        label: server.label.clone(),
        usn: server.usn,
        deleted: server.deleted,
        dirty: false,
    }
}

fn server_note(server: &NoteSnapshot) -> Note {
    Note {
        uuid: server.uuid,
        book_uuid: server.book_uuid,
        body: if server.deleted {
            String::new()
        } else {
            server.body.clone()
        },
        added_on: server.added_on,
        edited_on: server.edited_on,
        usn: server.usn,
        deleted: server.deleted,
        dirty: false,
    }
}

fn book_label(books: &SqliteBookRepository<'_>, book: &BookId, note: &NoteId) -> Result<String> {
    books.get(book)?.map(|book| book.label).ok_or_else(|| {
        Error::SyncIntegrity(format!("note {note} references unknown book {book}"))
    })
}

/// Make sure a live note sits in a live book.
///
/// A book deleted locally while the server still files notes under it sends
/// the note to the conflicts book, dirty, so the move is pushed back. A book
/// unknown to the store is a data anomaly.
fn place_note(conn: &Connection, note: &mut Note) -> Result<()> {
    let books = SqliteBookRepository::new(conn);
    match books.get(&note.book_uuid)? {
        Some(book) if !book.deleted => Ok(()),
        Some(book) => {
            let conflicts = get_or_create_conflicts_book(conn)?;
            tracing::warn!(
                "Note {} belongs to locally deleted book '{}'; moving it to conflicts",
                note.uuid,
                book.label
            );
            note.book_uuid = conflicts;
            note.dirty = true;
            Ok(())
        }
        None => Err(Error::SyncIntegrity(format!(
            "note {} references unknown book {}",
            note.uuid, note.book_uuid
        ))),
    }
}

/// Rename any other live book holding `label` to the first free `label_N`
///
/// A clean book with a newer snapshot in `pending` is only parked there: its
/// own merge overwrites the label, so it stays clean. Any other displaced
/// book becomes dirty so the rename reaches the server.
fn make_label_available(
    books: &SqliteBookRepository<'_>,
    label: &str,
    owner: &BookId,
    pending: &BTreeMap<BookId, BookSnapshot>,
) -> Result<()> {
    let Some(mut clash) = books.find_live_by_label(label)? else {
        return Ok(());
    };
    if clash.uuid == *owner {
        return Ok(());
    }

    let mut suffix = 2;
    let renamed = loop {
        let candidate = format!("{label}_{suffix}");
        if books.find_live_by_label(&candidate)?.is_none() {
            break candidate;
        }
        suffix += 1;
    };

    let parked = pending
        .get(&clash.uuid)
        .is_some_and(|snapshot| snapshot.usn > clash.usn);
    if parked {
        tracing::debug!("Parking book {} as '{renamed}' until its own merge", clash.uuid);
    } else {
        tracing::warn!("Renaming local book '{label}' to '{renamed}' for server book {owner}");
    }
    clash.label = renamed;
    clash.dirty |= !parked;
    books.update(&clash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::CONFLICTS_BOOK_LABEL;
    use crate::sync::test_support::{book_snapshot, note_snapshot, ADDED_ON};
    use pretty_assertions::assert_eq;

    fn setup() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn seed_book(conn: &Connection, label: &str, usn: i64, dirty: bool) -> Book {
        let book = Book {
            usn,
            dirty,
            ..Book::new(label)
        };
        SqliteBookRepository::new(conn).insert(&book).unwrap();
        book
    }

    fn seed_note(conn: &Connection, book: &Book, body: &str, usn: i64, dirty: bool) -> Note {
        let note = Note {
            added_on: ADDED_ON,
            edited_on: ADDED_ON + 1,
            usn,
            dirty,
            ..Note::new(book.uuid, body)
        };
        SqliteNoteRepository::new(conn).insert(&note).unwrap();
        note
    }

    fn stored_note(conn: &Connection, id: &NoteId) -> Note {
        SqliteNoteRepository::new(conn).get(id).unwrap().unwrap()
    }

    fn conflicts_books(conn: &Connection) -> Vec<Book> {
        SqliteBookRepository::new(conn)
            .list_all()
            .unwrap()
            .into_iter()
            .filter(|book| book.label == CONFLICTS_BOOK_LABEL)
            .collect()
    }

    #[test]
    fn clean_note_takes_server_state() {
        let db = setup();
        let conn = db.connection();
        let book = seed_book(conn, "js", 1, false);
        let local = seed_note(conn, &book, "n1 body", 5, false);

        let server = note_snapshot(local.uuid, book.uuid, 21, "n1 body edited");
        let outcome = merge_note(conn, &server).unwrap();

        assert_eq!(outcome, MergeOutcome::TookServer);
        let note = stored_note(conn, &local.uuid);
        assert_eq!(note.usn, 21);
        assert_eq!(note.body, "n1 body edited");
        assert_eq!(note.book_uuid, book.uuid);
        assert_eq!(note.edited_on, server.edited_on);
        assert!(!note.dirty);
    }

    #[test]
    fn clean_note_follows_server_move() {
        let db = setup();
        let conn = db.connection();
        let js = seed_book(conn, "js", 1, false);
        let css = seed_book(conn, "css", 2, false);
        let local = seed_note(conn, &js, "body", 3, false);

        merge_note(conn, &note_snapshot(local.uuid, css.uuid, 9, "body")).unwrap();

        let note = stored_note(conn, &local.uuid);
        assert_eq!(note.book_uuid, css.uuid);
        assert!(!note.dirty);
        assert!(conflicts_books(conn).is_empty());
    }

    #[test]
    fn dirty_body_divergence_writes_conflict_markers() {
        let db = setup();
        let conn = db.connection();
        let book = seed_book(conn, "js", 1, false);
        let local = seed_note(conn, &book, "foo", 3, true);

        let outcome = merge_note(conn, &note_snapshot(local.uuid, book.uuid, 8, "bar")).unwrap();

        assert_eq!(outcome, MergeOutcome::Conflicted);
        let note = stored_note(conn, &local.uuid);
        assert_eq!(note.body, "<<<<<<< Local\nfoo\n=======\nbar\n>>>>>>> Server\n");
        assert_eq!(note.book_uuid, book.uuid);
        assert!(note.dirty);
        assert!(!note.deleted);
        assert!(conflicts_books(conn).is_empty());
    }

    #[test]
    fn dirty_note_keeps_latest_edit_time() {
        let db = setup();
        let conn = db.connection();
        let book = seed_book(conn, "js", 1, false);
        let local = Note {
            edited_on: ADDED_ON + 1_000,
            ..seed_note(conn, &book, "foo", 3, true)
        };
        SqliteNoteRepository::new(conn).update(&local).unwrap();

        let server = note_snapshot(local.uuid, book.uuid, 8, "bar");
        let report = merge_note_fields(conn, &local, &server).unwrap();

        assert_eq!(report.edited_on, ADDED_ON + 1_000);
        assert_eq!(report.book_uuid, book.uuid);
    }

    #[test]
    fn dirty_move_on_both_sides_redirects_to_single_conflicts_book() {
        let db = setup();
        let conn = db.connection();
        let js = seed_book(conn, "js", 1, false);
        let css = seed_book(conn, "css", 2, false);
        let local = seed_note(conn, &js, "foo", 3, true);

        merge_note(conn, &note_snapshot(local.uuid, css.uuid, 8, "foo")).unwrap();

        let conflicts = conflicts_books(conn);
        assert_eq!(conflicts.len(), 1);
        let note = stored_note(conn, &local.uuid);
        assert_eq!(note.book_uuid, conflicts[0].uuid);
        assert_eq!(
            note.body,
            "<<<<<<< Local\nMoved to the book js\n=======\nMoved to the book css\n>>>>>>> Server\n\nfoo"
        );
        assert!(note.dirty);

        // The next revision from the server conflicts again but reuses the book
        merge_note(conn, &note_snapshot(local.uuid, js.uuid, 12, "foo")).unwrap();
        assert_eq!(conflicts_books(conn).len(), 1);
        assert_eq!(stored_note(conn, &local.uuid).book_uuid, conflicts[0].uuid);
    }

    #[test]
    fn local_delete_against_server_edit_is_a_conflict() {
        let db = setup();
        let conn = db.connection();
        let book = seed_book(conn, "js", 1, false);
        let local = Note {
            body: String::new(),
            deleted: true,
            ..seed_note(conn, &book, "n1 body", 3, true)
        };
        SqliteNoteRepository::new(conn).update(&local).unwrap();

        let outcome =
            merge_note(conn, &note_snapshot(local.uuid, book.uuid, 9, "n1 body edited")).unwrap();

        assert_eq!(outcome, MergeOutcome::Conflicted);
        let note = stored_note(conn, &local.uuid);
        assert!(!note.deleted);
        assert!(note.dirty);
        assert_eq!(
            note.body,
            "<<<<<<< Local\n=======\nn1 body edited\n>>>>>>> Server\n"
        );
    }

    #[test]
    fn deletion_on_both_sides_settles_on_server_tombstone() {
        let db = setup();
        let conn = db.connection();
        let book = seed_book(conn, "js", 1, false);
        let local = Note {
            body: String::new(),
            deleted: true,
            ..seed_note(conn, &book, "gone", 3, true)
        };
        SqliteNoteRepository::new(conn).update(&local).unwrap();

        let server = NoteSnapshot {
            deleted: true,
            ..note_snapshot(local.uuid, book.uuid, 9, "")
        };
        merge_note(conn, &server).unwrap();

        let note = stored_note(conn, &local.uuid);
        assert!(note.deleted);
        assert!(!note.dirty);
        assert_eq!(note.usn, 9);
        assert_eq!(note.body, "");
    }

    #[test]
    fn unknown_server_note_is_inserted_clean() {
        let db = setup();
        let conn = db.connection();
        let book = seed_book(conn, "js", 1, false);
        let id = NoteId::new();

        let outcome = merge_note(conn, &note_snapshot(id, book.uuid, 4, "fresh")).unwrap();

        assert_eq!(outcome, MergeOutcome::Inserted);
        let note = stored_note(conn, &id);
        assert_eq!(note.body, "fresh");
        assert_eq!(note.added_on, ADDED_ON);
        assert!(!note.dirty);
    }

    #[test]
    fn tombstone_for_unknown_note_is_skipped() {
        let db = setup();
        let conn = db.connection();
        let book = seed_book(conn, "js", 1, false);
        let id = NoteId::new();
        let server = NoteSnapshot {
            deleted: true,
            ..note_snapshot(id, book.uuid, 4, "")
        };

        assert_eq!(merge_note(conn, &server).unwrap(), MergeOutcome::Skipped);
        assert!(SqliteNoteRepository::new(conn).get(&id).unwrap().is_none());
    }

    #[test]
    fn already_seen_revision_is_skipped() {
        let db = setup();
        let conn = db.connection();
        let book = seed_book(conn, "js", 1, false);
        let local = seed_note(conn, &book, "local edit", 7, true);

        let outcome = merge_note(conn, &note_snapshot(local.uuid, book.uuid, 7, "older")).unwrap();

        assert_eq!(outcome, MergeOutcome::Skipped);
        assert_eq!(stored_note(conn, &local.uuid), local);
    }

    #[test]
    fn note_in_unknown_book_is_an_integrity_error() {
        let db = setup();
        let conn = db.connection();

        let error = merge_note(conn, &note_snapshot(NoteId::new(), BookId::new(), 3, "x")).unwrap_err();

        assert!(matches!(error, Error::SyncIntegrity(_)));
    }

    #[test]
    fn note_in_locally_deleted_book_moves_to_conflicts() {
        let db = setup();
        let conn = db.connection();
        let book = Book {
            deleted: true,
            ..seed_book(conn, "js", 1, true)
        };
        SqliteBookRepository::new(conn).update(&book).unwrap();
        let id = NoteId::new();

        merge_note(conn, &note_snapshot(id, book.uuid, 4, "orphan")).unwrap();

        let note = stored_note(conn, &id);
        assert_eq!(note.book_uuid, conflicts_books(conn)[0].uuid);
        assert!(note.dirty);
    }

    #[test]
    fn clean_book_takes_server_label() {
        let db = setup();
        let conn = db.connection();
        let local = seed_book(conn, "js", 1, false);

        let outcome = merge_book(conn, &book_snapshot(local.uuid, 6, "javascript")).unwrap();

        assert_eq!(outcome, MergeOutcome::TookServer);
        let book = SqliteBookRepository::new(conn).get(&local.uuid).unwrap().unwrap();
        assert_eq!(book.label, "javascript");
        assert_eq!(book.usn, 6);
        assert!(!book.dirty);
    }

    #[test]
    fn server_book_displaces_local_label_holder() {
        let db = setup();
        let conn = db.connection();
        let local = seed_book(conn, "js", 0, true);
        seed_book(conn, "js_2", 0, true);
        let server_id = BookId::new();

        let outcome = merge_book(conn, &book_snapshot(server_id, 3, "js")).unwrap();

        assert_eq!(outcome, MergeOutcome::Inserted);
        let books = SqliteBookRepository::new(conn);
        let renamed = books.get(&local.uuid).unwrap().unwrap();
        assert_eq!(renamed.label, "js_3");
        assert!(renamed.dirty);
        assert_eq!(books.find_live_by_label("js").unwrap().unwrap().uuid, server_id);
    }

    #[test]
    fn label_swap_between_clean_books_takes_server_labels() {
        let db = setup();
        let conn = db.connection();
        let first = seed_book(conn, "x", 1, false);
        let second = seed_book(conn, "y", 2, false);

        let mut fragment = crate::sync::test_support::ScriptedClient::fragment(5, 100);
        fragment.books.push(book_snapshot(first.uuid, 5, "y"));
        fragment.books.push(book_snapshot(second.uuid, 4, "x"));
        let list = crate::sync::build_sync_list(&[fragment]);

        let stats = merge_books(conn, &list).unwrap();

        assert_eq!(
            stats,
            MergeStats {
                took_server: 2,
                ..MergeStats::default()
            }
        );
        let books = SqliteBookRepository::new(conn);
        let first = books.get(&first.uuid).unwrap().unwrap();
        let second = books.get(&second.uuid).unwrap().unwrap();
        assert_eq!((first.label.as_str(), first.dirty), ("y", false));
        assert_eq!((second.label.as_str(), second.dirty), ("x", false));
        assert!(conflicts_books(conn).is_empty());
    }

    #[test]
    fn dirty_rename_against_server_rename_writes_conflict_note() {
        let db = setup();
        let conn = db.connection();
        let local = Book {
            label: "js".to_string(),
            ..seed_book(conn, "javascript", 2, true)
        };
        SqliteBookRepository::new(conn).update(&local).unwrap();

        let outcome = merge_book(conn, &book_snapshot(local.uuid, 5, "ecmascript")).unwrap();

        assert_eq!(outcome, MergeOutcome::Conflicted);
        let book = SqliteBookRepository::new(conn).get(&local.uuid).unwrap().unwrap();
        assert_eq!(book.label, "js");
        assert_eq!(book.usn, 5);
        assert!(book.dirty);

        let conflicts = conflicts_books(conn);
        let notes = SqliteNoteRepository::new(conn).list_by_book(&conflicts[0].uuid).unwrap();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].body.contains("<<<<<<< Local\njs\n=======\necmascript\n>>>>>>> Server\n"));
    }

    #[test]
    fn dirty_book_survives_server_deletion() {
        let db = setup();
        let conn = db.connection();
        let local = seed_book(conn, "js", 2, true);
        let server = BookSnapshot {
            deleted: true,
            ..book_snapshot(local.uuid, 5, "js")
        };

        assert_eq!(merge_book(conn, &server).unwrap(), MergeOutcome::Conflicted);

        let book = SqliteBookRepository::new(conn).get(&local.uuid).unwrap().unwrap();
        assert!(!book.deleted);
        assert!(book.dirty);
        assert_eq!(book.usn, 5);
    }

    #[test]
    fn merge_stats_count_every_entity() {
        let db = setup();
        let conn = db.connection();
        let book = seed_book(conn, "js", 1, false);
        let clean = seed_note(conn, &book, "a", 2, false);
        let dirty = seed_note(conn, &book, "b", 3, true);

        let mut fragment = crate::sync::test_support::ScriptedClient::fragment(10, 100);
        fragment.notes.push(note_snapshot(clean.uuid, book.uuid, 9, "a2"));
        fragment.notes.push(note_snapshot(dirty.uuid, book.uuid, 10, "b2"));
        fragment.notes.push(note_snapshot(NoteId::new(), book.uuid, 8, "c"));
        let list = crate::sync::build_sync_list(&[fragment]);

        let stats = merge_notes(conn, &list).unwrap();

        assert_eq!(
            stats,
            MergeStats {
                inserted: 1,
                took_server: 1,
                conflicted: 1,
                skipped: 0,
            }
        );
        assert_eq!(stats.changed(), 3);
    }
}
