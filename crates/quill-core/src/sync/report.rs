//! Conflict reports written into note bodies
//!
//! Reports use Git-style markers so a conflicted note reads like a merge
//! conflict:
//!
//! ```text
//! <<<<<<< Local
//! <local-only lines>
//! =======
//! <server-only lines>
//! >>>>>>> Server
//! <shared trailing lines>
//! ```

use std::borrow::Cow;

use rusqlite::Connection;
use similar::{ChangeTag, TextDiff};

use crate::db::{BookRepository, SqliteBookRepository};
use crate::error::Result;
use crate::models::{Book, BookId, CONFLICTS_BOOK_LABEL};

pub const CONFLICT_START: &str = "<<<<<<< Local\n";
pub const CONFLICT_MID: &str = "=======\n";
pub const CONFLICT_END: &str = ">>>>>>> Server\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    ShowingLocal,
    ShowingServer,
}

/// Terminate the last line so a missing final newline is not a difference
fn with_final_newline(body: &str) -> Cow<'_, str> {
    if body.is_empty() || body.ends_with('\n') {
        Cow::Borrowed(body)
    } else {
        Cow::Owned(format!("{body}\n"))
    }
}

/// Line-diff two bodies into runs of equal, local-only or server-only text
fn diff_chunks(local: &str, server: &str) -> Vec<(ChangeTag, String)> {
    let local = with_final_newline(local);
    let server = with_final_newline(server);
    let diff = TextDiff::from_lines(local.as_ref(), server.as_ref());
    let mut chunks: Vec<(ChangeTag, String)> = Vec::new();

    for change in diff.iter_all_changes() {
        match chunks.last_mut() {
            Some((tag, text)) if *tag == change.tag() => text.push_str(change.value()),
            _ => chunks.push((change.tag(), change.value().to_string())),
        }
    }

    chunks
}

fn push_chunk(out: &mut String, text: &str) {
    out.push_str(text);
    if !text.ends_with('\n') {
        out.push('\n');
    }
}

fn close_conflict(out: &mut String, mode: Mode) {
    match mode {
        Mode::Normal => {}
        Mode::ShowingLocal => {
            out.push_str(CONFLICT_MID);
            out.push_str(CONFLICT_END);
        }
        Mode::ShowingServer => out.push_str(CONFLICT_END),
    }
}

/// Merge two divergent bodies into one text with conflict markers around
/// every region where they differ. Identical bodies come back unmarked.
pub fn report_body_conflict(local_body: &str, server_body: &str) -> String {
    let mut out = String::new();
    let mut mode = Mode::Normal;

    for (tag, text) in diff_chunks(local_body, server_body) {
        match (tag, mode) {
            (ChangeTag::Equal, _) => {
                close_conflict(&mut out, mode);
                mode = Mode::Normal;
            }
            (ChangeTag::Delete, Mode::Normal) => {
                out.push_str(CONFLICT_START);
                mode = Mode::ShowingLocal;
            }
            (ChangeTag::Delete, Mode::ShowingServer) => {
                out.push_str(CONFLICT_END);
                out.push_str(CONFLICT_START);
                mode = Mode::ShowingLocal;
            }
            (ChangeTag::Insert, Mode::Normal) => {
                out.push_str(CONFLICT_START);
                out.push_str(CONFLICT_MID);
                mode = Mode::ShowingServer;
            }
            (ChangeTag::Insert, Mode::ShowingLocal) => {
                out.push_str(CONFLICT_MID);
                mode = Mode::ShowingServer;
            }
            (ChangeTag::Delete, Mode::ShowingLocal) | (ChangeTag::Insert, Mode::ShowingServer) => {}
        }
        push_chunk(&mut out, &text);
    }

    // No trailing equal span closes the last conflict for us
    close_conflict(&mut out, mode);
    out
}

/// Prefix a note body with a report of the two books it was moved to
pub fn report_book_conflict(local_book_label: &str, server_book_label: &str, body: &str) -> String {
    format!(
        "{CONFLICT_START}Moved to the book {local_book_label}\n{CONFLICT_MID}Moved to the book {server_book_label}\n{CONFLICT_END}\n{body}"
    )
}

/// Body of the note recording a book renamed differently on both sides
pub fn report_label_conflict(book: &BookId, local_label: &str, server_label: &str) -> String {
    format!(
        "Book {book} was renamed on both sides\n\n{}",
        report_body_conflict(local_label, server_label)
    )
}

/// Find the live `conflicts` book or create it as a never-synced, dirty book
pub fn get_or_create_conflicts_book(conn: &Connection) -> Result<BookId> {
    let books = SqliteBookRepository::new(conn);
    if let Some(book) = books.find_live_by_label(CONFLICTS_BOOK_LABEL)? {
        return Ok(book.uuid);
    }

    let book = Book::new(CONFLICTS_BOOK_LABEL);
    books.insert(&book)?;
    tracing::info!("Created '{CONFLICTS_BOOK_LABEL}' book {}", book.uuid);
    Ok(book.uuid)
}
