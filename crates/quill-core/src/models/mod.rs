//! Data models for quill

mod book;
mod note;

pub use book::{validate_book_label, Book, BookId, CONFLICTS_BOOK_LABEL, RESERVED_BOOK_LABELS};
pub use note::{Note, NoteId};
