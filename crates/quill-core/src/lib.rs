//! quill-core - Core library for quill
//!
//! This crate contains the note/book models, the local `SQLite` store and the
//! USN-based sync engine used by the `quill` command-line client.

pub mod db;
pub mod error;
pub mod models;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Book, BookId, Note, NoteId};
