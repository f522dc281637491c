//! Local store for quill

mod actions;
mod book_repository;
mod connection;
mod migrations;
mod note_repository;
mod system_repository;

pub use actions::{replay_actions, Action, LoggedAction};
pub use book_repository::{BookRepository, SqliteBookRepository};
pub use connection::Database;
pub use note_repository::{NoteRepository, SqliteNoteRepository};
pub use system_repository::{
    SqliteSystemRepository, SystemRepository, LAST_MAX_USN_KEY, LAST_SYNC_TIME_KEY,
};

/// Read a UUID-backed id column, surfacing malformed values as conversion failures
pub(crate) fn parse_id<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = uuid::Error>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(error))
    })
}
