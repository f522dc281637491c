//! Book model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Label of the system-managed book that receives unresolved conflicts
pub const CONFLICTS_BOOK_LABEL: &str = "conflicts";

/// Labels users may not give to their own books
pub const RESERVED_BOOK_LABELS: [&str; 2] = ["trash", CONFLICTS_BOOK_LABEL];

/// A unique identifier for a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BookId(Uuid);

impl BookId {
    /// Create a new unique book ID using UUID v7
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

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BookId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A book groups notes under a unique label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier
    pub uuid: BookId,
    /// Human name, unique among live books
    pub label: String,
    /// Server update sequence number, 0 until first synced
    pub usn: i64,
    /// Tombstone flag
    pub deleted: bool,
    /// Modified locally since the last acknowledged sync
    pub dirty: bool,
}

impl Book {
    /// Create a new, never-synced book
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            uuid: BookId::new(),
            label: label.into(),
            usn: 0,
            deleted: false,
            dirty: true,
        }
    }
}

/// Validate a label typed by the user.
///
/// The sync engine bypasses this check: it is the only writer allowed to
/// create the `conflicts` book.
pub fn validate_book_label(label: &str) -> Result<()> {
    if label.is_empty() {
        return Err(Error::InvalidInput("book label cannot be empty".into()));
    }
    if label.chars().any(char::is_whitespace) {
        return Err(Error::InvalidInput(format!(
            "book label '{label}' cannot contain spaces"
        )));
    }
    if label.parse::<i64>().is_ok() {
        return Err(Error::InvalidInput(format!(
            "book label '{label}' cannot be a number"
        )));
    }
    if RESERVED_BOOK_LABELS.contains(&label) {
        return Err(Error::InvalidInput(format!(
            "book label '{label}' is reserved"
        )));
    }
    Ok(())
}
