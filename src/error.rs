//! Errors and status values reported by tree operations.

use thiserror::Error;

/// The outcome of a tree operation, flattened to a single status value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// The operation succeeded.
    Ok,
    /// An equal record was already stored. Nothing was modified.
    Duplicate,
    /// No stored record matched the key.
    NotFound,
    /// The operation could not complete, e.g. an allocation failed.
    Error,
}

impl Status {
    /// The status of an [`insert`][crate::Tree::insert] call.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_index::{Status, Tree};
    ///
    /// let mut tree = Tree::ordered();
    ///
    /// assert_eq!(Status::of_insert(&tree.insert(1)), Status::Ok);
    /// assert_eq!(Status::of_insert(&tree.insert(1)), Status::Duplicate);
    /// ```
    pub fn of_insert<T>(result: &Result<(), InsertError<T>>) -> Self {
        match result {
            Ok(()) => Self::Ok,
            Err(e) => e.status(),
        }
    }
}

/// Why an insertion was rejected. The rejected record is always handed back so that the caller
/// keeps ownership of it.
#[derive(Debug, Error)]
pub enum InsertError<T> {
    /// The comparator found an existing record equal to this one. The stored record is kept.
    #[error("an equal record is already stored in the tree")]
    Duplicate(T),
    /// A node for the record could not be allocated. The tree is unchanged.
    #[error("failed to allocate a tree node")]
    OutOfMemory(T),
}

impl<T> InsertError<T> {
    /// Returns the record that was not inserted.
    pub fn into_record(self) -> T {
        match self {
            Self::Duplicate(record) | Self::OutOfMemory(record) => record,
        }
    }

    /// The [`Status`] this error corresponds to.
    pub fn status(&self) -> Status {
        match self {
            Self::Duplicate(_) => Status::Duplicate,
            Self::OutOfMemory(_) => Status::Error,
        }
    }
}

impl<T> From<InsertError<T>> for Status {
    fn from(e: InsertError<T>) -> Self {
        e.status()
    }
}

/// A lookup found no record matching the key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[error("no record matching the key is stored in the tree")]
pub struct NotFound;

impl From<NotFound> for Status {
    fn from(_: NotFound) -> Self {
        Self::NotFound
    }
}
