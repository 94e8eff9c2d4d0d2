//! Expenseur is a library for tracking personal expenses attributed to people
//! and tagged with one or more categories.
//!
//! This crate provides the relational core behind such a tracker: stores for
//! people, categories, and expenses, atomic maintenance of the many-to-many
//! expense-category links, filterable expense queries, and summary reports
//! (per-category, per-person, most-used categories, global totals). A routing
//! or UI layer is expected to sit on top of [AppState] and map [Error] values
//! to its own responses.

#![warn(missing_docs)]

pub mod db;
pub mod models;
pub mod state;
pub mod stores;

pub use db::initialize as initialize_db;
pub use state::AppState;

use rusqlite::ErrorCode;

use crate::models::CategoryId;

/// The errors that may occur in the expense tracking core.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The person ID used to create or update an expense did not match a
    /// valid person.
    #[error("the person ID does not refer to a valid person")]
    PersonNotFound,

    /// One or more category IDs used to create or update an expense did not
    /// match valid categories.
    ///
    /// Carries every offending ID in ascending order, not just the first one
    /// found.
    #[error("the category IDs {0:?} do not refer to valid categories")]
    CategoryNotFound(Vec<CategoryId>),

    /// An expense mutation supplied zero category IDs.
    ///
    /// Every expense must be linked to at least one category, so an empty
    /// category set is rejected before anything is written.
    #[error("an expense must have at least one category")]
    EmptyCategorySet,

    /// A zero or negative amount was used to create or update an expense.
    #[error("expense amounts must be greater than zero")]
    InvalidAmount,

    /// An empty string was used to create a person name.
    #[error("person name cannot be empty")]
    EmptyPersonName,

    /// An empty string was used to create a category name.
    #[error("category name cannot be empty")]
    EmptyCategoryName,

    /// An empty string was used to create an expense description.
    #[error("expense description cannot be empty")]
    EmptyDescription,

    /// A person or category name exceeded the maximum length.
    #[error(
        "names cannot be longer than {} characters",
        crate::models::MAX_NAME_LENGTH
    )]
    NameTooLong,

    /// An expense description exceeded the maximum length.
    #[error(
        "descriptions cannot be longer than {} characters",
        crate::models::MAX_DESCRIPTION_LENGTH
    )]
    DescriptionTooLong,

    /// An expense's notes exceeded the maximum length.
    #[error(
        "notes cannot be longer than {} characters",
        crate::models::MAX_NOTES_LENGTH
    )]
    NotesTooLong,

    /// Tried to delete a person that still owns expenses.
    #[error("the person still owns expenses and cannot be deleted")]
    PersonInUse,

    /// Tried to delete a category that is still linked to expenses.
    #[error("the category is still linked to expenses and cannot be deleted")]
    CategoryInUse,

    /// The store detected a conflicting concurrent write.
    ///
    /// The caller may retry the mutation; the core never retries on its own.
    #[error("the store detected a conflicting concurrent write")]
    ConcurrencyConflict,

    /// The underlying database could not be reached or opened.
    ///
    /// Surfaced immediately without retrying.
    #[error("the underlying database could not be reached")]
    StoreUnavailable,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            rusqlite::Error::SqliteFailure(sql_error, _)
                if matches!(
                    sql_error.code,
                    ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
                ) =>
            {
                Error::ConcurrencyConflict
            }
            rusqlite::Error::SqliteFailure(sql_error, _)
                if matches!(
                    sql_error.code,
                    ErrorCode::CannotOpen | ErrorCode::NotADatabase | ErrorCode::SystemIoFailure
                ) =>
            {
                Error::StoreUnavailable
            }
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}
