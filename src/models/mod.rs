//! This module defines the domain data types.

pub use category::{Category, CategoryName, CategoryRef};
pub use expense::{Amount, Description, Expense, ExpenseDetails, NewExpense, Notes};
pub use person::{Person, PersonName, PersonRef};

mod category;
mod expense;
mod person;

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseID = i64;

/// Database identifier for a person.
pub type PersonId = DatabaseID;

/// Database identifier for a category.
pub type CategoryId = DatabaseID;

/// Database identifier for an expense.
pub type ExpenseId = DatabaseID;

/// The maximum number of characters allowed in person and category names.
pub const MAX_NAME_LENGTH: usize = 100;

/// The maximum number of characters allowed in expense descriptions.
pub const MAX_DESCRIPTION_LENGTH: usize = 100;

/// The maximum number of characters allowed in expense notes.
pub const MAX_NOTES_LENGTH: usize = 500;
