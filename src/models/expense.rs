//! This file defines the `Expense` type, the core type of the expense tracker,
//! and the types used to create and view expenses.

use std::fmt::Display;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    models::{
        CategoryId, CategoryRef, ExpenseId, MAX_DESCRIPTION_LENGTH, MAX_NOTES_LENGTH, PersonId,
        PersonRef,
    },
};

/// A positive amount of money, fixed to two decimal places.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
pub struct Amount(Decimal);

impl Amount {
    /// Create an amount.
    ///
    /// `value` is rounded half away from zero to two decimal places.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::InvalidAmount] if `value` is
    /// negative or rounds to zero.
    pub fn new(value: Decimal) -> Result<Self, Error> {
        let mut value = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        if value <= Decimal::ZERO {
            return Err(Error::InvalidAmount);
        }

        value.rescale(2);

        Ok(Self(value))
    }

    /// Create an amount without validation.
    ///
    /// The caller should ensure that the value is positive and has two decimal places.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the positive invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(value: Decimal) -> Self {
        Self(value)
    }

    /// The amount as a decimal number.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated, non-empty expense description.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Description(String);

impl Description {
    /// Create an expense description.
    ///
    /// Leading and trailing whitespace is removed.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyDescription] if `description`
    /// is an empty string, or an [Error::DescriptionTooLong] if `description`
    /// is longer than [MAX_DESCRIPTION_LENGTH] characters.
    pub fn new(description: &str) -> Result<Self, Error> {
        let description = description.trim();

        if description.is_empty() {
            Err(Error::EmptyDescription)
        } else if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            Err(Error::DescriptionTooLong)
        } else {
            Ok(Self(description.to_string()))
        }
    }

    /// Create an expense description without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the non-empty invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(description: &str) -> Self {
        Self(description.to_string())
    }
}

impl AsRef<str> for Description {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Description {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Free-form notes attached to an expense.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Notes(String);

impl Notes {
    /// Create expense notes.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::NotesTooLong] if `notes` is longer
    /// than [MAX_NOTES_LENGTH] characters.
    pub fn new(notes: &str) -> Result<Self, Error> {
        if notes.chars().count() > MAX_NOTES_LENGTH {
            Err(Error::NotesTooLong)
        } else {
            Ok(Self(notes.to_string()))
        }
    }

    /// Create expense notes without validation.
    pub fn new_unchecked(notes: &str) -> Self {
        Self(notes.to_string())
    }
}

impl AsRef<str> for Notes {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Notes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An expense, i.e. an event where money was spent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// What the expense was for.
    pub description: Description,
    /// The amount of money spent.
    pub amount: Amount,
    /// When the expense happened.
    pub date: Date,
    /// Free-form notes, if any.
    pub notes: Option<Notes>,
    /// The ID of the person the expense is attributed to.
    pub person_id: PersonId,
    /// When the expense was added.
    pub created_at: OffsetDateTime,
    /// When the expense was last changed, if ever.
    pub updated_at: Option<OffsetDateTime>,
}

/// The data needed to create an expense, or to overwrite an existing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExpense {
    /// What the expense was for.
    pub description: Description,
    /// The amount of money spent.
    pub amount: Amount,
    /// When the expense happened.
    pub date: Date,
    /// Free-form notes, if any.
    pub notes: Option<Notes>,
    /// The ID of the person the expense is attributed to.
    pub person_id: PersonId,
    /// The IDs of the categories the expense is tagged with.
    pub category_ids: Vec<CategoryId>,
}

/// An expense with its person and category set resolved.
///
/// The person and categories carry just their IDs and names, enough for a
/// caller to display the expense without further lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseDetails {
    /// The expense itself.
    pub expense: Expense,
    /// The person the expense is attributed to.
    pub person: PersonRef,
    /// The categories the expense is tagged with, in ascending ID order.
    pub categories: Vec<CategoryRef>,
}
