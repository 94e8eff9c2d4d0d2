//! Defines the expense store trait.

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    models::{CategoryId, ExpenseDetails, ExpenseId, NewExpense, PersonId},
};

/// Handles the creation, retrieval, and deletion of expenses and the links
/// between expenses and categories.
pub trait ExpenseStore {
    /// Create a new expense in the store and link it to the categories named
    /// by `new_expense`.
    ///
    /// The expense and its links are written together or not at all.
    fn create(&mut self, new_expense: NewExpense) -> Result<ExpenseDetails, Error>;

    /// Overwrite the expense `id` with `new_expense`.
    ///
    /// The expense's links are replaced with the category set named by
    /// `new_expense`, and its updated time is set.
    fn update(&mut self, id: ExpenseId, new_expense: NewExpense) -> Result<ExpenseDetails, Error>;

    /// Remove the expense `id` and its category links from the store.
    fn delete(&mut self, id: ExpenseId) -> Result<(), Error>;

    /// Retrieve an expense from the store with its person and categories
    /// resolved.
    fn get(&self, id: ExpenseId) -> Result<ExpenseDetails, Error>;

    /// Retrieve expenses from the store in the way defined by `query`.
    fn get_query(&self, query: ExpenseQuery) -> Result<Vec<ExpenseDetails>, Error>;

    /// Count the expenses attributed to the person `person_id`.
    ///
    /// Returns zero for a person with no expenses or an unknown person ID.
    fn count_by_person(&self, person_id: PersonId) -> Result<usize, Error>;

    /// Count the expenses tagged with the category `category_id`.
    ///
    /// Returns zero for a category with no expenses or an unknown category ID.
    fn count_by_category(&self, category_id: CategoryId) -> Result<usize, Error>;
}

/// Defines how expenses should be fetched from [ExpenseStore::get_query].
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseQuery {
    /// Include only expenses attributed to this person.
    pub person_id: Option<PersonId>,
    /// Include only expenses tagged with this category.
    pub category_id: Option<CategoryId>,
    /// The order to sort expenses by date.
    pub sort_date: SortOrder,
}

/// The order to sort expenses in an [ExpenseQuery].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Sort in order of increasing date.
    Ascending,
    /// Sort in order of decreasing date, i.e. most recent first.
    #[default]
    Descending,
}
