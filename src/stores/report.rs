//! Defines the report store trait and the summary types it produces.

use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    models::{CategoryId, CategoryName, PersonId, PersonName},
};

/// Produces summary reports over the expenses in the store.
pub trait ReportStore {
    /// Summarize expense usage for every category in the store, ordered by
    /// category name.
    ///
    /// Categories with no expenses are included with a count of zero.
    fn category_summary(&self) -> Result<Vec<CategorySummary>, Error>;

    /// Summarize the expenses owned by every person in the store, ordered by
    /// person name.
    ///
    /// People with no expenses are included with a count of zero.
    fn person_summary(&self) -> Result<Vec<PersonSummary>, Error>;

    /// Rank categories by how heavily they are used: most expenses first, then
    /// the highest total amount, then name.
    fn popular_categories(&self) -> Result<Vec<CategorySummary>, Error>;

    /// Compute totals across every expense in the store, with per-name
    /// breakdowns for categories and people.
    ///
    /// Every category appears in the category breakdown, even with nothing
    /// spent against it; the person breakdown lists only people with
    /// expenses.
    fn global_summary(&self) -> Result<GlobalSummary, Error>;
}

/// How many expenses a category is used by, how much money they add up to,
/// and when the most recent one happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    /// The ID of the category.
    pub id: CategoryId,
    /// The name of the category.
    pub name: CategoryName,
    /// The number of expenses tagged with the category.
    pub expense_count: usize,
    /// The sum of the amounts of the expenses tagged with the category.
    pub total_amount: Decimal,
    /// The date of the most recent expense tagged with the category, if any.
    pub last_expense_date: Option<Date>,
}

/// How many expenses a person owns, how much money they add up to, and when
/// the most recent one happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonSummary {
    /// The ID of the person.
    pub id: PersonId,
    /// The name of the person.
    pub name: PersonName,
    /// The number of expenses attributed to the person.
    pub expense_count: usize,
    /// The sum of the amounts of the expenses attributed to the person.
    pub total_amount: Decimal,
    /// The date of the person's most recent expense, if any.
    pub last_expense_date: Option<Date>,
}

/// The total amount of money spent against a single name in a breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakdownEntry {
    /// The category or person name.
    pub name: String,
    /// The summed amount for the name.
    pub total_amount: Decimal,
}

/// Totals across every expense in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlobalSummary {
    /// The sum of every expense amount.
    pub total_expenses: Decimal,
    /// The number of expenses in the store.
    pub expense_count: usize,
    /// The total spent per category name, highest total first.
    pub category_breakdown: Vec<BreakdownEntry>,
    /// The total spent per person name, highest total first.
    pub person_breakdown: Vec<BreakdownEntry>,
}
