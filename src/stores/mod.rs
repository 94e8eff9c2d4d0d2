//! Contains traits and implementations for objects that store the domain [models](crate::models).

mod category;
mod expense;
mod person;
mod report;

pub mod sqlite;

pub use category::CategoryStore;
pub use expense::{ExpenseQuery, ExpenseStore, SortOrder};
pub use person::PersonStore;
pub use report::{BreakdownEntry, CategorySummary, GlobalSummary, PersonSummary, ReportStore};
