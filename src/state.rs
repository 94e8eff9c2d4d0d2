//! Implements a struct that holds the state of the expense tracking service.

use std::{
    marker::{Send, Sync},
    sync::{Arc, Mutex},
};

use rusqlite::Connection;

use crate::stores::{CategoryStore, ExpenseStore, PersonStore, ReportStore};

/// The state of the expense tracking service.
#[derive(Debug, Clone)]
pub struct AppState<C, E, P, R>
where
    C: CategoryStore + Send + Sync,
    E: ExpenseStore + Send + Sync,
    P: PersonStore + Send + Sync,
    R: ReportStore + Send + Sync,
{
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The store for managing expense [categories](crate::models::Category).
    pub category_store: C,
    /// The store for managing [expenses](crate::models::Expense) and their
    /// category links.
    pub expense_store: E,
    /// The store for managing [people](crate::models::Person).
    pub person_store: P,
    /// The store for producing summary reports.
    pub report_store: R,
}

impl<C, E, P, R> AppState<C, E, P, R>
where
    C: CategoryStore + Send + Sync,
    E: ExpenseStore + Send + Sync,
    P: PersonStore + Send + Sync,
    R: ReportStore + Send + Sync,
{
    /// Create a new [AppState].
    pub fn new(
        db_connection: Arc<Mutex<Connection>>,
        category_store: C,
        expense_store: E,
        person_store: P,
        report_store: R,
    ) -> Self {
        Self {
            db_connection,
            category_store,
            expense_store,
            person_store,
            report_store,
        }
    }
}
