//! Contains the SQLite backed store implementations and a convenience type
//! alias and function for [AppState] that uses them.

mod category;
mod expense;
mod expense_category;
mod person;
mod report;

pub use category::SQLiteCategoryStore;
pub use expense::SQLiteExpenseStore;
pub use expense_category::{
    create_expense_category_table, remove_expense_categories, replace_expense_categories,
};
pub use person::SQLitePersonStore;
pub use report::SQLiteReportStore;

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{AppState, Error, db::initialize};

/// An alias for an [AppState] that uses SQLite for the backend.
pub type SQLAppState =
    AppState<SQLiteCategoryStore, SQLiteExpenseStore, SQLitePersonStore, SQLiteReportStore>;

/// Creates an [AppState] instance that uses SQLite for the backend.
///
/// This function will modify the database by adding the tables for the domain
/// models to the database.
pub fn create_app_state(db_connection: Connection) -> Result<SQLAppState, Error> {
    initialize(&db_connection)?;

    let connection = Arc::new(Mutex::new(db_connection));
    let category_store = SQLiteCategoryStore::new(connection.clone());
    let expense_store = SQLiteExpenseStore::new(connection.clone());
    let person_store = SQLitePersonStore::new(connection.clone());
    let report_store = SQLiteReportStore::new(connection.clone());

    Ok(AppState::new(
        connection,
        category_store,
        expense_store,
        person_store,
        report_store,
    ))
}
