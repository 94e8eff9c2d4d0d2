//! Expense-category junction table operations.
//!
//! This module handles the many-to-many relationship between expenses and
//! categories. Link rows are only ever written as a side effect of expense
//! create/update/delete, so the write functions here expect to run inside the
//! caller's transaction alongside the expense write itself.

use rusqlite::Connection;

use crate::{
    Error,
    models::{CategoryId, ExpenseId},
};

/// Create the expense_category junction table in the database.
///
/// A link row has no identity of its own beyond the expense and category it
/// joins, so the pair is the primary key.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expense_category (
            expense_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            PRIMARY KEY(expense_id, category_id),
            FOREIGN KEY(expense_id) REFERENCES expense(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE RESTRICT
        );

        CREATE INDEX IF NOT EXISTS idx_expense_category_category_id
            ON expense_category(category_id);",
    )?;

    Ok(())
}

/// Replace all category links for an expense with `category_ids`.
///
/// Callers are expected to run this inside a transaction together with the
/// expense write so that readers never observe a partially linked expense.
///
/// # Errors
/// This function will return a:
/// - [Error::CategoryNotFound] if a category ID does not refer to a valid category,
/// - [Error::SqlError] if there is some other SQL error.
pub fn replace_expense_categories(
    expense_id: ExpenseId,
    category_ids: &[CategoryId],
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "DELETE FROM expense_category WHERE expense_id = ?1",
        [expense_id],
    )?;

    let mut statement = connection
        .prepare("INSERT INTO expense_category (expense_id, category_id) VALUES (?1, ?2)")?;

    for &category_id in category_ids {
        statement
            .execute((expense_id, category_id))
            .map_err(|error| match error {
                // Code 787 occurs when a FOREIGN KEY constraint failed.
                rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 787 => {
                    Error::CategoryNotFound(vec![category_id])
                }
                error => error.into(),
            })?;
    }

    Ok(())
}

/// Remove all category links for an expense.
///
/// Removing links for an expense that has none is not an error.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn remove_expense_categories(
    expense_id: ExpenseId,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "DELETE FROM expense_category WHERE expense_id = ?1",
        [expense_id],
    )?;

    Ok(())
}
