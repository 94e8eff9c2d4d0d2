/*! This module defines traits for interacting with the application's SQLite
database and the function that sets up the application's tables. */

use rusqlite::{Connection, Row, Transaction as SqlTransaction};

use crate::{
    Error,
    stores::sqlite::{
        SQLiteCategoryStore, SQLiteExpenseStore, SQLitePersonStore, create_expense_category_table,
    },
};

/// A trait for adding a store's schema to a database.
pub trait CreateTable {
    /// Create the table(s) for the store.
    ///
    /// # Errors
    /// Returns an error if there is an SQL error.
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error>;
}

/// A trait for mapping from a `rusqlite::Row` from a SQLite database to a concrete rust type.
pub trait MapRow {
    /// The type that rows are mapped to.
    type ReturnType;

    /// Convert a row into a concrete type.
    ///
    /// **Note:** This function expects that the row object contains all the table columns in the order they were defined.
    ///
    /// # Errors
    /// Returns an error if a row item cannot be converted into the corresponding rust type, or if an invalid column index was used.
    fn map_row(row: &Row) -> Result<Self::ReturnType, rusqlite::Error> {
        Self::map_row_with_offset(row, 0)
    }

    /// Convert a row into a concrete type.
    ///
    /// The `offset` indicates which column the row should be read from.
    /// This is useful in cases where tables have been joined and you want to construct two different types from the one query.
    ///
    /// **Note:** This function expects that the row object contains all the table columns in the order they were defined.
    ///
    /// # Errors
    /// Returns an error if a row item cannot be converted into the corresponding rust type, or if an invalid column index was used.
    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error>;
}

/// Create the application tables in the database and turn on foreign key
/// enforcement for `connection`.
///
/// # Errors
/// Returns an error if the tables could not be created or if there is some
/// other SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Foreign key enforcement is per connection and the pragma is a no-op
    // inside a transaction, so it must run before one is opened.
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    SQLitePersonStore::create_table(&transaction)?;
    SQLiteCategoryStore::create_table(&transaction)?;
    SQLiteExpenseStore::create_table(&transaction)?;
    create_expense_category_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod db_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_creates_tables() {
        let connection = Connection::open_in_memory().expect("could not open database connection");

        initialize(&connection).expect("could not initialize database");

        let table_count: usize = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' \
                AND name IN ('person', 'category', 'expense', 'expense_category')",
                [],
                |row| row.get(0),
            )
            .expect("could not count tables");

        assert_eq!(table_count, 4);
    }

    #[test]
    fn initialize_enables_foreign_keys() {
        let connection = Connection::open_in_memory().expect("could not open database connection");

        initialize(&connection).expect("could not initialize database");

        let foreign_keys_enabled: bool = connection
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .expect("could not read foreign_keys pragma");

        assert!(foreign_keys_enabled);
    }

    #[test]
    fn initialize_succeeds_on_existing_database() {
        let connection = Connection::open_in_memory().expect("could not open database connection");

        initialize(&connection).expect("could not initialize database");
        initialize(&connection).expect("could not initialize database a second time");
    }
}
