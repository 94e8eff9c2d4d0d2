//! Implements a SQLite backed category store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{Category, CategoryId, CategoryName},
    stores::CategoryStore,
};

/// Creates and retrieves expense categories to/from a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteCategoryStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteCategoryStore {
    /// Create a new category store with a SQLite database.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl CategoryStore for SQLiteCategoryStore {
    /// Create a category in the database.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error.
    fn create(&mut self, name: CategoryName) -> Result<Category, Error> {
        let connection = self
            .connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::StoreUnavailable)?;

        let category = connection
            .prepare(
                "INSERT INTO category (name, created_at) VALUES (?1, ?2)
                 RETURNING id, name, created_at",
            )?
            .query_row((name.as_ref(), OffsetDateTime::now_utc()), Self::map_row)?;

        Ok(category)
    }

    /// Retrieve the category in the database with `category_id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `category_id` does not refer to a valid category,
    /// - [Error::SqlError] if there is some other SQL error.
    fn get(&self, category_id: CategoryId) -> Result<Category, Error> {
        self.connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::StoreUnavailable)?
            .prepare("SELECT id, name, created_at FROM category WHERE id = :id;")?
            .query_row(&[(":id", &category_id)], Self::map_row)
            .map_err(|error| error.into())
    }

    /// Retrieve all categories in the database, ordered alphabetically by name.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error.
    fn get_all(&self) -> Result<Vec<Category>, Error> {
        self.connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::StoreUnavailable)?
            .prepare("SELECT id, name, created_at FROM category ORDER BY name ASC;")?
            .query_map([], Self::map_row)?
            .map(|maybe_category| maybe_category.map_err(|error| error.into()))
            .collect()
    }

    /// Remove the category with `category_id` from the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::CategoryInUse] if expenses are still tagged with the category,
    /// - [Error::NotFound] if `category_id` does not refer to a valid category,
    /// - [Error::SqlError] if there is some other SQL error.
    fn delete(&mut self, category_id: CategoryId) -> Result<(), Error> {
        let connection = self
            .connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::StoreUnavailable)?;

        let link_count: usize = connection.query_row(
            "SELECT COUNT(*) FROM expense_category WHERE category_id = ?1",
            [category_id],
            |row| row.get(0),
        )?;

        if link_count > 0 {
            return Err(Error::CategoryInUse);
        }

        let rows_affected = connection
            .execute("DELETE FROM category WHERE id = ?1", [category_id])
            .map_err(|error| match error {
                // Code 787 occurs when a FOREIGN KEY constraint failed.
                rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 787 => {
                    Error::CategoryInUse
                }
                error => error.into(),
            })?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }
}

impl CreateTable for SQLiteCategoryStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS category (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL
            );",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteCategoryStore {
    type ReturnType = Category;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let id = row.get(offset)?;

        let raw_name: String = row.get(offset + 1)?;
        let name = CategoryName::new_unchecked(&raw_name);

        let created_at = row.get(offset + 2)?;

        Ok(Self::ReturnType {
            id,
            name,
            created_at,
        })
    }
}

#[cfg(test)]
mod category_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        models::{Amount, CategoryName, Description, NewExpense, PersonName},
        stores::{
            CategoryStore, ExpenseStore, PersonStore,
            sqlite::{SQLAppState, create_app_state},
        },
    };

    use super::SQLiteCategoryStore;

    fn get_test_store() -> SQLiteCategoryStore {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let connection = Arc::new(Mutex::new(connection));

        SQLiteCategoryStore::new(connection.clone())
    }

    fn get_app_state() -> SQLAppState {
        let connection = Connection::open_in_memory().unwrap();
        create_app_state(connection).unwrap()
    }

    #[test]
    fn create_category_succeeds() {
        let mut store = get_test_store();
        let name = CategoryName::new("Categorically a category").unwrap();

        let category = store.create(name.clone()).unwrap();

        assert!(category.id > 0);
        assert_eq!(category.name, name);
    }

    #[test]
    fn get_category_succeeds() {
        let mut store = get_test_store();
        let name = CategoryName::new_unchecked("Foo");
        let inserted_category = store.create(name).unwrap();

        let selected_category = store.get(inserted_category.id);

        assert_eq!(Ok(inserted_category), selected_category);
    }

    #[test]
    fn get_category_with_invalid_id_returns_not_found() {
        let mut store = get_test_store();
        let inserted_category = store.create(CategoryName::new_unchecked("Foo")).unwrap();

        let selected_category = store.get(inserted_category.id + 123);

        assert_eq!(selected_category, Err(Error::NotFound));
    }

    #[test]
    fn get_all_categories_sorted_by_name() {
        let mut store = get_test_store();

        let office = store.create(CategoryName::new_unchecked("Office")).unwrap();
        let home = store
            .create(CategoryName::new_unchecked("Home Expenses"))
            .unwrap();

        let categories = store.get_all().unwrap();

        assert_eq!(categories, vec![home, office]);
    }

    #[test]
    fn delete_category_succeeds() {
        let mut store = get_test_store();
        let category = store.create(CategoryName::new_unchecked("Office")).unwrap();

        let result = store.delete(category.id);

        assert_eq!(result, Ok(()));
        assert_eq!(store.get(category.id), Err(Error::NotFound));
    }

    #[test]
    fn delete_category_with_invalid_id_returns_not_found() {
        let mut store = get_test_store();

        let result = store.delete(999);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn delete_category_in_use_fails() {
        let mut state = get_app_state();
        let person = state
            .person_store
            .create(PersonName::new_unchecked("Anton"))
            .expect("Could not create test person");
        let category = state
            .category_store
            .create(CategoryName::new_unchecked("Office"))
            .expect("Could not create test category");
        state
            .expense_store
            .create(NewExpense {
                description: Description::new_unchecked("Lunch"),
                amount: Amount::new(dec!(25.50)).unwrap(),
                date: date!(2024 - 01 - 01),
                notes: None,
                person_id: person.id,
                category_ids: vec![category.id],
            })
            .expect("Could not create test expense");

        let result = state.category_store.delete(category.id);

        assert_eq!(result, Err(Error::CategoryInUse));
        // The category row must survive the failed delete.
        assert_eq!(state.category_store.get(category.id), Ok(category));
    }
}
