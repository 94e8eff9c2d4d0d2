//! Implements a SQLite backed person store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{Person, PersonId, PersonName},
    stores::PersonStore,
};

/// Creates and retrieves people to/from a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLitePersonStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLitePersonStore {
    /// Create a new person store with a SQLite database.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl PersonStore for SQLitePersonStore {
    /// Create a person in the database.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error.
    fn create(&mut self, name: PersonName) -> Result<Person, Error> {
        let connection = self
            .connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::StoreUnavailable)?;

        let person = connection
            .prepare(
                "INSERT INTO person (name, created_at) VALUES (?1, ?2)
                 RETURNING id, name, created_at",
            )?
            .query_row((name.as_ref(), OffsetDateTime::now_utc()), Self::map_row)?;

        Ok(person)
    }

    /// Retrieve the person in the database with `person_id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `person_id` does not refer to a valid person,
    /// - [Error::SqlError] if there is some other SQL error.
    fn get(&self, person_id: PersonId) -> Result<Person, Error> {
        self.connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::StoreUnavailable)?
            .prepare("SELECT id, name, created_at FROM person WHERE id = :id;")?
            .query_row(&[(":id", &person_id)], Self::map_row)
            .map_err(|error| error.into())
    }

    /// Retrieve all people in the database, ordered alphabetically by name.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error.
    fn get_all(&self) -> Result<Vec<Person>, Error> {
        self.connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::StoreUnavailable)?
            .prepare("SELECT id, name, created_at FROM person ORDER BY name ASC;")?
            .query_map([], Self::map_row)?
            .map(|maybe_person| maybe_person.map_err(|error| error.into()))
            .collect()
    }

    /// Remove the person with `person_id` from the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::PersonInUse] if expenses are still attributed to the person,
    /// - [Error::NotFound] if `person_id` does not refer to a valid person,
    /// - [Error::SqlError] if there is some other SQL error.
    fn delete(&mut self, person_id: PersonId) -> Result<(), Error> {
        let connection = self
            .connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::StoreUnavailable)?;

        let expense_count: usize = connection.query_row(
            "SELECT COUNT(id) FROM expense WHERE person_id = ?1",
            [person_id],
            |row| row.get(0),
        )?;

        if expense_count > 0 {
            return Err(Error::PersonInUse);
        }

        let rows_affected = connection
            .execute("DELETE FROM person WHERE id = ?1", [person_id])
            .map_err(|error| match error {
                // Code 787 occurs when a FOREIGN KEY constraint failed.
                rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 787 => {
                    Error::PersonInUse
                }
                error => error.into(),
            })?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }
}

impl CreateTable for SQLitePersonStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS person (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL
            );",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLitePersonStore {
    type ReturnType = Person;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let id = row.get(offset)?;

        let raw_name: String = row.get(offset + 1)?;
        let name = PersonName::new_unchecked(&raw_name);

        let created_at = row.get(offset + 2)?;

        Ok(Self::ReturnType {
            id,
            name,
            created_at,
        })
    }
}
