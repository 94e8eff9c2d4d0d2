//! The SQLite backed implementation of the expense store.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use rusqlite::{Connection, Row, params_from_iter, types::Value};
use rust_decimal::Decimal;
use time::OffsetDateTime;

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{
        Amount, CategoryId, CategoryName, CategoryRef, Description, Expense, ExpenseDetails,
        ExpenseId, NewExpense, Notes, PersonId, PersonName, PersonRef,
    },
    stores::{
        ExpenseQuery, ExpenseStore, SortOrder,
        sqlite::{remove_expense_categories, replace_expense_categories},
    },
};

/// Creates, updates and retrieves expenses to/from a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteExpenseStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteExpenseStore {
    /// Create a new expense store with a SQLite database.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl ExpenseStore for SQLiteExpenseStore {
    /// Create an expense in the database and link it to its categories.
    ///
    /// The expense row and its links are written in one transaction.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::EmptyCategorySet] if `new_expense` names no categories,
    /// - [Error::PersonNotFound] if `new_expense.person_id` does not refer to a
    ///   valid person,
    /// - [Error::CategoryNotFound] if any of `new_expense.category_ids` do not
    ///   refer to valid categories,
    /// - [Error::SqlError] if there is some other SQL error.
    fn create(&mut self, new_expense: NewExpense) -> Result<ExpenseDetails, Error> {
        let connection = self
            .connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::StoreUnavailable)?;

        let transaction = connection.unchecked_transaction()?;

        let category_ids = validate_draft(&new_expense, &transaction)?;

        let expense_id = transaction.query_row(
            "INSERT INTO expense (description, amount, date, notes, person_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id",
            (
                new_expense.description.as_ref(),
                new_expense.amount.to_string(),
                new_expense.date,
                new_expense.notes.as_ref().map(|notes| notes.as_ref()),
                new_expense.person_id,
                OffsetDateTime::now_utc(),
            ),
            |row| row.get(0),
        )?;

        replace_expense_categories(expense_id, &category_ids, &transaction)?;

        let details = get_expense_details(expense_id, &transaction)?;

        transaction.commit()?;

        Ok(details)
    }

    /// Overwrite the expense `id` with `new_expense` and replace its category
    /// links.
    ///
    /// The expense row and its links are written in one transaction, and the
    /// expense's updated time is set.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a valid expense,
    /// - [Error::EmptyCategorySet] if `new_expense` names no categories,
    /// - [Error::PersonNotFound] if `new_expense.person_id` does not refer to a
    ///   valid person,
    /// - [Error::CategoryNotFound] if any of `new_expense.category_ids` do not
    ///   refer to valid categories,
    /// - [Error::SqlError] if there is some other SQL error.
    fn update(&mut self, id: ExpenseId, new_expense: NewExpense) -> Result<ExpenseDetails, Error> {
        let connection = self
            .connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::StoreUnavailable)?;

        let transaction = connection.unchecked_transaction()?;

        // The existence check runs before draft validation so that an unknown
        // expense reports not found rather than a validation error.
        let expense_exists: bool = transaction.query_row(
            "SELECT EXISTS (SELECT 1 FROM expense WHERE id = ?1)",
            [id],
            |row| row.get(0),
        )?;

        if !expense_exists {
            return Err(Error::NotFound);
        }

        let category_ids = validate_draft(&new_expense, &transaction)?;

        transaction.execute(
            "UPDATE expense
             SET description = ?1, amount = ?2, date = ?3, notes = ?4, person_id = ?5,
                 updated_at = ?6
             WHERE id = ?7",
            (
                new_expense.description.as_ref(),
                new_expense.amount.to_string(),
                new_expense.date,
                new_expense.notes.as_ref().map(|notes| notes.as_ref()),
                new_expense.person_id,
                OffsetDateTime::now_utc(),
                id,
            ),
        )?;

        replace_expense_categories(id, &category_ids, &transaction)?;

        let details = get_expense_details(id, &transaction)?;

        transaction.commit()?;

        Ok(details)
    }

    /// Remove the expense with `id` and its category links from the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a valid expense,
    /// - [Error::SqlError] if there is some other SQL error.
    fn delete(&mut self, id: ExpenseId) -> Result<(), Error> {
        let connection = self
            .connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::StoreUnavailable)?;

        let transaction = connection.unchecked_transaction()?;

        remove_expense_categories(id, &transaction)?;

        let rows_affected = transaction.execute("DELETE FROM expense WHERE id = ?1", [id])?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        transaction.commit()?;

        Ok(())
    }

    /// Retrieve the expense with `id` along with its person and categories.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a valid expense,
    /// - [Error::SqlError] if there is some other SQL error.
    fn get(&self, id: ExpenseId) -> Result<ExpenseDetails, Error> {
        let connection = self
            .connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::StoreUnavailable)?;

        get_expense_details(id, &connection)
    }

    /// Retrieve the expenses selected by `query`, each with its person and
    /// categories.
    ///
    /// Expenses are sorted by date in the order `query` asks for, with
    /// expenses on the same date appearing in the order they were created.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is an SQL error.
    fn get_query(&self, query: ExpenseQuery) -> Result<Vec<ExpenseDetails>, Error> {
        let connection = self
            .connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::StoreUnavailable)?;

        query_expense_details(None, &query, &connection)
    }

    /// Count the expenses attributed to the person `person_id`.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is an SQL error.
    fn count_by_person(&self, person_id: PersonId) -> Result<usize, Error> {
        let count = self
            .connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::StoreUnavailable)?
            .query_row(
                "SELECT COUNT(id) FROM expense WHERE person_id = ?1",
                [person_id],
                |row| row.get(0),
            )?;

        Ok(count)
    }

    /// Count the expenses tagged with the category `category_id`.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is an SQL error.
    fn count_by_category(&self, category_id: CategoryId) -> Result<usize, Error> {
        let count = self
            .connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::StoreUnavailable)?
            .query_row(
                "SELECT COUNT(expense_id) FROM expense_category WHERE category_id = ?1",
                [category_id],
                |row| row.get(0),
            )?;

        Ok(count)
    }
}

/// Check that a draft expense refers to a valid person and valid categories.
///
/// Returns the draft's category IDs deduplicated and in ascending order.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyCategorySet] if the draft names no categories,
/// - [Error::PersonNotFound] if the draft's person does not exist,
/// - [Error::CategoryNotFound] listing the missing IDs in ascending order if
///   any of the draft's categories do not exist,
/// - [Error::SqlError] if there is some other SQL error.
fn validate_draft(new_expense: &NewExpense, connection: &Connection) -> Result<Vec<CategoryId>, Error> {
    let mut category_ids = new_expense.category_ids.clone();
    category_ids.sort_unstable();
    category_ids.dedup();

    if category_ids.is_empty() {
        return Err(Error::EmptyCategorySet);
    }

    let person_exists: bool = connection.query_row(
        "SELECT EXISTS (SELECT 1 FROM person WHERE id = ?1)",
        [new_expense.person_id],
        |row| row.get(0),
    )?;

    if !person_exists {
        return Err(Error::PersonNotFound);
    }

    let mut statement = connection.prepare("SELECT EXISTS (SELECT 1 FROM category WHERE id = ?1)")?;
    let mut missing_ids = Vec::new();

    for &category_id in &category_ids {
        let category_exists: bool = statement.query_row([category_id], |row| row.get(0))?;

        if !category_exists {
            missing_ids.push(category_id);
        }
    }

    if !missing_ids.is_empty() {
        return Err(Error::CategoryNotFound(missing_ids));
    }

    Ok(category_ids)
}

/// Retrieve a single expense with its person and categories resolved.
///
/// # Errors
/// This function will return an [Error::NotFound] if `expense_id` does not
/// refer to a valid expense, or an [Error::SqlError] if there is an SQL error.
fn get_expense_details(
    expense_id: ExpenseId,
    connection: &Connection,
) -> Result<ExpenseDetails, Error> {
    query_expense_details(Some(expense_id), &ExpenseQuery::default(), connection)?
        .pop()
        .ok_or(Error::NotFound)
}

/// Retrieve expenses joined with their person and categories.
///
/// The join produces one row per expense and category pair, so consecutive
/// rows for the same expense are folded into one [ExpenseDetails].
fn query_expense_details(
    expense_id: Option<ExpenseId>,
    filter: &ExpenseQuery,
    connection: &Connection,
) -> Result<Vec<ExpenseDetails>, Error> {
    let mut query_string_parts = vec![
        "SELECT e.id, e.description, e.amount, e.date, e.notes, e.person_id, e.created_at, \
         e.updated_at, p.id, p.name, c.id, c.name \
         FROM expense e \
         INNER JOIN person p ON p.id = e.person_id \
         INNER JOIN expense_category ec ON ec.expense_id = e.id \
         INNER JOIN category c ON c.id = ec.category_id"
            .to_owned(),
    ];
    let mut where_clause_parts = Vec::new();
    let mut query_parameters = Vec::new();

    if let Some(expense_id) = expense_id {
        query_parameters.push(Value::from(expense_id));
        where_clause_parts.push(format!("e.id = ?{}", query_parameters.len()));
    }

    if let Some(person_id) = filter.person_id {
        query_parameters.push(Value::from(person_id));
        where_clause_parts.push(format!("e.person_id = ?{}", query_parameters.len()));
    }

    if let Some(category_id) = filter.category_id {
        query_parameters.push(Value::from(category_id));
        // The category filter checks link membership with a subquery so that
        // matching expenses keep their full category set.
        where_clause_parts.push(format!(
            "EXISTS (SELECT 1 FROM expense_category \
             WHERE expense_id = e.id AND category_id = ?{})",
            query_parameters.len()
        ));
    }

    if !where_clause_parts.is_empty() {
        query_string_parts.push(format!("WHERE {}", where_clause_parts.join(" AND ")));
    }

    let date_order = match filter.sort_date {
        SortOrder::Ascending => "ASC",
        SortOrder::Descending => "DESC",
    };
    query_string_parts.push(format!("ORDER BY e.date {date_order}, e.id ASC, c.id ASC"));

    let mut statement = connection.prepare(&query_string_parts.join(" "))?;
    let mut rows = statement.query(params_from_iter(query_parameters))?;

    let mut details: Vec<ExpenseDetails> = Vec::new();

    while let Some(row) = rows.next()? {
        let expense_id: ExpenseId = row.get(0)?;
        let category = map_category_ref(row, 10)?;

        match details.last_mut() {
            Some(last) if last.expense.id == expense_id => last.categories.push(category),
            _ => details.push(ExpenseDetails {
                expense: SQLiteExpenseStore::map_row(row)?,
                person: map_person_ref(row, 8)?,
                categories: vec![category],
            }),
        }
    }

    Ok(details)
}

/// Map the ID and name columns starting at `offset` to a [PersonRef].
fn map_person_ref(row: &Row, offset: usize) -> Result<PersonRef, rusqlite::Error> {
    let id = row.get(offset)?;

    let raw_name: String = row.get(offset + 1)?;
    let name = PersonName::new_unchecked(&raw_name);

    Ok(PersonRef { id, name })
}

/// Map the ID and name columns starting at `offset` to a [CategoryRef].
fn map_category_ref(row: &Row, offset: usize) -> Result<CategoryRef, rusqlite::Error> {
    let id = row.get(offset)?;

    let raw_name: String = row.get(offset + 1)?;
    let name = CategoryName::new_unchecked(&raw_name);

    Ok(CategoryRef { id, name })
}

impl CreateTable for SQLiteExpenseStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                amount TEXT NOT NULL,
                date TEXT NOT NULL,
                notes TEXT,
                person_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT,
                FOREIGN KEY(person_id) REFERENCES person(id) ON UPDATE CASCADE ON DELETE RESTRICT
            );",
            (),
        )?;

        connection.execute(
            "CREATE INDEX IF NOT EXISTS idx_expense_person_id ON expense(person_id);",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteExpenseStore {
    type ReturnType = Expense;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let id = row.get(offset)?;

        let raw_description: String = row.get(offset + 1)?;
        let description = Description::new_unchecked(&raw_description);

        let raw_amount: String = row.get(offset + 2)?;
        let amount = Amount::new_unchecked(Decimal::from_str(&raw_amount).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                offset + 2,
                rusqlite::types::Type::Text,
                Box::new(error),
            )
        })?);

        let date = row.get(offset + 3)?;

        let raw_notes: Option<String> = row.get(offset + 4)?;
        let notes = raw_notes.map(|notes| Notes::new_unchecked(&notes));

        let person_id = row.get(offset + 5)?;
        let created_at = row.get(offset + 6)?;
        let updated_at = row.get(offset + 7)?;

        Ok(Self::ReturnType {
            id,
            description,
            amount,
            date,
            notes,
            person_id,
            created_at,
            updated_at,
        })
    }
}
