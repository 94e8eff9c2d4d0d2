//! The SQLite backed implementation of the report store.
//!
//! Amounts are stored as TEXT, so sums are computed here with decimal
//! arithmetic instead of in SQL.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use rusqlite::{Connection, Rows};
use rust_decimal::Decimal;
use time::Date;

use crate::{
    Error,
    models::{CategoryName, DatabaseID, PersonName},
    stores::{BreakdownEntry, CategorySummary, GlobalSummary, PersonSummary, ReportStore},
};

/// Computes summary reports from a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteReportStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteReportStore {
    /// Create a new report store with a SQLite database.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl ReportStore for SQLiteReportStore {
    /// Summarize expense usage for every category, ordered by category name.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is an SQL error.
    fn category_summary(&self) -> Result<Vec<CategorySummary>, Error> {
        let connection = self
            .connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::StoreUnavailable)?;

        let mut statement = connection.prepare(
            "SELECT c.id, c.name, e.amount, e.date
             FROM category c
             LEFT JOIN expense_category ec ON ec.category_id = c.id
             LEFT JOIN expense e ON e.id = ec.expense_id
             ORDER BY c.name ASC, c.id ASC",
        )?;
        let mut rows = statement.query([])?;

        let summaries = fold_summary_rows(&mut rows)?
            .into_iter()
            .map(|summary| CategorySummary {
                id: summary.id,
                name: CategoryName::new_unchecked(&summary.name),
                expense_count: summary.expense_count,
                total_amount: summary.total_amount,
                last_expense_date: summary.last_expense_date,
            })
            .collect();

        Ok(summaries)
    }

    /// Summarize the expenses owned by every person, ordered by person name.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is an SQL error.
    fn person_summary(&self) -> Result<Vec<PersonSummary>, Error> {
        let connection = self
            .connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::StoreUnavailable)?;

        let mut statement = connection.prepare(
            "SELECT p.id, p.name, e.amount, e.date
             FROM person p
             LEFT JOIN expense e ON e.person_id = p.id
             ORDER BY p.name ASC, p.id ASC",
        )?;
        let mut rows = statement.query([])?;

        let summaries = fold_summary_rows(&mut rows)?
            .into_iter()
            .map(|summary| PersonSummary {
                id: summary.id,
                name: PersonName::new_unchecked(&summary.name),
                expense_count: summary.expense_count,
                total_amount: summary.total_amount,
                last_expense_date: summary.last_expense_date,
            })
            .collect();

        Ok(summaries)
    }

    /// Rank every category by usage: most expenses first, ties broken by the
    /// highest total amount and then by name.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is an SQL error.
    fn popular_categories(&self) -> Result<Vec<CategorySummary>, Error> {
        let mut summaries = self.category_summary()?;

        summaries.sort_by(|a, b| {
            b.expense_count
                .cmp(&a.expense_count)
                .then_with(|| b.total_amount.cmp(&a.total_amount))
                .then_with(|| a.name.as_ref().cmp(b.name.as_ref()))
        });

        Ok(summaries)
    }

    /// Compute totals across every expense, with per-name breakdowns for
    /// categories and people.
    ///
    /// All three parts are read under one lock so the summary reflects a
    /// single point in time.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is an SQL error.
    fn global_summary(&self) -> Result<GlobalSummary, Error> {
        let connection = self
            .connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::StoreUnavailable)?;

        let (total_expenses, expense_count) = query_expense_totals(&connection)?;
        let category_breakdown = query_category_breakdown(&connection)?;
        let person_breakdown = query_person_breakdown(&connection)?;

        Ok(GlobalSummary {
            total_expenses,
            expense_count,
            category_breakdown,
            person_breakdown,
        })
    }
}

/// One category's or person's totals, accumulated while folding joined rows.
struct RunningSummary {
    id: DatabaseID,
    name: String,
    expense_count: usize,
    total_amount: Decimal,
    last_expense_date: Option<Date>,
}

/// Fold joined rows of (id, name, amount, date) into one summary per entity.
///
/// Rows must be sorted so that rows with the same ID are consecutive. An
/// entity with no expenses produces a single row with NULL amount and date.
fn fold_summary_rows(rows: &mut Rows) -> Result<Vec<RunningSummary>, Error> {
    let mut summaries: Vec<RunningSummary> = Vec::new();

    while let Some(row) = rows.next()? {
        let id = row.get(0)?;
        let amount: Option<String> = row.get(2)?;
        let date: Option<Date> = row.get(3)?;

        match summaries.last_mut() {
            Some(last) if last.id == id => accumulate_expense(last, amount, date)?,
            _ => {
                let mut summary = RunningSummary {
                    id,
                    name: row.get(1)?,
                    expense_count: 0,
                    total_amount: Decimal::ZERO,
                    last_expense_date: None,
                };
                accumulate_expense(&mut summary, amount, date)?;
                summaries.push(summary);
            }
        }
    }

    Ok(summaries)
}

/// Add one joined expense row to a running summary.
///
/// A NULL amount comes from an entity with no expenses and leaves the summary
/// untouched.
fn accumulate_expense(
    summary: &mut RunningSummary,
    amount: Option<String>,
    date: Option<Date>,
) -> Result<(), Error> {
    if let Some(raw_amount) = amount {
        summary.expense_count += 1;
        summary.total_amount += parse_stored_amount(&raw_amount, 2)?;
        summary.last_expense_date = summary.last_expense_date.max(date);
    }

    Ok(())
}

fn query_expense_totals(connection: &Connection) -> Result<(Decimal, usize), Error> {
    let mut statement = connection.prepare("SELECT amount FROM expense")?;
    let mut rows = statement.query([])?;

    let mut total_expenses = Decimal::ZERO;
    let mut expense_count = 0;

    while let Some(row) = rows.next()? {
        let raw_amount: String = row.get(0)?;
        total_expenses += parse_stored_amount(&raw_amount, 0)?;
        expense_count += 1;
    }

    Ok((total_expenses, expense_count))
}

/// Sum spending per category name. Every category appears, so a category with
/// no expenses shows up with a total of zero.
fn query_category_breakdown(connection: &Connection) -> Result<Vec<BreakdownEntry>, Error> {
    let mut statement = connection.prepare(
        "SELECT c.name, e.amount
         FROM category c
         LEFT JOIN expense_category ec ON ec.category_id = c.id
         LEFT JOIN expense e ON e.id = ec.expense_id
         ORDER BY c.name ASC",
    )?;
    let mut rows = statement.query([])?;

    fold_breakdown_rows(&mut rows)
}

/// Sum spending per person name. Only people with expenses appear.
fn query_person_breakdown(connection: &Connection) -> Result<Vec<BreakdownEntry>, Error> {
    let mut statement = connection.prepare(
        "SELECT p.name, e.amount
         FROM person p
         INNER JOIN expense e ON e.person_id = p.id
         ORDER BY p.name ASC",
    )?;
    let mut rows = statement.query([])?;

    fold_breakdown_rows(&mut rows)
}

/// Fold rows of (name, amount) into one entry per name, with the highest
/// total first and ties broken by name.
///
/// Rows must be sorted by name so that rows with the same name are
/// consecutive. Entities sharing a name are merged into one entry.
fn fold_breakdown_rows(rows: &mut Rows) -> Result<Vec<BreakdownEntry>, Error> {
    let mut entries: Vec<BreakdownEntry> = Vec::new();

    while let Some(row) = rows.next()? {
        let name: String = row.get(0)?;
        let amount = match row.get::<_, Option<String>>(1)? {
            Some(raw_amount) => parse_stored_amount(&raw_amount, 1)?,
            None => Decimal::ZERO,
        };

        match entries.last_mut() {
            Some(last) if last.name == name => last.total_amount += amount,
            _ => entries.push(BreakdownEntry {
                name,
                total_amount: amount,
            }),
        }
    }

    entries.sort_by(|a, b| {
        b.total_amount
            .cmp(&a.total_amount)
            .then_with(|| a.name.cmp(&b.name))
    });

    Ok(entries)
}

/// Parse an amount stored as TEXT back into a decimal.
///
/// `column_index` is only used to report which column held the bad value.
fn parse_stored_amount(raw_amount: &str, column_index: usize) -> Result<Decimal, rusqlite::Error> {
    Decimal::from_str(raw_amount).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            column_index,
            rusqlite::types::Type::Text,
            Box::new(error),
        )
    })
}

#[cfg(test)]
mod report_store_tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use time::{Date, macros::date};

    use crate::{
        models::{
            Amount, Category, CategoryId, CategoryName, Description, NewExpense, Person, PersonId,
            PersonName,
        },
        stores::{
            BreakdownEntry, CategoryStore, CategorySummary, ExpenseStore, PersonStore,
            PersonSummary, ReportStore,
            sqlite::{SQLAppState, create_app_state},
        },
    };

    fn get_app_state() -> SQLAppState {
        let connection = Connection::open_in_memory().unwrap();
        create_app_state(connection).unwrap()
    }

    fn create_test_person(state: &mut SQLAppState, name: &str) -> Person {
        state
            .person_store
            .create(PersonName::new_unchecked(name))
            .expect("Could not create test person")
    }

    fn create_test_category(state: &mut SQLAppState, name: &str) -> Category {
        state
            .category_store
            .create(CategoryName::new_unchecked(name))
            .expect("Could not create test category")
    }

    fn create_test_expense(
        state: &mut SQLAppState,
        person_id: PersonId,
        category_ids: Vec<CategoryId>,
        amount: Decimal,
        date: Date,
    ) {
        state
            .expense_store
            .create(NewExpense {
                description: Description::new_unchecked("Lunch"),
                amount: Amount::new_unchecked(amount),
                date,
                notes: None,
                person_id,
                category_ids,
            })
            .expect("Could not create test expense");
    }

    #[test]
    fn category_summary_includes_categories_with_no_expenses() {
        let mut state = get_app_state();
        let office = create_test_category(&mut state, "Office");

        let summaries = state.report_store.category_summary().unwrap();

        assert_eq!(
            summaries,
            vec![CategorySummary {
                id: office.id,
                name: office.name,
                expense_count: 0,
                total_amount: Decimal::ZERO,
                last_expense_date: None,
            }]
        );
    }

    #[test]
    fn category_summary_sums_linked_expenses() {
        let mut state = get_app_state();
        let person = create_test_person(&mut state, "Anton");
        let office = create_test_category(&mut state, "Office");
        let travel = create_test_category(&mut state, "Travel");
        create_test_expense(
            &mut state,
            person.id,
            vec![office.id],
            dec!(25.50),
            date!(2024 - 01 - 15),
        );
        create_test_expense(
            &mut state,
            person.id,
            vec![office.id, travel.id],
            dec!(45.75),
            date!(2024 - 01 - 20),
        );

        let summaries = state.report_store.category_summary().unwrap();

        assert_eq!(
            summaries,
            vec![
                CategorySummary {
                    id: office.id,
                    name: office.name,
                    expense_count: 2,
                    total_amount: dec!(71.25),
                    last_expense_date: Some(date!(2024 - 01 - 20)),
                },
                CategorySummary {
                    id: travel.id,
                    name: travel.name,
                    expense_count: 1,
                    total_amount: dec!(45.75),
                    last_expense_date: Some(date!(2024 - 01 - 20)),
                },
            ]
        );
    }

    #[test]
    fn category_summary_sorted_by_name() {
        let mut state = get_app_state();
        create_test_category(&mut state, "Travel");
        create_test_category(&mut state, "Office");

        let summaries = state.report_store.category_summary().unwrap();

        let names: Vec<String> = summaries
            .iter()
            .map(|summary| summary.name.to_string())
            .collect();
        assert_eq!(names, vec!["Office", "Travel"]);
    }

    #[test]
    fn category_summary_is_idempotent() {
        let mut state = get_app_state();
        let person = create_test_person(&mut state, "Anton");
        let office = create_test_category(&mut state, "Office");
        create_test_expense(
            &mut state,
            person.id,
            vec![office.id],
            dec!(25.50),
            date!(2024 - 01 - 15),
        );

        let first = state.report_store.category_summary().unwrap();
        let second = state.report_store.category_summary().unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn person_summary_includes_people_with_no_expenses() {
        let mut state = get_app_state();
        let anton = create_test_person(&mut state, "Anton");

        let summaries = state.report_store.person_summary().unwrap();

        assert_eq!(
            summaries,
            vec![PersonSummary {
                id: anton.id,
                name: anton.name,
                expense_count: 0,
                total_amount: Decimal::ZERO,
                last_expense_date: None,
            }]
        );
    }

    #[test]
    fn person_summary_sums_owned_expenses() {
        let mut state = get_app_state();
        let steve = create_test_person(&mut state, "Steve");
        let anton = create_test_person(&mut state, "Anton");
        let office = create_test_category(&mut state, "Office");
        create_test_expense(
            &mut state,
            anton.id,
            vec![office.id],
            dec!(25.50),
            date!(2024 - 01 - 15),
        );
        create_test_expense(
            &mut state,
            anton.id,
            vec![office.id],
            dec!(45.75),
            date!(2024 - 01 - 20),
        );
        create_test_expense(
            &mut state,
            steve.id,
            vec![office.id],
            dec!(10.00),
            date!(2024 - 02 - 01),
        );

        let summaries = state.report_store.person_summary().unwrap();

        assert_eq!(
            summaries,
            vec![
                PersonSummary {
                    id: anton.id,
                    name: anton.name,
                    expense_count: 2,
                    total_amount: dec!(71.25),
                    last_expense_date: Some(date!(2024 - 01 - 20)),
                },
                PersonSummary {
                    id: steve.id,
                    name: steve.name,
                    expense_count: 1,
                    total_amount: dec!(10.00),
                    last_expense_date: Some(date!(2024 - 02 - 01)),
                },
            ]
        );
    }

    #[test]
    fn popular_categories_ranks_by_count_then_total_then_name() {
        let mut state = get_app_state();
        let person = create_test_person(&mut state, "Anton");
        let office = create_test_category(&mut state, "Office");
        let travel = create_test_category(&mut state, "Travel");
        let food = create_test_category(&mut state, "Food");
        create_test_category(&mut state, "Unused");

        // Office leads on count despite the smallest total. Food and Travel
        // tie on both count and total, so the name decides.
        create_test_expense(
            &mut state,
            person.id,
            vec![office.id],
            dec!(10.00),
            date!(2024 - 01 - 10),
        );
        create_test_expense(
            &mut state,
            person.id,
            vec![office.id],
            dec!(5.00),
            date!(2024 - 01 - 11),
        );
        create_test_expense(
            &mut state,
            person.id,
            vec![travel.id],
            dec!(100.00),
            date!(2024 - 01 - 12),
        );
        create_test_expense(
            &mut state,
            person.id,
            vec![food.id],
            dec!(100.00),
            date!(2024 - 01 - 13),
        );

        let summaries = state.report_store.popular_categories().unwrap();

        let names: Vec<String> = summaries
            .iter()
            .map(|summary| summary.name.to_string())
            .collect();
        assert_eq!(names, vec!["Office", "Food", "Travel", "Unused"]);
    }

    #[test]
    fn global_summary_totals_all_expenses() {
        let mut state = get_app_state();
        let person = create_test_person(&mut state, "Anton");
        let office = create_test_category(&mut state, "Office");
        create_test_expense(
            &mut state,
            person.id,
            vec![office.id],
            dec!(25.50),
            date!(2024 - 01 - 15),
        );
        create_test_expense(
            &mut state,
            person.id,
            vec![office.id],
            dec!(45.75),
            date!(2024 - 01 - 20),
        );

        let summary = state.report_store.global_summary().unwrap();

        assert_eq!(summary.total_expenses, dec!(71.25));
        assert_eq!(summary.expense_count, 2);
    }

    #[test]
    fn global_summary_breaks_down_by_category_and_person() {
        let mut state = get_app_state();
        let anton = create_test_person(&mut state, "Anton");
        let steve = create_test_person(&mut state, "Steve");
        create_test_person(&mut state, "Idle");
        let office = create_test_category(&mut state, "Office");
        let travel = create_test_category(&mut state, "Travel");

        // An expense tagged with two categories counts its full amount
        // towards both of them.
        create_test_expense(
            &mut state,
            anton.id,
            vec![office.id, travel.id],
            dec!(30.00),
            date!(2024 - 01 - 15),
        );
        create_test_expense(
            &mut state,
            steve.id,
            vec![office.id],
            dec!(20.00),
            date!(2024 - 01 - 20),
        );

        let summary = state.report_store.global_summary().unwrap();

        assert_eq!(
            summary.category_breakdown,
            vec![
                BreakdownEntry {
                    name: "Office".to_string(),
                    total_amount: dec!(50.00),
                },
                BreakdownEntry {
                    name: "Travel".to_string(),
                    total_amount: dec!(30.00),
                },
            ]
        );
        assert_eq!(
            summary.person_breakdown,
            vec![
                BreakdownEntry {
                    name: "Anton".to_string(),
                    total_amount: dec!(30.00),
                },
                BreakdownEntry {
                    name: "Steve".to_string(),
                    total_amount: dec!(20.00),
                },
            ]
        );
    }

    #[test]
    fn global_summary_includes_categories_with_no_expenses() {
        let mut state = get_app_state();
        let person = create_test_person(&mut state, "Anton");
        let office = create_test_category(&mut state, "Office");
        create_test_category(&mut state, "Unused");
        create_test_expense(
            &mut state,
            person.id,
            vec![office.id],
            dec!(25.50),
            date!(2024 - 01 - 15),
        );

        let summary = state.report_store.global_summary().unwrap();

        assert_eq!(
            summary.category_breakdown,
            vec![
                BreakdownEntry {
                    name: "Office".to_string(),
                    total_amount: dec!(25.50),
                },
                BreakdownEntry {
                    name: "Unused".to_string(),
                    total_amount: Decimal::ZERO,
                },
            ]
        );
    }

    #[test]
    fn global_summary_merges_duplicate_category_names() {
        let mut state = get_app_state();
        let person = create_test_person(&mut state, "Anton");
        let first_office = create_test_category(&mut state, "Office");
        let second_office = create_test_category(&mut state, "Office");
        create_test_expense(
            &mut state,
            person.id,
            vec![first_office.id],
            dec!(10.00),
            date!(2024 - 01 - 15),
        );
        create_test_expense(
            &mut state,
            person.id,
            vec![second_office.id],
            dec!(15.00),
            date!(2024 - 01 - 20),
        );

        let summary = state.report_store.global_summary().unwrap();

        assert_eq!(
            summary.category_breakdown,
            vec![BreakdownEntry {
                name: "Office".to_string(),
                total_amount: dec!(25.00),
            }]
        );
    }

    #[test]
    fn global_summary_for_empty_store() {
        let state = get_app_state();

        let summary = state.report_store.global_summary().unwrap();

        assert_eq!(summary.total_expenses, Decimal::ZERO);
        assert_eq!(summary.expense_count, 0);
        assert!(summary.category_breakdown.is_empty());
        assert!(summary.person_breakdown.is_empty());
    }
}
