use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use expenseur_rs::{
    models::{Amount, CategoryName, Description, NewExpense, Notes, PersonName},
    stores::{CategoryStore, ExpenseStore, PersonStore, sqlite::create_app_state},
};

/// A utility for creating a test database for expenseur_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    setup_logging();

    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let connection = Connection::open(output_path)?;

    let mut state = create_app_state(connection)?;

    println!("Creating test people and categories...");

    let anton = state.person_store.create(PersonName::new("Anton")?)?;
    let steve = state.person_store.create(PersonName::new("Steve")?)?;

    let office = state
        .category_store
        .create(CategoryName::new("Office Expenses")?)?;
    state
        .category_store
        .create(CategoryName::new("Home Expenses")?)?;

    println!("Creating test expenses...");

    let today = OffsetDateTime::now_utc().date();

    state.expense_store.create(NewExpense {
        description: Description::new("Lunch at restaurant")?,
        amount: Amount::new(Decimal::new(2550, 2))?,
        date: today - Duration::days(1),
        notes: Some(Notes::new("Business lunch with client")?),
        person_id: anton.id,
        category_ids: vec![office.id],
    })?;

    state.expense_store.create(NewExpense {
        description: Description::new("Office supplies")?,
        amount: Amount::new(Decimal::new(4575, 2))?,
        date: today - Duration::days(2),
        notes: Some(Notes::new("Printer paper and ink")?),
        person_id: steve.id,
        category_ids: vec![office.id],
    })?;

    println!("Success!");

    Ok(())
}

fn setup_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
                ),
        )
        .init();
}
