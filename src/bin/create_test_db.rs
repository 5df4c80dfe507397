use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use bankdesk_rs::{
    AccountKind, Currency, InstitutionConfig, NewCustomer, ThreadRandom, initialize_db,
    provision_customer,
};

/// A utility for creating a test database for the bankdesk_rs server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
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
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    let institutions = InstitutionConfig::default();
    let customers = [
        ("alice", "Alice Smith", "alice@example.com", Currency::Gbp),
        ("bruno", "Bruno Weber", "bruno@example.com", Currency::Eur),
        ("carla", "Carla Jones", "carla@example.com", Currency::Usd),
    ];

    for (username, full_name, email, currency) in customers {
        println!("Creating test customer {username}...");

        let new_customer = NewCustomer::new(
            username,
            full_name,
            email,
            currency,
            vec![AccountKind::Checking, AccountKind::Savings],
        )?;
        let provisioned = provision_customer(&new_customer, &institutions, ThreadRandom, &conn)?;

        for account in &provisioned.accounts {
            println!("  {} {}", account.kind, account.iban);
        }
    }

    println!("Success!");

    Ok(())
}
