//! Database initialization.

use rusqlite::Connection;

use crate::{
    Error,
    account::{create_account_table, create_ledger_table},
    customer::create_user_table,
};

/// Create the tables, indexes and triggers for the application.
///
/// This is safe to call on a database that has already been initialized.
///
/// # Errors
///
/// Returns an [Error::SqlError] if any of the statements fail.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Has no effect inside a transaction, so it must run first.
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    let transaction = connection.unchecked_transaction()?;

    create_user_table(&transaction)?;
    create_account_table(&transaction)?;
    create_ledger_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
