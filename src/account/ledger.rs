//! Crediting and debiting accounts, and the ledger that records it.

use rusqlite::{Connection, Row};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    Error,
    account::{AccountId, AccountStatus, get_account},
};

/// Database identifier for a ledger entry.
pub type LedgerEntryId = i64;

/// Whether money moves into or out of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Credit,
    Debit,
}

/// A request to move money into or out of an account.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjustment {
    pub direction: Direction,
    /// The amount in minor units. Must be positive.
    pub amount: i64,
    pub description: String,
}

/// A record of a single credit or debit.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub account_id: AccountId,
    /// The signed change in minor units, negative for debits.
    pub amount: i64,
    /// The account balance after this entry was applied.
    pub balance_after: i64,
    pub description: String,
    pub recorded_at: OffsetDateTime,
}

pub fn create_ledger_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS ledger_entries (
            id INTEGER PRIMARY KEY,
            account_id INTEGER NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
            amount INTEGER NOT NULL,
            balance_after INTEGER NOT NULL,
            description TEXT NOT NULL,
            recorded_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_ledger_entries_account_id ON ledger_entries(account_id);",
    )?;

    Ok(())
}

/// Credit or debit an account and record the change in the ledger.
///
/// The balance update and the ledger entry are written in one transaction.
///
/// # Errors
///
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is zero or negative,
/// - [Error::UpdateMissingAccount] if the account does not exist,
/// - [Error::AccountNotActive] if the account is frozen or closed,
/// - [Error::InsufficientFunds] if a debit is larger than the balance,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn adjust_balance(
    account_id: AccountId,
    adjustment: &Adjustment,
    connection: &Connection,
) -> Result<LedgerEntry, Error> {
    if adjustment.amount <= 0 {
        return Err(Error::InvalidAmount);
    }

    let transaction = connection.unchecked_transaction()?;

    let account = get_account(account_id, &transaction).map_err(|error| match error {
        Error::NotFound => Error::UpdateMissingAccount,
        error => error,
    })?;

    if account.status != AccountStatus::Active {
        return Err(Error::AccountNotActive(account.status));
    }

    let signed_amount = match adjustment.direction {
        Direction::Credit => adjustment.amount,
        Direction::Debit => -adjustment.amount,
    };

    let balance_after = account
        .balance
        .checked_add(signed_amount)
        .ok_or(Error::InvalidAmount)?;

    if balance_after < 0 {
        return Err(Error::InsufficientFunds);
    }

    transaction.execute(
        "UPDATE accounts SET balance = ?1 WHERE id = ?2",
        (balance_after, account_id),
    )?;

    let recorded_at = OffsetDateTime::now_utc();
    transaction.execute(
        "INSERT INTO ledger_entries (account_id, amount, balance_after, description, recorded_at)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            account_id,
            signed_amount,
            balance_after,
            adjustment.description.trim(),
            recorded_at,
        ),
    )?;
    let id = transaction.last_insert_rowid();

    transaction.commit()?;

    tracing::info!(
        "applied {:?} of {} to account {account_id}, balance is now {balance_after}",
        adjustment.direction,
        adjustment.amount
    );

    Ok(LedgerEntry {
        id,
        account_id,
        amount: signed_amount,
        balance_after,
        description: adjustment.description.trim().to_owned(),
        recorded_at,
    })
}

/// Retrieve the ledger entries for an account, newest first.
pub fn get_ledger_entries(
    account_id: AccountId,
    connection: &Connection,
) -> Result<Vec<LedgerEntry>, Error> {
    connection
        .prepare(
            "SELECT id, account_id, amount, balance_after, description, recorded_at
            FROM ledger_entries WHERE account_id = :account_id
            ORDER BY id DESC;",
        )?
        .query_map(&[(":account_id", &account_id)], map_row)?
        .map(|maybe_entry| maybe_entry.map_err(|error| error.into()))
        .collect()
}

fn map_row(row: &Row) -> Result<LedgerEntry, rusqlite::Error> {
    Ok(LedgerEntry {
        id: row.get(0)?,
        account_id: row.get(1)?,
        amount: row.get(2)?,
        balance_after: row.get(3)?,
        description: row.get(4)?,
        recorded_at: row.get(5)?,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use rusqlite::Connection;

    use crate::account::{AccountId, AccountStatus};

    /// Insert a customer with one GBP checking account and return the account ID.
    pub(crate) fn insert_test_account(connection: &Connection) -> AccountId {
        connection
            .execute(
                "INSERT INTO users (username, full_name, email, membership_number, created_on)
                VALUES ('alice', 'Alice Smith', 'alice@example.com', '1000000001', '2025-01-01')",
                (),
            )
            .expect("Could not insert test user");
        let user_id = connection.last_insert_rowid();

        connection
            .execute(
                "INSERT INTO accounts (user_id, kind, currency, status, account_number, iban,
                    sort_code, routing_number, bic, balance, opened_on)
                VALUES (?1, 'checking', 'GBP', 'active', '12345678', 'GB00MOCK90000112345678',
                    '900001', NULL, 'MOCKGB2L', 0, '2025-01-01')",
                (user_id,),
            )
            .expect("Could not insert test account");

        connection.last_insert_rowid()
    }

    pub(crate) fn set_status_unchecked(
        account_id: AccountId,
        status: AccountStatus,
        connection: &Connection,
    ) {
        connection
            .execute(
                "UPDATE accounts SET status = ?1 WHERE id = ?2",
                (status.as_str(), account_id),
            )
            .expect("Could not set account status");
    }
}
