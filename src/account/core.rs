//! Account types, tables and queries.

use std::{fmt::Display, str::FromStr};

use rusqlite::{Connection, Row, types::Type};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, currency::Currency, customer::CustomerId};

/// Database identifier for an account.
pub type AccountId = i64;

/// The product an account was opened as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// An everyday account.
    Checking,
    /// An account for holding savings.
    Savings,
}

impl AccountKind {
    /// The lowercase name stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Checking => "checking",
            AccountKind::Savings => "savings",
        }
    }

    /// The name shown to staff, e.g. "Checking".
    pub fn label(&self) -> &'static str {
        match self {
            AccountKind::Checking => "Checking",
            AccountKind::Savings => "Savings",
        }
    }
}

impl FromStr for AccountKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "checking" => Ok(AccountKind::Checking),
            "savings" => Ok(AccountKind::Savings),
            _ => Err(Error::UnsupportedAccountKind(s.to_owned())),
        }
    }
}

impl Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether an account can be used.
///
/// Only active accounts can be credited or debited. A closed account can
/// never change status again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// The account can be credited and debited.
    Active,
    /// Funds cannot be moved until the account is reactivated.
    Frozen,
    /// The account is permanently closed.
    Closed,
}

impl AccountStatus {
    /// Every status, in the order they are offered in forms.
    pub const ALL: [AccountStatus; 3] = [
        AccountStatus::Active,
        AccountStatus::Frozen,
        AccountStatus::Closed,
    ];

    /// The lowercase name stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Frozen => "frozen",
            AccountStatus::Closed => "closed",
        }
    }
}

impl FromStr for AccountStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(AccountStatus::Active),
            "frozen" => Ok(AccountStatus::Frozen),
            "closed" => Ok(AccountStatus::Closed),
            _ => Err(Error::UnsupportedAccountStatus(s.to_owned())),
        }
    }
}

impl Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bank account and the identifiers issued for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// The ID of the account.
    pub id: AccountId,
    /// The customer that owns the account.
    pub customer_id: CustomerId,
    /// Whether this is a checking or savings account.
    pub kind: AccountKind,
    /// The currency the balance is held in.
    pub currency: Currency,
    /// Whether funds can be moved and the status changed.
    pub status: AccountStatus,
    /// The numeric account number, 8 digits for GBP and 10 otherwise.
    pub account_number: String,
    /// The IBAN, with the account number as its last segment.
    pub iban: String,
    /// Only set for GBP accounts. Shared by the customer's GBP accounts.
    pub sort_code: Option<String>,
    /// Only set for USD accounts. Shared by the customer's USD accounts.
    pub routing_number: Option<String>,
    /// The BIC of the institution that issued the account.
    pub bic: String,
    /// The balance in minor units, e.g. pence or cents.
    pub balance: i64,
    /// The date the account was opened.
    pub opened_on: Date,
}

/// The values needed to insert a freshly allocated account.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount<'a> {
    pub customer_id: CustomerId,
    pub kind: AccountKind,
    pub currency: Currency,
    pub account_number: &'a str,
    pub iban: &'a str,
    pub sort_code: Option<&'a str>,
    pub routing_number: Option<&'a str>,
    pub bic: &'a str,
    pub opened_on: Date,
}

/// Create the account table, its indexes and the triggers that keep shared
/// codes unique across customers.
///
/// A customer's GBP accounts share one sort code and their USD accounts share
/// one routing number, so these columns cannot have a unique index. The
/// triggers abort any write that would give a code to a second customer.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            kind TEXT NOT NULL,
            currency TEXT NOT NULL,
            status TEXT NOT NULL,
            account_number TEXT NOT NULL,
            iban TEXT NOT NULL,
            sort_code TEXT,
            routing_number TEXT,
            bic TEXT NOT NULL,
            balance INTEGER NOT NULL DEFAULT 0,
            opened_on TEXT NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_accounts_account_number ON accounts(account_number);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_accounts_iban ON accounts(iban);
        CREATE INDEX IF NOT EXISTS idx_accounts_sort_code ON accounts(sort_code);
        CREATE INDEX IF NOT EXISTS idx_accounts_routing_number ON accounts(routing_number);
        CREATE INDEX IF NOT EXISTS idx_accounts_user_id ON accounts(user_id);

        CREATE TRIGGER IF NOT EXISTS accounts_sort_code_owner_insert
        BEFORE INSERT ON accounts
        WHEN NEW.sort_code IS NOT NULL AND EXISTS (
            SELECT 1 FROM accounts WHERE sort_code = NEW.sort_code AND user_id != NEW.user_id
        )
        BEGIN
            SELECT RAISE(ABORT, 'UNIQUE constraint failed: accounts.sort_code');
        END;

        CREATE TRIGGER IF NOT EXISTS accounts_sort_code_owner_update
        BEFORE UPDATE OF sort_code, user_id ON accounts
        WHEN NEW.sort_code IS NOT NULL AND EXISTS (
            SELECT 1 FROM accounts
            WHERE sort_code = NEW.sort_code AND user_id != NEW.user_id AND id != NEW.id
        )
        BEGIN
            SELECT RAISE(ABORT, 'UNIQUE constraint failed: accounts.sort_code');
        END;

        CREATE TRIGGER IF NOT EXISTS accounts_routing_number_owner_insert
        BEFORE INSERT ON accounts
        WHEN NEW.routing_number IS NOT NULL AND EXISTS (
            SELECT 1 FROM accounts
            WHERE routing_number = NEW.routing_number AND user_id != NEW.user_id
        )
        BEGIN
            SELECT RAISE(ABORT, 'UNIQUE constraint failed: accounts.routing_number');
        END;

        CREATE TRIGGER IF NOT EXISTS accounts_routing_number_owner_update
        BEFORE UPDATE OF routing_number, user_id ON accounts
        WHEN NEW.routing_number IS NOT NULL AND EXISTS (
            SELECT 1 FROM accounts
            WHERE routing_number = NEW.routing_number AND user_id != NEW.user_id AND id != NEW.id
        )
        BEGIN
            SELECT RAISE(ABORT, 'UNIQUE constraint failed: accounts.routing_number');
        END;",
    )?;

    Ok(())
}

/// Insert an account with a zero balance and the active status.
///
/// # Errors
///
/// Returns [Error::IdentifierConflict] if another account already holds one
/// of the identifiers, or an [Error::SqlError] for any other database error.
pub fn insert_account(new_account: &NewAccount, connection: &Connection) -> Result<Account, Error> {
    connection.execute(
        "INSERT INTO accounts (user_id, kind, currency, status, account_number, iban,
            sort_code, routing_number, bic, balance, opened_on)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, ?10)",
        (
            new_account.customer_id,
            new_account.kind.as_str(),
            new_account.currency.as_str(),
            AccountStatus::Active.as_str(),
            new_account.account_number,
            new_account.iban,
            new_account.sort_code,
            new_account.routing_number,
            new_account.bic,
            new_account.opened_on,
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Account {
        id,
        customer_id: new_account.customer_id,
        kind: new_account.kind,
        currency: new_account.currency,
        status: AccountStatus::Active,
        account_number: new_account.account_number.to_owned(),
        iban: new_account.iban.to_owned(),
        sort_code: new_account.sort_code.map(str::to_owned),
        routing_number: new_account.routing_number.map(str::to_owned),
        bic: new_account.bic.to_owned(),
        balance: 0,
        opened_on: new_account.opened_on,
    })
}

/// Retrieve a single account by ID.
pub fn get_account(account_id: AccountId, connection: &Connection) -> Result<Account, Error> {
    connection
        .prepare(
            "SELECT id, user_id, kind, currency, status, account_number, iban, sort_code,
                routing_number, bic, balance, opened_on
            FROM accounts WHERE id = :id;",
        )?
        .query_row(&[(":id", &account_id)], map_row_to_account)
        .map_err(|error| error.into())
}

/// Retrieve the accounts owned by a customer in the order they were opened.
pub fn get_accounts_for_customer(
    customer_id: CustomerId,
    connection: &Connection,
) -> Result<Vec<Account>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, kind, currency, status, account_number, iban, sort_code,
                routing_number, bic, balance, opened_on
            FROM accounts WHERE user_id = :user_id ORDER BY id ASC;",
        )?
        .query_map(&[(":user_id", &customer_id)], map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(|error| error.into()))
        .collect()
}

pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    let id = row.get(0)?;
    let customer_id = row.get(1)?;
    let kind = parse_column(row, 2)?;
    let currency = parse_column(row, 3)?;
    let status = parse_column(row, 4)?;
    let account_number = row.get(5)?;
    let iban = row.get(6)?;
    let sort_code = row.get(7)?;
    let routing_number = row.get(8)?;
    let bic = row.get(9)?;
    let balance = row.get(10)?;
    let opened_on = row.get(11)?;

    Ok(Account {
        id,
        customer_id,
        kind,
        currency,
        status,
        account_number,
        iban,
        sort_code,
        routing_number,
        bic,
        balance,
        opened_on,
    })
}

/// Read a text column and parse it with [FromStr].
pub(crate) fn parse_column<T>(row: &Row, index: usize) -> Result<T, rusqlite::Error>
where
    T: FromStr<Err = Error>,
{
    let text: String = row.get(index)?;

    text.parse()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error)))
}
