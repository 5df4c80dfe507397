//! Customer types, the user table and queries.

use std::{fmt::Display, str::FromStr};

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::Error;

/// Database identifier for a customer.
pub type CustomerId = i64;

/// The number of digits in a membership number.
pub const MEMBERSHIP_NUMBER_LENGTH: usize = 10;

/// The longest username allowed.
pub const MAX_USERNAME_LENGTH: usize = 32;

/// A validated username.
///
/// Usernames are trimmed, non-empty, at most [MAX_USERNAME_LENGTH]
/// characters, and only contain ASCII letters, digits, `.`, `_` and `-`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Username(String);

impl Username {
    /// Create a username.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::InvalidUsername] if `username` is
    /// empty, too long, or contains a character that is not allowed.
    pub fn new(username: &str) -> Result<Self, Error> {
        let username = username.trim();

        if username.is_empty() {
            return Err(Error::InvalidUsername(
                "username cannot be empty".to_owned(),
            ));
        }

        if username.len() > MAX_USERNAME_LENGTH {
            return Err(Error::InvalidUsername(format!(
                "username must be at most {MAX_USERNAME_LENGTH} characters"
            )));
        }

        if let Some(c) = username
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
        {
            return Err(Error::InvalidUsername(format!(
                "username cannot contain '{c}', use letters, digits, '.', '_' or '-'"
            )));
        }

        Ok(Self(username.to_owned()))
    }

    /// Create a username without validation.
    ///
    /// The caller should ensure that the string is a valid username.
    pub fn new_unchecked(username: &str) -> Self {
        Self(username.to_owned())
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Username {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Username::new(s)
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bank customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    /// The ID of the customer.
    pub id: CustomerId,
    /// The unique name staff use to find the customer.
    pub username: Username,
    /// The customer's name as given when they were provisioned.
    pub full_name: String,
    /// The customer's contact email address.
    pub email: String,
    /// A unique 10 digit number identifying the customer to staff.
    pub membership_number: String,
    /// The date the customer was provisioned.
    pub created_on: Date,
}

/// Check that `full_name` is not blank and return it trimmed.
pub fn validate_full_name(full_name: &str) -> Result<String, Error> {
    let full_name = full_name.trim();

    if full_name.is_empty() {
        Err(Error::EmptyFullName)
    } else {
        Ok(full_name.to_owned())
    }
}

/// Check that `email` looks like `local@domain.tld` and return it trimmed.
pub fn validate_email(email: &str) -> Result<String, Error> {
    let email = email.trim();

    let is_valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if is_valid {
        Ok(email.to_owned())
    } else {
        Err(Error::InvalidEmail(email.to_owned()))
    }
}

pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            username TEXT NOT NULL,
            full_name TEXT NOT NULL,
            email TEXT NOT NULL,
            membership_number TEXT NOT NULL,
            created_on TEXT NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_users_username ON users(username);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_users_membership_number ON users(membership_number);",
    )?;

    Ok(())
}

/// Insert a customer and return it with its generated ID.
///
/// # Errors
///
/// This function will return a:
/// - [Error::DuplicateUsername] if the username is taken,
/// - [Error::IdentifierConflict] if the membership number is taken,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn insert_customer(
    username: &Username,
    full_name: &str,
    email: &str,
    membership_number: &str,
    created_on: Date,
    connection: &Connection,
) -> Result<Customer, Error> {
    connection
        .execute(
            "INSERT INTO users (username, full_name, email, membership_number, created_on)
            VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                username.as_ref(),
                full_name,
                email,
                membership_number,
                created_on,
            ),
        )
        .map_err(|error| match Error::from(error) {
            Error::IdentifierConflict(column) if column == "users.username" => {
                Error::DuplicateUsername(username.to_string())
            }
            error => error,
        })?;

    let id = connection.last_insert_rowid();

    Ok(Customer {
        id,
        username: username.clone(),
        full_name: full_name.to_owned(),
        email: email.to_owned(),
        membership_number: membership_number.to_owned(),
        created_on,
    })
}

/// Retrieve a single customer by ID.
pub fn get_customer(customer_id: CustomerId, connection: &Connection) -> Result<Customer, Error> {
    connection
        .prepare(
            "SELECT id, username, full_name, email, membership_number, created_on
            FROM users WHERE id = :id;",
        )?
        .query_row(&[(":id", &customer_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve all customers ordered alphabetically by username.
pub fn get_all_customers(connection: &Connection) -> Result<Vec<Customer>, Error> {
    connection
        .prepare(
            "SELECT id, username, full_name, email, membership_number, created_on
            FROM users ORDER BY username ASC;",
        )?
        .query_map([], map_row)?
        .map(|maybe_customer| maybe_customer.map_err(|error| error.into()))
        .collect()
}

/// Delete a customer along with their accounts and ledger entries.
///
/// # Errors
///
/// Returns [Error::DeleteMissingCustomer] if the customer does not exist.
pub fn delete_customer(customer_id: CustomerId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM users WHERE id = ?1", [customer_id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCustomer);
    }

    tracing::info!("deleted customer {customer_id}");

    Ok(())
}

fn map_row(row: &Row) -> Result<Customer, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_username: String = row.get(1)?;
    let username = Username::new_unchecked(&raw_username);
    let full_name = row.get(2)?;
    let email = row.get(3)?;
    let membership_number = row.get(4)?;
    let created_on = row.get(5)?;

    Ok(Customer {
        id,
        username,
        full_name,
        email,
        membership_number,
        created_on,
    })
}

#[cfg(test)]
mod username_tests {
    use crate::{Error, customer::Username};

    #[test]
    fn new_fails_on_empty_string() {
        let username = Username::new(" \t\n");

        assert!(matches!(username, Err(Error::InvalidUsername(_))));
    }

    #[test]
    fn new_fails_on_disallowed_character() {
        let username = Username::new("alice smith");

        assert!(matches!(username, Err(Error::InvalidUsername(_))));
    }

    #[test]
    fn new_fails_on_long_username() {
        let username = Username::new(&"a".repeat(33));

        assert!(matches!(username, Err(Error::InvalidUsername(_))));
    }

    #[test]
    fn new_trims_and_accepts_punctuation() {
        let username = Username::new("  alice.smith_01-b ");

        assert_eq!(username, Ok(Username::new_unchecked("alice.smith_01-b")));
    }
}
