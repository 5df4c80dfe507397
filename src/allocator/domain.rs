//! The (table, column) pairs within which allocated identifiers must be unique.

use std::fmt::Display;

use rusqlite::Connection;

/// A column whose values must not collide across rows.
///
/// Each variant is backed by a unique index or a uniqueness trigger in the
/// database (see [crate::db::initialize]), which is what actually guarantees
/// uniqueness when two requests race. The allocator only checks the domain
/// to avoid handing out values that are already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniquenessDomain {
    /// `accounts.account_number`
    AccountNumber,
    /// `accounts.iban`
    Iban,
    /// `accounts.sort_code`, shared only by the accounts of one customer.
    SortCode,
    /// `accounts.routing_number`, shared only by the accounts of one customer.
    RoutingNumber,
    /// `users.membership_number`
    MembershipNumber,
}

impl UniquenessDomain {
    /// The table holding the column.
    pub fn table(&self) -> &'static str {
        match self {
            UniquenessDomain::MembershipNumber => "users",
            _ => "accounts",
        }
    }

    /// The column whose values must be unique.
    pub fn column(&self) -> &'static str {
        match self {
            UniquenessDomain::AccountNumber => "account_number",
            UniquenessDomain::Iban => "iban",
            UniquenessDomain::SortCode => "sort_code",
            UniquenessDomain::RoutingNumber => "routing_number",
            UniquenessDomain::MembershipNumber => "membership_number",
        }
    }

    fn exists_query(&self) -> &'static str {
        match self {
            UniquenessDomain::AccountNumber => {
                "SELECT 1 FROM accounts WHERE account_number = ?1 LIMIT 1"
            }
            UniquenessDomain::Iban => "SELECT 1 FROM accounts WHERE iban = ?1 LIMIT 1",
            UniquenessDomain::SortCode => "SELECT 1 FROM accounts WHERE sort_code = ?1 LIMIT 1",
            UniquenessDomain::RoutingNumber => {
                "SELECT 1 FROM accounts WHERE routing_number = ?1 LIMIT 1"
            }
            UniquenessDomain::MembershipNumber => {
                "SELECT 1 FROM users WHERE membership_number = ?1 LIMIT 1"
            }
        }
    }
}

impl Display for UniquenessDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table(), self.column())
    }
}

/// Check whether `candidate` is already used in `domain`.
///
/// # Errors
///
/// Returns the underlying SQL error if the query cannot be prepared or run.
pub fn value_exists(
    domain: UniquenessDomain,
    candidate: &str,
    connection: &Connection,
) -> Result<bool, rusqlite::Error> {
    connection
        .prepare_cached(domain.exists_query())?
        .exists([candidate])
}
