//! Opening a customer and their first accounts in one step.

use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    Error,
    account::{Account, AccountKind, NewAccount, insert_account},
    allocator::{DigitSource, IdentifierAllocator, UniquenessDomain},
    config::InstitutionConfig,
    currency::Currency,
    customer::{
        Customer, MEMBERSHIP_NUMBER_LENGTH, Username, insert_customer, validate_email,
        validate_full_name,
    },
};

/// A validated request to open a customer and their accounts.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomer {
    /// The unique username of the customer.
    pub username: Username,
    /// The trimmed, non-empty full name.
    pub full_name: String,
    /// The trimmed email address.
    pub email: String,
    /// Every account is opened in this currency.
    pub currency: Currency,
    /// One account is opened per entry, in order.
    pub account_kinds: Vec<AccountKind>,
}

impl NewCustomer {
    /// Validate the raw values of a customer request.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::InvalidUsername],
    /// [Error::EmptyFullName], [Error::InvalidEmail] or
    /// [Error::NoAccountsRequested] for the first invalid value.
    pub fn new(
        username: &str,
        full_name: &str,
        email: &str,
        currency: Currency,
        account_kinds: Vec<AccountKind>,
    ) -> Result<Self, Error> {
        let username = Username::new(username)?;
        let full_name = validate_full_name(full_name)?;
        let email = validate_email(email)?;

        if account_kinds.is_empty() {
            return Err(Error::NoAccountsRequested);
        }

        Ok(Self {
            username,
            full_name,
            email,
            currency,
            account_kinds,
        })
    }
}

/// A customer and the accounts opened for them.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionedCustomer {
    /// The inserted customer row.
    pub customer: Customer,
    /// The opened accounts, in the order they were requested.
    pub accounts: Vec<Account>,
}

/// The codes every account of one currency shares for a customer.
enum SharedCodes {
    Uk { sort_code: String },
    Eur,
    Us { routing_number: String },
}

/// Create a customer and open their accounts with freshly allocated
/// identifiers.
///
/// Everything happens in one transaction. The membership number is allocated
/// first, then the sort code or routing number for the currency, and finally
/// the account number and IBAN of each account. Allocation checks see the
/// rows inserted earlier in the transaction, so accounts opened together never
/// collide with each other.
///
/// If any step fails nothing is written.
///
/// # Errors
///
/// This function will return a:
/// - [Error::NoAccountsRequested] if no account kinds were given,
/// - [Error::DuplicateUsername] if the username is taken,
/// - [Error::AllocationFailed] if an identifier could not be allocated,
/// - [Error::IdentifierConflict] if the database rejected an identifier,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn provision_customer<D: DigitSource>(
    new_customer: &NewCustomer,
    institutions: &InstitutionConfig,
    digits: D,
    connection: &Connection,
) -> Result<ProvisionedCustomer, Error> {
    if new_customer.account_kinds.is_empty() {
        return Err(Error::NoAccountsRequested);
    }

    let transaction = connection.unchecked_transaction()?;
    let mut allocator = IdentifierAllocator::new(&transaction, institutions, digits);
    let today = OffsetDateTime::now_utc().date();

    let membership_number =
        allocator.numeric_id(UniquenessDomain::MembershipNumber, MEMBERSHIP_NUMBER_LENGTH)?;
    let customer = insert_customer(
        &new_customer.username,
        &new_customer.full_name,
        &new_customer.email,
        &membership_number,
        today,
        &transaction,
    )?;

    let currency = new_customer.currency;
    let shared_codes = match currency {
        Currency::Gbp => SharedCodes::Uk {
            sort_code: allocator.sort_code()?,
        },
        Currency::Eur => SharedCodes::Eur,
        Currency::Usd => SharedCodes::Us {
            routing_number: allocator.routing_number()?,
        },
    };

    let mut accounts = Vec::with_capacity(new_customer.account_kinds.len());

    for &kind in &new_customer.account_kinds {
        let account_number =
            allocator.numeric_id(UniquenessDomain::AccountNumber, currency.account_number_length())?;

        let (iban, sort_code, routing_number) = match &shared_codes {
            SharedCodes::Uk { sort_code } => (
                allocator.uk_iban(sort_code, &account_number)?,
                Some(sort_code.as_str()),
                None,
            ),
            SharedCodes::Eur => (allocator.eur_iban(&account_number)?, None, None),
            SharedCodes::Us { routing_number } => (
                allocator.us_iban(routing_number, &account_number)?,
                None,
                Some(routing_number.as_str()),
            ),
        };

        let account = insert_account(
            &NewAccount {
                customer_id: customer.id,
                kind,
                currency,
                account_number: &account_number,
                iban: &iban,
                sort_code,
                routing_number,
                bic: institutions.bic_for(currency),
                opened_on: today,
            },
            &transaction,
        )?;

        accounts.push(account);
    }

    drop(allocator);
    transaction.commit()?;

    tracing::info!(
        "provisioned customer {} with {} {currency} account(s)",
        customer.id,
        accounts.len()
    );

    Ok(ProvisionedCustomer { customer, accounts })
}

#[cfg(test)]
mod provision_customer_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        account::{AccountKind, AccountStatus},
        allocator::{AllocationError, CycleDigits, ThreadRandom, UniquenessDomain},
        config::InstitutionConfig,
        currency::Currency,
        customer::{Username, get_customer},
        db::initialize,
    };

    use super::{NewCustomer, provision_customer};

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().expect("Could not open in-memory database");
        initialize(&connection).expect("Could not initialize database");
        connection
    }

    fn new_customer(username: &str, currency: Currency, kinds: &[AccountKind]) -> NewCustomer {
        NewCustomer {
            username: Username::new_unchecked(username),
            full_name: "Test Customer".to_owned(),
            email: "test@example.com".to_owned(),
            currency,
            account_kinds: kinds.to_vec(),
        }
    }

    fn count_rows(connection: &Connection, table: &str) -> i64 {
        connection
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn usd_pair_shares_routing_number() {
        let connection = get_test_connection();
        let institutions = InstitutionConfig::default();

        let provisioned = provision_customer(
            &new_customer(
                "alice",
                Currency::Usd,
                &[AccountKind::Checking, AccountKind::Savings],
            ),
            &institutions,
            ThreadRandom,
            &connection,
        )
        .expect("Could not provision customer");

        let [checking, savings] = provisioned.accounts.as_slice() else {
            panic!("want 2 accounts, got {}", provisioned.accounts.len());
        };
        assert_ne!(checking.account_number, savings.account_number);
        assert_ne!(checking.iban, savings.iban);
        assert!(checking.routing_number.is_some());
        assert_eq!(checking.routing_number, savings.routing_number);
        assert_eq!(checking.kind, AccountKind::Checking);
        assert_eq!(savings.kind, AccountKind::Savings);

        for account in &provisioned.accounts {
            assert_eq!(account.iban.len(), 23);
            assert!(account.iban.starts_with("US"));
            assert_eq!(account.account_number.len(), 10);
            assert_eq!(&account.iban[4..13], checking.routing_number.as_deref().unwrap());
            assert_eq!(&account.iban[13..], account.account_number);
            assert_eq!(account.bic, "MOCKUS33");
            assert_eq!(account.status, AccountStatus::Active);
            assert_eq!(account.balance, 0);
            assert_eq!(account.sort_code, None);
        }
    }

    #[test]
    fn gbp_accounts_share_sort_code() {
        let connection = get_test_connection();
        let institutions = InstitutionConfig::default();

        let provisioned = provision_customer(
            &new_customer(
                "bob",
                Currency::Gbp,
                &[AccountKind::Checking, AccountKind::Savings],
            ),
            &institutions,
            ThreadRandom,
            &connection,
        )
        .expect("Could not provision customer");

        let sort_code = provisioned.accounts[0]
            .sort_code
            .clone()
            .expect("want a sort code on GBP accounts");
        assert!(sort_code.starts_with("90"));
        for account in &provisioned.accounts {
            assert_eq!(account.sort_code.as_deref(), Some(sort_code.as_str()));
            assert_eq!(account.iban.len(), 22);
            assert_eq!(&account.iban[4..8], "MOCK");
            assert_eq!(&account.iban[8..14], sort_code);
            assert_eq!(&account.iban[14..], account.account_number);
            assert_eq!(account.routing_number, None);
        }
    }

    #[test]
    fn eur_accounts_have_no_shared_codes() {
        let connection = get_test_connection();
        let institutions = InstitutionConfig::default();

        let provisioned = provision_customer(
            &new_customer("carol", Currency::Eur, &[AccountKind::Savings]),
            &institutions,
            ThreadRandom,
            &connection,
        )
        .expect("Could not provision customer");

        let account = &provisioned.accounts[0];
        assert_eq!(account.sort_code, None);
        assert_eq!(account.routing_number, None);
        assert_eq!(&account.iban[..2], "DE");
        assert_eq!(&account.iban[4..12], "50090001");
        assert_eq!(account.bic, "MOCKDEFF");
    }

    #[test]
    fn stores_customer_with_membership_number() {
        let connection = get_test_connection();
        let institutions = InstitutionConfig::default();

        let provisioned = provision_customer(
            &new_customer("dave", Currency::Gbp, &[AccountKind::Checking]),
            &institutions,
            ThreadRandom,
            &connection,
        )
        .expect("Could not provision customer");

        let customer = get_customer(provisioned.customer.id, &connection).unwrap();
        assert_eq!(customer, provisioned.customer);
        assert_eq!(customer.membership_number.len(), 10);
        assert_ne!(&customer.membership_number[..1], "0");
    }

    #[test]
    fn requires_at_least_one_account() {
        let connection = get_test_connection();

        let got = provision_customer(
            &new_customer("erin", Currency::Gbp, &[]),
            &InstitutionConfig::default(),
            ThreadRandom,
            &connection,
        );

        assert_eq!(got, Err(Error::NoAccountsRequested));
        assert_eq!(count_rows(&connection, "users"), 0);
    }

    #[test]
    fn duplicate_username_writes_nothing() {
        let connection = get_test_connection();
        let institutions = InstitutionConfig::default();
        provision_customer(
            &new_customer("frank", Currency::Gbp, &[AccountKind::Checking]),
            &institutions,
            ThreadRandom,
            &connection,
        )
        .unwrap();

        let got = provision_customer(
            &new_customer("frank", Currency::Gbp, &[AccountKind::Checking]),
            &institutions,
            ThreadRandom,
            &connection,
        );

        assert_eq!(got, Err(Error::DuplicateUsername("frank".to_owned())));
        assert_eq!(count_rows(&connection, "users"), 1);
        assert_eq!(count_rows(&connection, "accounts"), 1);
    }

    #[test]
    fn allocation_failure_rolls_back_everything() {
        let connection = get_test_connection();
        let institutions = InstitutionConfig::default();
        // The source always yields 5, so the second account gets the same
        // account number as the first and can never find a free one.
        let got = provision_customer(
            &new_customer(
                "grace",
                Currency::Eur,
                &[AccountKind::Checking, AccountKind::Savings],
            ),
            &institutions,
            CycleDigits::new(&[5]),
            &connection,
        );

        assert_eq!(
            got,
            Err(Error::AllocationFailed(AllocationError::Exhausted(
                UniquenessDomain::AccountNumber
            )))
        );
        assert_eq!(count_rows(&connection, "users"), 0);
        assert_eq!(count_rows(&connection, "accounts"), 0);
    }

    #[test]
    fn customers_never_share_codes() {
        let connection = get_test_connection();
        let institutions = InstitutionConfig::default();

        let mut sort_codes = Vec::new();
        for i in 0..20 {
            let provisioned = provision_customer(
                &new_customer(&format!("user{i}"), Currency::Gbp, &[AccountKind::Checking]),
                &institutions,
                ThreadRandom,
                &connection,
            )
            .expect("Could not provision customer");

            sort_codes.push(provisioned.accounts[0].sort_code.clone().unwrap());
        }

        let mut unique = sort_codes.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), sort_codes.len());
    }
}

#[cfg(test)]
mod new_customer_tests {
    use crate::{Error, account::AccountKind, currency::Currency};

    use super::NewCustomer;

    #[test]
    fn validates_fields() {
        let got = NewCustomer::new(
            " alice ",
            " Alice Smith ",
            "alice@example.com",
            Currency::Gbp,
            vec![AccountKind::Checking],
        )
        .expect("Could not validate customer");

        assert_eq!(got.username.as_ref(), "alice");
        assert_eq!(got.full_name, "Alice Smith");
    }

    #[test]
    fn rejects_no_accounts() {
        let got = NewCustomer::new(
            "alice",
            "Alice Smith",
            "alice@example.com",
            Currency::Gbp,
            vec![],
        );

        assert_eq!(got, Err(Error::NoAccountsRequested));
    }

    #[test]
    fn rejects_bad_email() {
        let got = NewCustomer::new(
            "alice",
            "Alice Smith",
            "alice",
            Currency::Gbp,
            vec![AccountKind::Checking],
        );

        assert_eq!(got, Err(Error::InvalidEmail("alice".to_owned())));
    }
}
