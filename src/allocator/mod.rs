//! Allocation of unique account identifiers.
//!
//! Every generator follows the same shape: synthesize a candidate, check
//! whether its uniqueness domain already holds it, and retry with a fresh
//! candidate up to [MAX_ATTEMPTS] times. The allocator only reads from the
//! database, the caller is responsible for inserting the accepted values.

mod checksum;
mod digits;
mod domain;
mod iban;
mod retry;

use rusqlite::Connection;

use crate::config::InstitutionConfig;

pub use digits::{DigitSource, ThreadRandom, random_digits, random_segment};
pub use domain::{UniquenessDomain, value_exists};
pub use iban::{EUR_SEGMENT_WIDTH, IbanFormat, UK_SEGMENT_WIDTH, US_SEGMENT_WIDTH};
pub use retry::{Allocation, MAX_ATTEMPTS, allocate_unique};

#[cfg(test)]
pub(crate) use digits::CycleDigits;

/// The length of a US routing number.
pub const ROUTING_NUMBER_LENGTH: usize = 9;

/// The number of digits after the institution prefix of a sort code.
pub const SORT_CODE_SUFFIX_LENGTH: usize = 4;

/// The reasons an identifier could not be allocated.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AllocationError {
    /// The uniqueness check could not be run. This is not retried.
    #[error("could not check {domain} for an existing value: {source}")]
    QueryFailure {
        /// The domain that was being checked.
        domain: UniquenessDomain,
        /// The error returned by SQLite.
        source: rusqlite::Error,
    },

    /// Every candidate tried already existed in the domain.
    #[error("no unique value for {0} found after {MAX_ATTEMPTS} attempts")]
    Exhausted(UniquenessDomain),
}

/// Generates identifiers that do not collide with existing rows.
///
/// The institution constants are injected so that tests can use fictitious
/// banks. `connection` may be a [rusqlite::Transaction], in which case rows
/// inserted earlier in the same transaction count as collisions.
pub struct IdentifierAllocator<'a, D: DigitSource> {
    connection: &'a Connection,
    institutions: &'a InstitutionConfig,
    digits: D,
}

impl<'a, D: DigitSource> IdentifierAllocator<'a, D> {
    pub fn new(connection: &'a Connection, institutions: &'a InstitutionConfig, digits: D) -> Self {
        Self {
            connection,
            institutions,
            digits,
        }
    }

    /// Allocate a numeric string of `length` digits that is unused in `domain`.
    ///
    /// The first digit is never zero when `length` is greater than one.
    ///
    /// # Errors
    ///
    /// Returns [AllocationError::QueryFailure] if the uniqueness check fails,
    /// or [AllocationError::Exhausted] if no unused value was found.
    pub fn numeric_id(
        &mut self,
        domain: UniquenessDomain,
        length: usize,
    ) -> Result<String, AllocationError> {
        let digits = &mut self.digits;

        find_unused(self.connection, domain, |_| random_digits(digits, length))
    }

    /// Allocate a 6 digit sort code made of the configured 2 digit prefix and
    /// a random 4 digit suffix.
    ///
    /// Only 10,000 sort codes exist per prefix, so this becomes likely to fail
    /// as the space fills up.
    ///
    /// # Errors
    ///
    /// See [IdentifierAllocator::numeric_id].
    pub fn sort_code(&mut self) -> Result<String, AllocationError> {
        let prefix = self.institutions.gbp.sort_code_prefix.as_str();
        let digits = &mut self.digits;

        find_unused(self.connection, UniquenessDomain::SortCode, |_| {
            format!("{prefix}{}", random_segment(digits, SORT_CODE_SUFFIX_LENGTH))
        })
    }

    /// Allocate a 9 digit routing number.
    ///
    /// # Errors
    ///
    /// See [IdentifierAllocator::numeric_id].
    pub fn routing_number(&mut self) -> Result<String, AllocationError> {
        self.numeric_id(UniquenessDomain::RoutingNumber, ROUTING_NUMBER_LENGTH)
    }

    /// Allocate an IBAN-shaped identifier in `format`.
    ///
    /// The first candidate uses `seed_segment` as the account segment, which
    /// lets the IBAN embed the account number. On a collision only the
    /// account segment is regenerated.
    ///
    /// # Errors
    ///
    /// See [IdentifierAllocator::numeric_id].
    pub fn iban(
        &mut self,
        format: &IbanFormat,
        seed_segment: &str,
    ) -> Result<String, AllocationError> {
        let width = format.segment_width();
        let digits = &mut self.digits;

        find_unused(self.connection, UniquenessDomain::Iban, |attempt| {
            if attempt == 0 {
                format.compose(seed_segment)
            } else {
                format.compose(&random_segment(digits, width))
            }
        })
    }

    /// Allocate a `GB` IBAN under `sort_code`.
    ///
    /// # Errors
    ///
    /// See [IdentifierAllocator::numeric_id].
    pub fn uk_iban(
        &mut self,
        sort_code: &str,
        seed_segment: &str,
    ) -> Result<String, AllocationError> {
        let format = IbanFormat::Uk {
            bank_code: self.institutions.gbp.bank_code().to_owned(),
            sort_code: sort_code.to_owned(),
        };

        self.iban(&format, seed_segment)
    }

    /// Allocate a euro area IBAN with the configured country and bank code.
    ///
    /// # Errors
    ///
    /// See [IdentifierAllocator::numeric_id].
    pub fn eur_iban(&mut self, seed_segment: &str) -> Result<String, AllocationError> {
        let format = IbanFormat::Eur {
            country_code: self.institutions.eur.country_code.clone(),
            bank_code: self.institutions.eur.bank_code.clone(),
        };

        self.iban(&format, seed_segment)
    }

    /// Allocate a `US` IBAN under `routing_number`.
    ///
    /// # Errors
    ///
    /// See [IdentifierAllocator::numeric_id].
    pub fn us_iban(
        &mut self,
        routing_number: &str,
        seed_segment: &str,
    ) -> Result<String, AllocationError> {
        let format = IbanFormat::Us {
            routing_number: routing_number.to_owned(),
        };

        self.iban(&format, seed_segment)
    }
}

fn find_unused(
    connection: &Connection,
    domain: UniquenessDomain,
    generate: impl FnMut(usize) -> String,
) -> Result<String, AllocationError> {
    let mut attempts = 0;
    let allocation = allocate_unique(generate, |candidate| {
        attempts += 1;
        value_exists(domain, candidate, connection)
    })
    .map_err(|source| AllocationError::QueryFailure { domain, source })?;

    match allocation {
        Allocation::Accepted(value) => {
            tracing::debug!("allocated {domain} value after {attempts} attempt(s)");
            Ok(value)
        }
        Allocation::Exhausted => {
            tracing::warn!("could not find an unused {domain} value after {attempts} attempts");
            Err(AllocationError::Exhausted(domain))
        }
    }
}

#[cfg(test)]
mod identifier_allocator_tests {
    use rusqlite::Connection;

    use crate::{config::InstitutionConfig, db::initialize};

    use super::{
        AllocationError, CycleDigits, IdentifierAllocator, ThreadRandom, UniquenessDomain,
        value_exists,
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().expect("Could not open in-memory database");
        initialize(&connection).expect("Could not initialize database");
        connection
    }

    fn insert_user(connection: &Connection, username: &str, membership_number: &str) -> i64 {
        connection
            .execute(
                "INSERT INTO users (username, full_name, email, membership_number, created_on)
                VALUES (?1, 'Test User', 'test@example.com', ?2, '2025-01-01')",
                (username, membership_number),
            )
            .expect("Could not insert test user");

        connection.last_insert_rowid()
    }

    fn insert_account(
        connection: &Connection,
        user_id: i64,
        account_number: &str,
        iban: &str,
        sort_code: Option<&str>,
    ) {
        connection
            .execute(
                "INSERT INTO accounts (user_id, kind, currency, status, account_number, iban,
                    sort_code, routing_number, bic, balance, opened_on)
                VALUES (?1, 'checking', 'GBP', 'active', ?2, ?3, ?4, NULL, 'MOCKGB2L', 0,
                    '2025-01-01')",
                (user_id, account_number, iban, sort_code),
            )
            .expect("Could not insert test account");
    }

    #[test]
    fn numeric_id_has_requested_length_without_leading_zero() {
        let connection = get_test_connection();
        let institutions = InstitutionConfig::default();
        let mut allocator = IdentifierAllocator::new(&connection, &institutions, ThreadRandom);

        for length in [2, 4, 8, 10] {
            let id = allocator
                .numeric_id(UniquenessDomain::AccountNumber, length)
                .expect("Could not allocate ID");

            assert_eq!(id.len(), length);
            assert!(!id.starts_with('0'), "got {id} with a leading zero");
        }
    }

    #[test]
    fn numeric_id_skips_existing_values() {
        let connection = get_test_connection();
        let user_id = insert_user(&connection, "ada", "5000000000");
        insert_account(&connection, user_id, "11111111", "GB00TAKEN", None);
        let institutions = InstitutionConfig::default();
        let digits = CycleDigits::new(&[1, 1, 1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2]);
        let mut allocator = IdentifierAllocator::new(&connection, &institutions, digits);

        let id = allocator
            .numeric_id(UniquenessDomain::AccountNumber, 8)
            .expect("Could not allocate ID");

        assert_eq!(id, "22222222");
        assert_eq!(
            value_exists(UniquenessDomain::AccountNumber, &id, &connection),
            Ok(false)
        );
    }

    #[test]
    fn numeric_id_exhausts_full_single_digit_domain() {
        let connection = get_test_connection();
        for digit in 0..=9 {
            insert_user(&connection, &format!("user{digit}"), &digit.to_string());
        }
        let institutions = InstitutionConfig::default();
        let mut allocator = IdentifierAllocator::new(&connection, &institutions, ThreadRandom);

        let got = allocator.numeric_id(UniquenessDomain::MembershipNumber, 1);

        assert_eq!(
            got,
            Err(AllocationError::Exhausted(
                UniquenessDomain::MembershipNumber
            ))
        );
    }

    #[test]
    fn query_failure_is_reported_distinctly() {
        let connection = Connection::open_in_memory().unwrap();
        let institutions = InstitutionConfig::default();
        let mut allocator = IdentifierAllocator::new(&connection, &institutions, ThreadRandom);

        let got = allocator.numeric_id(UniquenessDomain::AccountNumber, 8);

        assert!(
            matches!(
                got,
                Err(AllocationError::QueryFailure {
                    domain: UniquenessDomain::AccountNumber,
                    ..
                })
            ),
            "want query failure, got {got:?}"
        );
    }

    #[test]
    fn sort_code_uses_configured_prefix() {
        let connection = get_test_connection();
        let institutions = InstitutionConfig::default();
        let mut allocator = IdentifierAllocator::new(&connection, &institutions, ThreadRandom);

        let sort_code = allocator.sort_code().expect("Could not allocate sort code");

        assert_eq!(sort_code.len(), 6);
        assert!(sort_code.starts_with(&institutions.gbp.sort_code_prefix));
        assert!(sort_code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn sort_code_exhausts_when_prefix_space_is_full() {
        let connection = get_test_connection();
        let institutions = InstitutionConfig::default();
        let prefix = institutions.gbp.sort_code_prefix.clone();
        let user_id = insert_user(&connection, "ada", "5000000000");
        {
            let transaction = connection.unchecked_transaction().unwrap();
            for suffix in 0..10_000 {
                insert_account(
                    &transaction,
                    user_id,
                    &format!("1{suffix:07}"),
                    &format!("GB00MOCK{suffix:04}"),
                    Some(&format!("{prefix}{suffix:04}")),
                );
            }
            transaction.commit().unwrap();
        }
        let mut allocator = IdentifierAllocator::new(&connection, &institutions, ThreadRandom);

        let got = allocator.sort_code();

        assert_eq!(got, Err(AllocationError::Exhausted(UniquenessDomain::SortCode)));
    }

    #[test]
    fn uk_iban_structure() {
        let connection = get_test_connection();
        let institutions = InstitutionConfig::default();
        let bank_code = institutions.gbp.bank_code().to_owned();
        let mut allocator = IdentifierAllocator::new(&connection, &institutions, ThreadRandom);

        let iban = allocator
            .uk_iban("900123", "00000042")
            .expect("Could not allocate IBAN");

        assert_eq!(iban.len(), 22);
        assert_eq!(&iban[..2], "GB");
        assert_eq!(&iban[4..8], bank_code);
        assert_eq!(&iban[8..14], "900123");
        assert_eq!(&iban[14..], "00000042");
    }

    #[test]
    fn iban_regenerates_segment_on_collision() {
        let connection = get_test_connection();
        let institutions = InstitutionConfig::default();
        let taken = {
            let mut allocator = IdentifierAllocator::new(&connection, &institutions, ThreadRandom);
            allocator.uk_iban("900123", "00000042").unwrap()
        };
        let user_id = insert_user(&connection, "ada", "5000000000");
        insert_account(&connection, user_id, "12345678", &taken, Some("900123"));
        let mut allocator =
            IdentifierAllocator::new(&connection, &institutions, CycleDigits::new(&[7]));

        let iban = allocator
            .uk_iban("900123", "00000042")
            .expect("Could not allocate IBAN");

        assert_ne!(iban, taken);
        assert_eq!(&iban[..2], "GB");
        assert_eq!(&iban[4..14], &taken[4..14]);
        assert_eq!(&iban[14..], "77777777");
    }

    #[test]
    fn eur_iban_uses_configured_bank() {
        let connection = get_test_connection();
        let institutions = InstitutionConfig::default();
        let mut allocator = IdentifierAllocator::new(&connection, &institutions, ThreadRandom);

        let iban = allocator
            .eur_iban("1234567890")
            .expect("Could not allocate IBAN");

        assert_eq!(&iban[..2], institutions.eur.country_code);
        assert_eq!(&iban[4..12], institutions.eur.bank_code);
        assert_eq!(&iban[12..], "1234567890");
    }

    #[test]
    fn us_iban_embeds_routing_number() {
        let connection = get_test_connection();
        let institutions = InstitutionConfig::default();
        let mut allocator = IdentifierAllocator::new(&connection, &institutions, ThreadRandom);

        let routing_number = allocator
            .routing_number()
            .expect("Could not allocate routing number");
        let iban = allocator
            .us_iban(&routing_number, "1234567890")
            .expect("Could not allocate IBAN");

        assert_eq!(routing_number.len(), 9);
        assert_eq!(&iban[..2], "US");
        assert_eq!(&iban[4..13], routing_number);
        assert_eq!(&iban[13..], "1234567890");
    }
}
