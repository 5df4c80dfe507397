//! Freezing, reactivating and closing accounts.

use rusqlite::Connection;

use crate::{
    Error,
    account::{Account, AccountId, AccountStatus, get_account},
};

/// Change the status of an account.
///
/// A closed account can never change status, and an account can only be
/// closed once its balance is zero. Setting the status an account already has
/// changes nothing.
///
/// # Errors
///
/// This function will return a:
/// - [Error::UpdateMissingAccount] if the account does not exist,
/// - [Error::AccountClosed] if the account is already closed,
/// - [Error::NonZeroBalance] if the account is being closed with money in it,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn set_account_status(
    account_id: AccountId,
    status: AccountStatus,
    connection: &Connection,
) -> Result<Account, Error> {
    let transaction = connection.unchecked_transaction()?;

    let mut account = get_account(account_id, &transaction).map_err(|error| match error {
        Error::NotFound => Error::UpdateMissingAccount,
        error => error,
    })?;

    if account.status == status {
        return Ok(account);
    }

    if account.status == AccountStatus::Closed {
        return Err(Error::AccountClosed);
    }

    if status == AccountStatus::Closed && account.balance != 0 {
        return Err(Error::NonZeroBalance);
    }

    transaction.execute(
        "UPDATE accounts SET status = ?1 WHERE id = ?2",
        (status.as_str(), account_id),
    )?;
    transaction.commit()?;

    tracing::info!(
        "account {account_id} changed from {} to {status}",
        account.status
    );
    account.status = status;

    Ok(account)
}

#[cfg(test)]
mod set_account_status_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        account::{
            AccountStatus, Adjustment, Direction, adjust_balance, get_account,
            ledger::test_support::insert_test_account,
        },
        db::initialize,
    };

    use super::set_account_status;

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().expect("Could not open in-memory database");
        initialize(&connection).expect("Could not initialize database");
        connection
    }

    #[test]
    fn can_freeze_and_reactivate() {
        let connection = get_test_connection();
        let account_id = insert_test_account(&connection);

        let frozen = set_account_status(account_id, AccountStatus::Frozen, &connection)
            .expect("Could not freeze account");
        assert_eq!(frozen.status, AccountStatus::Frozen);

        let active = set_account_status(account_id, AccountStatus::Active, &connection)
            .expect("Could not reactivate account");
        assert_eq!(active.status, AccountStatus::Active);
        assert_eq!(
            get_account(account_id, &connection).unwrap().status,
            AccountStatus::Active
        );
    }

    #[test]
    fn same_status_is_no_op() {
        let connection = get_test_connection();
        let account_id = insert_test_account(&connection);

        let got = set_account_status(account_id, AccountStatus::Active, &connection);

        assert_eq!(got.map(|account| account.status), Ok(AccountStatus::Active));
    }

    #[test]
    fn closing_requires_zero_balance() {
        let connection = get_test_connection();
        let account_id = insert_test_account(&connection);
        adjust_balance(
            account_id,
            &Adjustment {
                direction: Direction::Credit,
                amount: 1,
                description: "Interest".to_owned(),
            },
            &connection,
        )
        .unwrap();

        let got = set_account_status(account_id, AccountStatus::Closed, &connection);

        assert_eq!(got, Err(Error::NonZeroBalance));
        assert_eq!(
            get_account(account_id, &connection).unwrap().status,
            AccountStatus::Active
        );
    }

    #[test]
    fn closed_is_terminal() {
        let connection = get_test_connection();
        let account_id = insert_test_account(&connection);
        set_account_status(account_id, AccountStatus::Closed, &connection)
            .expect("Could not close account");

        let got = set_account_status(account_id, AccountStatus::Active, &connection);

        assert_eq!(got, Err(Error::AccountClosed));
    }

    #[test]
    fn closed_account_rejects_funds() {
        let connection = get_test_connection();
        let account_id = insert_test_account(&connection);
        set_account_status(account_id, AccountStatus::Closed, &connection).unwrap();

        let got = adjust_balance(
            account_id,
            &Adjustment {
                direction: Direction::Credit,
                amount: 100,
                description: "Deposit".to_owned(),
            },
            &connection,
        );

        assert_eq!(got, Err(Error::AccountNotActive(AccountStatus::Closed)));
    }

    #[test]
    fn missing_account_is_update_missing_account() {
        let connection = get_test_connection();

        let got = set_account_status(999, AccountStatus::Frozen, &connection);

        assert_eq!(got, Err(Error::UpdateMissingAccount));
    }
}
