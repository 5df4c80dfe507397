//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    account::AccountStatus, alert::Alert, allocator::AllocationError,
    internal_server_error::InternalServerError, not_found::NotFoundError,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// The institution config file is missing, malformed or has values of the
    /// wrong shape.
    #[error("invalid institution config: {0}")]
    InvalidInstitutionConfig(String),

    /// A currency code other than GBP, EUR or USD was given.
    #[error("\"{0}\" is not a supported currency")]
    UnsupportedCurrency(String),

    /// A string that does not name an account kind was read or submitted.
    #[error("\"{0}\" is not an account kind")]
    UnsupportedAccountKind(String),

    /// A string that does not name an account status was read or submitted.
    #[error("\"{0}\" is not an account status")]
    UnsupportedAccountStatus(String),

    /// The username is empty, too long or has characters that are not allowed.
    #[error("invalid username: {0}")]
    InvalidUsername(String),

    /// An empty string was given for a customer's full name.
    #[error("Full name cannot be empty")]
    EmptyFullName,

    /// The email address does not look like an email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// A customer was submitted without any accounts to open.
    #[error("at least one account must be opened")]
    NoAccountsRequested,

    /// The username already belongs to another customer.
    #[error("the username \"{0}\" already exists in the database")]
    DuplicateUsername(String),

    /// A unique identifier could not be generated for a new customer or
    /// account.
    ///
    /// The whole provisioning request is rolled back when this occurs.
    #[error("failed to generate a unique identifier: {0}")]
    AllocationFailed(AllocationError),

    /// The database rejected an identifier because another row already holds
    /// it. This happens when two requests allocate the same value at once.
    ///
    /// The string is the `table.column` of the identifier.
    #[error("the identifier in {0} is already in use")]
    IdentifierConflict(String),

    /// Tried to delete a customer that does not exist
    #[error("tried to delete a customer that is not in the database")]
    DeleteMissingCustomer,

    /// Tried to update an account that does not exist
    #[error("tried to update an account that is not in the database")]
    UpdateMissingAccount,

    /// A zero, negative or non-finite amount was given for a credit or debit.
    #[error("the amount must be a positive number")]
    InvalidAmount,

    /// A debit was larger than the account balance.
    #[error("the account balance is too low for this debit")]
    InsufficientFunds,

    /// Funds can only be moved in and out of active accounts.
    #[error("the account is {0}, funds can only be moved for active accounts")]
    AccountNotActive(AccountStatus),

    /// Closed accounts cannot change status.
    #[error("the account is closed")]
    AccountClosed,

    /// Accounts must be emptied before they can be closed.
    #[error("the account must have a zero balance before it can be closed")]
    NonZeroBalance,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed, and code 1811
            // when one of the uniqueness triggers aborted the statement.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if matches!(sql_error.extended_code, 2067 | 1811)
                    && desc.starts_with("UNIQUE constraint failed: ") =>
            {
                let column = desc.trim_start_matches("UNIQUE constraint failed: ");
                Error::IdentifierConflict(column.to_owned())
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<AllocationError> for Error {
    fn from(value: AllocationError) -> Self {
        Error::AllocationFailed(value)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::AllocationFailed(_) | Error::IdentifierConflict(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Failed to generate a unique identifier".to_owned(),
                    details: "The customer was not created and no accounts were opened. \
                        Check the server logs for more details."
                        .to_owned(),
                },
            ),
            Error::DuplicateUsername(username) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Duplicate Username".to_owned(),
                    details: format!(
                        "The username {username} is already taken. Choose a different username."
                    ),
                },
            ),
            Error::DeleteMissingCustomer => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete customer".to_owned(),
                    details: "The customer could not be found. \
                    Try refreshing the page to see if the customer has already been deleted."
                        .to_owned(),
                },
            ),
            Error::UpdateMissingAccount | Error::NotFound => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update account".to_owned(),
                    details: "The account could not be found.".to_owned(),
                },
            ),
            Error::InvalidAmount => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid amount".to_owned(),
                    details: "Enter an amount greater than zero.".to_owned(),
                },
            ),
            Error::InsufficientFunds => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Insufficient funds".to_owned(),
                    details: "The debit is larger than the account balance.".to_owned(),
                },
            ),
            Error::AccountNotActive(status) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Account is not active".to_owned(),
                    details: format!(
                        "The account is {status}. Set the account to active before moving funds."
                    ),
                },
            ),
            Error::AccountClosed => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Account is closed".to_owned(),
                    details: "Closed accounts cannot be reopened or changed.".to_owned(),
                },
            ),
            Error::NonZeroBalance => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Account still holds funds".to_owned(),
                    details: "Debit the remaining balance before closing the account.".to_owned(),
                },
            ),
            error @ (Error::UnsupportedCurrency(_)
            | Error::UnsupportedAccountKind(_)
            | Error::UnsupportedAccountStatus(_)
            | Error::InvalidUsername(_)
            | Error::EmptyFullName
            | Error::InvalidEmail(_)
            | Error::NoAccountsRequested) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid form data".to_owned(),
                    details: error.to_string(),
                },
            ),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);

                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Alert::Error {
                        message: "Something went wrong".to_owned(),
                        details:
                            "An unexpected error occurred, check the server logs for more details."
                                .to_owned(),
                    },
                )
            }
        };

        (status_code, alert.into_html()).into_response()
    }
}
