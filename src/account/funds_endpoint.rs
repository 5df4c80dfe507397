//! Defines the endpoint for crediting and debiting an account.
use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    account::{AccountId, Adjustment, Direction, adjust_balance},
    endpoints,
};

/// The state needed to move funds in or out of an account.
#[derive(Debug, Clone)]
pub struct AccountFundsState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountFundsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FundsForm {
    direction: Direction,
    /// The amount in major units, e.g. dollars rather than cents.
    amount: f64,
    description: String,
}

pub async fn account_funds_endpoint(
    State(state): State<AccountFundsState>,
    Path(account_id): Path<AccountId>,
    Form(form): Form<FundsForm>,
) -> Response {
    let adjustment = match to_minor_units(form.amount) {
        Ok(amount) => Adjustment {
            direction: form.direction,
            amount,
            description: form.description.trim().to_owned(),
        },
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match adjust_balance(account_id, &adjustment, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::format_endpoint(endpoints::ACCOUNT_VIEW, account_id)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::warn!("Could not adjust balance of account {account_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// Convert an amount in major units to whole minor units, rounding to the nearest cent.
fn to_minor_units(amount: f64) -> Result<i64, Error> {
    let minor_units = (amount * 100.0).round();

    if !minor_units.is_finite() || minor_units < 1.0 || minor_units >= i64::MAX as f64 {
        return Err(Error::InvalidAmount);
    }

    Ok(minor_units as i64)
}

#[cfg(test)]
mod account_funds_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form,
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;

    use crate::{
        Error,
        account::{
            Direction, get_account, get_ledger_entries, ledger::test_support::insert_test_account,
        },
        db::initialize,
        endpoints::{self, format_endpoint},
        test_utils::{assert_hx_redirect, must_get_alert},
    };

    use super::{AccountFundsState, FundsForm, account_funds_endpoint, to_minor_units};

    fn get_state() -> (AccountFundsState, i64) {
        let connection = Connection::open_in_memory().expect("Could not open in-memory database");
        initialize(&connection).expect("Could not initialize database");
        let account_id = insert_test_account(&connection);

        (
            AccountFundsState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            account_id,
        )
    }

    #[tokio::test]
    async fn credit_redirects_to_account_page() {
        let (state, account_id) = get_state();
        let form = FundsForm {
            direction: Direction::Credit,
            amount: 19.99,
            description: "  Cash deposit ".to_owned(),
        };

        let response =
            account_funds_endpoint(State(state.clone()), Path(account_id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(
            &response,
            &format_endpoint(endpoints::ACCOUNT_VIEW, account_id),
        );

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_account(account_id, &connection).unwrap().balance, 1999);
        let entries = get_ledger_entries(account_id, &connection).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description, "Cash deposit");
    }

    #[tokio::test]
    async fn overdrawing_debit_returns_alert() {
        let (state, account_id) = get_state();
        let form = FundsForm {
            direction: Direction::Debit,
            amount: 5.0,
            description: "Withdrawal".to_owned(),
        };

        let response =
            account_funds_endpoint(State(state.clone()), Path(account_id), Form(form)).await;

        must_get_alert(response, StatusCode::BAD_REQUEST).await;

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_account(account_id, &connection).unwrap().balance, 0);
        assert!(get_ledger_entries(account_id, &connection).unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_account_returns_not_found() {
        let (state, _) = get_state();
        let form = FundsForm {
            direction: Direction::Credit,
            amount: 1.0,
            description: "Deposit".to_owned(),
        };

        let response = account_funds_endpoint(State(state), Path(404), Form(form)).await;

        must_get_alert(response, StatusCode::NOT_FOUND).await;
    }

    #[test]
    fn converts_to_minor_units() {
        assert_eq!(to_minor_units(12.34), Ok(1234));
        assert_eq!(to_minor_units(0.1 + 0.2), Ok(30));
        assert_eq!(to_minor_units(0.005), Ok(1));
    }

    #[test]
    fn rejects_amounts_below_one_cent() {
        assert_eq!(to_minor_units(0.0), Err(Error::InvalidAmount));
        assert_eq!(to_minor_units(0.004), Err(Error::InvalidAmount));
        assert_eq!(to_minor_units(-5.0), Err(Error::InvalidAmount));
        assert_eq!(to_minor_units(f64::NAN), Err(Error::InvalidAmount));
        assert_eq!(to_minor_units(f64::INFINITY), Err(Error::InvalidAmount));
    }
}
