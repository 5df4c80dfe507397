//! Defines the endpoint for freezing, reactivating and closing an account.
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
    account::{AccountId, AccountStatus, set_account_status},
    endpoints,
};

/// The state needed to change the status of an account.
#[derive(Debug, Clone)]
pub struct AccountStatusState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountStatusState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    status: String,
}

pub async fn account_status_endpoint(
    State(state): State<AccountStatusState>,
    Path(account_id): Path<AccountId>,
    Form(form): Form<StatusForm>,
) -> Response {
    let status = match form.status.parse::<AccountStatus>() {
        Ok(status) => status,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match set_account_status(account_id, status, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::format_endpoint(endpoints::ACCOUNT_VIEW, account_id)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::warn!("Could not set status of account {account_id} to {status}: {error}");
            error.into_alert_response()
        }
    }
}
