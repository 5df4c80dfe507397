//! Customer deletion endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    customer::{CustomerId, delete_customer},
};

/// The state needed for deleting a customer.
#[derive(Debug, Clone)]
pub struct DeleteCustomerEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteCustomerEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handle customer deletion. Returns success alert or error.
pub async fn delete_customer_endpoint(
    Path(customer_id): Path<CustomerId>,
    State(state): State<DeleteCustomerEndpointState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_customer(customer_id, &connection) {
        Ok(_) => Alert::Success {
            message: "Customer deleted successfully".to_owned(),
            details: "Their accounts and ledgers were deleted too.".to_owned(),
        }
        .into_response(),
        Err(Error::DeleteMissingCustomer) => Error::DeleteMissingCustomer.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting customer {customer_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}
