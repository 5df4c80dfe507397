//! The state shared by every request handler.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, config::InstitutionConfig, db::initialize};

/// The state of the back-office server.
///
/// Handlers take the slice they need through `FromRef`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database holding customers, accounts and ledgers.
    pub db_connection: Arc<Mutex<Connection>>,

    /// The codes that identify this bank in each supported currency.
    pub institutions: Arc<InstitutionConfig>,
}

impl AppState {
    /// Wrap `db_connection` for sharing, creating any missing tables first.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the tables cannot be created.
    pub fn new(
        db_connection: Connection,
        institutions: Arc<InstitutionConfig>,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            institutions,
        })
    }
}
