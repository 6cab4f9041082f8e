use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::ConnectOptions;
use tracing::{debug, instrument};

use crate::error::AppError;

/// Handle to the SQLite file. Holds connection options only; every
/// operation opens its own connection and drops it when done, which
/// closes it on both the success and the error path.
#[derive(Debug, Clone)]
pub struct Store {
    options: SqliteConnectOptions,
}

impl Store {
    pub fn new(database_url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        Ok(Self { options })
    }

    #[instrument(skip(self))]
    pub async fn connect(&self) -> Result<SqliteConnection, AppError> {
        debug!(filename = %self.options.get_filename().display(), "Opening database connection");
        Ok(self.options.connect().await?)
    }
}
