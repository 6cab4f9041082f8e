#[macro_use]
extern crate rocket;

mod api;
mod database;
mod db;
mod env;
mod error;
mod models;
mod telemetry;
#[cfg(test)]
mod test;
mod validation;

use api::{
    api_create_session, api_create_user, api_create_vocab, api_delete_session, api_delete_user,
    api_delete_vocab, api_get_sessions, api_get_users, api_get_vocab, api_update_session,
    api_update_user, bad_request_api, health, not_found_api, unprocessable_api,
};
use database::{Store, initialize_database};
use env::{AppConfig, load_environment};
use error::AppError;
use rocket::{Build, Rocket};
use telemetry::{TelemetryFairing, init_tracing};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Rocket(Box<rocket::Error>),
    #[error("Application error: {0}")]
    App(#[from] AppError),
}

impl From<rocket::Error> for Error {
    fn from(value: rocket::Error) -> Self {
        Error::Rocket(Box::new(value))
    }
}

#[rocket::main]
async fn main() -> Result<(), Error> {
    let env_files = load_environment()?;
    let _telemetry = init_tracing()?;

    for env_file in env_files {
        info!("Loaded environment from: {}", env_file);
    }

    let config = AppConfig::from_env();
    let store = Store::new(&config.database_url)?;

    info!(database_url = %config.database_url, "Running database initialization...");
    initialize_database(&store).await?;
    info!("Database initialization completed successfully");

    let _rocket = init_rocket(store).launch().await?;

    Ok(())
}

pub fn init_rocket(store: Store) -> Rocket<Build> {
    info!("Starting onda sonora practice tracker");

    rocket::build()
        .manage(store)
        .mount(
            "/api",
            routes![
                health,
                api_get_users,
                api_create_user,
                api_update_user,
                api_delete_user,
                api_get_sessions,
                api_create_session,
                api_update_session,
                api_delete_session,
                api_get_vocab,
                api_create_vocab,
                api_delete_vocab,
            ],
        )
        .register(
            "/api",
            catchers![bad_request_api, not_found_api, unprocessable_api],
        )
        .attach(TelemetryFairing)
}
