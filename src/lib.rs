#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use crate::config::{ChatFairing, ConfigFairing, DatabaseFairing};
use crate::logging::LoggerFairing;

pub mod api;
pub mod chatbot;
pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod model;

pub use config::Config;

/// Build the server. Configuration, the database connection and the
/// chatbot rules are all loaded during ignition.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .attach(ChatFairing)
        .mount("/", api::routes())
        .register("/", api::catchers())
}

/// Build the server against an existing connection and a specific database.
#[cfg(test)]
pub(crate) fn rocket_for_db(client: mongodb::Client, db_name: &str) -> Rocket<Build> {
    use rocket::fairing::AdHoc;

    let db_name = db_name.to_string();
    rocket::build()
        .attach(ConfigFairing)
        .attach(AdHoc::try_on_ignite("Test database", move |rocket| async move {
            config::prepare_database(rocket, client, &db_name).await
        }))
        .attach(ChatFairing)
        .mount("/", api::routes())
        .register("/", api::catchers())
}

/// Connect to the database named by `db_uri` in the Rocket config.
#[cfg(test)]
pub(crate) async fn db_client() -> mongodb::Client {
    let db_uri = rocket::Config::figment()
        .extract_inner::<String>("db_uri")
        .expect("`db_uri` not set");
    mongodb::Client::with_uri_str(&db_uri)
        .await
        .unwrap_or_else(|e| panic!("Could not connect to database at {db_uri}: {e}"))
}

/// A random database name, so tests do not collide.
#[cfg(test)]
pub(crate) fn database() -> String {
    let random: u32 = rand::random();
    format!("test{random}")
}
