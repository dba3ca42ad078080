use chrono::Duration;
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::chatbot::ChatConfig;
use crate::model::{
    db::user::ensure_admin_exists,
    mongodb::{ensure_indexes_exist, Coll},
};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    auth_ttl: u32,
    // secrets
    jwt_secret: String,
    default_admin_password: String,
}

impl Config {
    /// Valid lifetime of auth token cookies in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// Secret key used to sign JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Password given to the default admin account if none exists.
    pub fn default_admin_password(&self) -> &str {
        &self.default_admin_password
    }
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the other fairings and control over error
/// messages.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
struct DbConfig {
    // secrets
    db_uri: String,
}

/// A fairing that loads the MongoDB config, connects to the database,
/// ensures indexes and a default admin exist, and places both a `Client`
/// and a `Database` into managed state.
///
/// Must be attached after [`ConfigFairing`].
pub struct DatabaseFairing;

#[rocket::async_trait]
impl Fairing for DatabaseFairing {
    fn info(&self) -> Info {
        Info {
            name: "MongoDB",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.figment().extract::<DbConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load database config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        info!("Loaded database config, connecting...");
        let client = match MongoClient::with_uri_str(config.db_uri).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return Err(rocket);
            }
        };
        prepare_database(rocket, client, &get_database_name()).await
    }
}

/// Set up the named database and put it into managed state.
pub(crate) async fn prepare_database(
    rocket: Rocket<Build>,
    client: MongoClient,
    db_name: &str,
) -> rocket::fairing::Result {
    let db = client.database(db_name);

    if let Err(e) = ensure_indexes_exist(&db).await {
        error!("Failed to create database indexes: {e}");
        return Err(rocket);
    }

    let Some(config) = rocket.state::<Config>() else {
        error!("Application config must be loaded before the database");
        return Err(rocket);
    };
    if let Err(e) = ensure_admin_exists(&Coll::from_db(&db), config.default_admin_password()).await
    {
        error!("Failed to ensure an admin exists: {e}");
        return Err(rocket);
    }
    info!("...database {db_name} online!");

    Ok(rocket.manage(client).manage(db))
}

/// Get the name of the database to use.
fn get_database_name() -> String {
    "clubvote".to_string()
}

/// A fairing that loads the chatbot rules into managed state.
///
/// Rules come from the `chat` config key if present, else the built-in table.
/// Invalid patterns fail ignition.
pub struct ChatFairing;

#[rocket::async_trait]
impl Fairing for ChatFairing {
    fn info(&self) -> Info {
        Info {
            name: "Chatbot",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        let chat = match rocket.figment().find_value("chat") {
            Ok(value) => match value.deserialize::<ChatConfig>() {
                Ok(chat) => chat,
                Err(e) => {
                    error!("Failed to load chatbot rules");
                    rocket::config::pretty_print_error(e);
                    return Err(rocket);
                }
            },
            Err(_) => ChatConfig::default(),
        };
        info!("Loaded {} chatbot rules", chat.rules().len());
        Ok(rocket.manage(chat))
    }
}
