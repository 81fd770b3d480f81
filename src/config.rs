use log::{error, info};
use mongodb::{Client as MongoClient, Database};
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::model::{
    common::identity::Identity,
    ledger::{AdminPolicy, ElectionLedger, MongoStore, ReceiptSigner},
    mongodb::ensure_indexes_exist,
};

/// Where elections are kept.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// In process; lost on restart.
    #[default]
    Memory,
    /// A MongoDB database, configured by `db_uri` and `db_name`.
    Mongodb,
}

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    #[serde(default)]
    storage: StorageKind,
    #[serde(default)]
    admins: Vec<Identity>,
    operator_identity: Option<Identity>,
    // secrets
    receipt_secret: String,
}

impl Config {
    pub fn storage(&self) -> StorageKind {
        self.storage
    }

    /// Identities allowed to run administrative commands.
    /// Empty means anyone may.
    pub fn admins(&self) -> &[Identity] {
        &self.admins
    }

    /// Who administrative commands are attributed to when the request
    /// names no caller.
    pub fn operator_identity(&self) -> Option<&Identity> {
        self.operator_identity.as_ref()
    }

    /// Secret key used to sign receipts.
    pub fn receipt_secret(&self) -> &[u8] {
        self.receipt_secret.as_bytes()
    }

    pub fn admin_policy(&self) -> AdminPolicy {
        AdminPolicy::restricted(self.admins.iter().cloned())
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
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        if config.receipt_secret.is_empty() {
            error!("`receipt_secret` must not be empty");
            return Err(rocket);
        }

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
struct DbConfig {
    // non-secrets
    #[serde(default = "default_db_name")]
    db_name: String,
    // secrets
    db_uri: String,
}

fn default_db_name() -> String {
    "elections".to_string()
}

/// A fairing that builds the configured store, connecting to the database if
/// needed, and places the [`ElectionLedger`] into managed state.
///
/// Must be attached after [`ConfigFairing`].
pub struct LedgerFairing;

#[rocket::async_trait]
impl Fairing for LedgerFairing {
    fn info(&self) -> Info {
        Info {
            name: "Election ledger",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        let (policy, signer, storage) = match rocket.state::<Config>() {
            Some(config) => (
                config.admin_policy(),
                ReceiptSigner::new(config.receipt_secret()),
                config.storage(),
            ),
            None => {
                error!("Application config is not loaded");
                return Err(rocket);
            }
        };
        if policy.is_open() {
            info!("No administrators configured, any caller may administer elections");
        }

        let ledger = match storage {
            StorageKind::Memory => {
                info!("Using in-memory storage, elections will not survive a restart");
                ElectionLedger::in_memory(policy, signer)
            }
            StorageKind::Mongodb => {
                let db = match connect(&rocket).await {
                    Some(db) => db,
                    None => return Err(rocket),
                };
                ElectionLedger::new(MongoStore::new(&db), policy, signer)
            }
        };

        // Manage the state.
        Ok(rocket.manage(ledger))
    }
}

/// Load the MongoDB config, connect, and ensure the required indexes exist.
async fn connect(rocket: &Rocket<Build>) -> Option<Database> {
    // Load the config.
    let config = match rocket.figment().extract::<DbConfig>() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load database config");
            rocket::config::pretty_print_error(e);
            return None;
        }
    };
    info!("Loaded database config, connecting...");
    // Construct the connection.
    let client = match MongoClient::with_uri_str(config.db_uri).await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to connect to database: {e}");
            return None;
        }
    };
    let db = client.database(&database_name(config.db_name));

    // Ensure the required indexes exist.
    if let Err(e) = ensure_indexes_exist(&db).await {
        error!("Failed to connect to database: {e}");
        return None;
    }
    info!("...database connection online!");
    Some(db)
}

/// Get the name of the database to use (production version).
#[cfg(not(test))]
pub(crate) fn database_name(configured: String) -> String {
    configured
}

/// Get the name of the database to use (test version).
/// Use a random name to avoid collisions between tests.
#[cfg(test)]
pub(crate) fn database_name(_configured: String) -> String {
    let random: u32 = rand::random();
    let db = format!("test{random}");
    info!("Using database {db}");
    db
}
