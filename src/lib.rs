#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use crate::config::{ConfigFairing, LedgerFairing};
use crate::logging::LoggerFairing;
use crate::model::ledger::ElectionLedger;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

pub use config::Config;

/// Build the server from `Rocket.toml` and `ROCKET_*` environment variables.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(LedgerFairing)
        .mount("/", api::routes())
        .register("/", api::catchers())
}

/// Build a server around an existing ledger, skipping configuration.
pub fn rocket_for_ledger(ledger: ElectionLedger) -> Rocket<Build> {
    rocket::build()
        .attach(LoggerFairing)
        .manage(ledger)
        .mount("/", api::routes())
        .register("/", api::catchers())
}

/// A fresh ledger for tests, open to any administrator, optionally backed by
/// a newly named database.
#[cfg(test)]
pub(crate) async fn test_ledger(
    mongo: bool,
) -> (ElectionLedger, Option<mongodb::Database>) {
    use crate::model::ledger::{AdminPolicy, MongoStore, ReceiptSigner};

    let signer = ReceiptSigner::new("test receipt secret");
    if !mongo {
        return (ElectionLedger::in_memory(AdminPolicy::open(), signer), None);
    }

    let uri = std::env::var("ROCKET_DB_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let client = mongodb::Client::with_uri_str(uri).await.unwrap();
    let db = client.database(&config::database_name(String::new()));
    model::mongodb::ensure_indexes_exist(&db).await.unwrap();
    let ledger = ElectionLedger::new(MongoStore::new(&db), AdminPolicy::open(), signer);
    (ledger, Some(db))
}
