//! Backend server for a small polling application.
//!
//! Questions are published at a point in time and own a set of choices;
//! anyone can view published questions and vote on them. Administration
//! (creating and deleting questions) lives under `/admin`.

#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate db_test;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

use rocket::{Build, Rocket};

/// Assemble the server: database connection, request logging, and routes.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .attach(config::DatabaseFairing)
        .attach(logging::LoggerFairing)
        .mount("/", api::routes())
}

/// Get a local client plus a handle on its (fresh, randomly-named) database.
#[cfg(test)]
pub(crate) async fn client_and_db() -> (rocket::local::asynchronous::Client, mongodb::Database) {
    let client = rocket::local::asynchronous::Client::tracked(build())
        .await
        .unwrap();
    let db = client
        .rocket()
        .state::<mongodb::Database>()
        .unwrap()
        .clone();
    (client, db)
}
