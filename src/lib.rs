//! Polling service: create polls, cast one vote per poll per client, read live tallies.

pub mod config;
pub mod db;
pub mod error;
pub mod fingerprint;
pub mod handlers;
pub mod models;
pub mod poll;
pub mod routes;
pub mod store;

pub use handlers::AppState;
pub use routes::create_routes;
