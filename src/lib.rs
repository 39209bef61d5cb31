// Library exports for Tinta
// This allows integration tests and the binary to share modules

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod flash;
pub mod import;
pub mod listing;
pub mod routes;
pub mod state;
pub mod uploads;
