// Library exports for Inkpost
// This allows integration tests to drive the router and stores directly

pub mod auth;
pub mod blog;
pub mod cdn;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;
