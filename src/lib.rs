//! Appointment booking service: registration pages, a small JSON API and a
//! record store that can sit on SQLite, Redis or process memory.

pub mod configuration;
pub mod errors;
pub mod models;
pub mod routes;
pub mod services;
pub mod startup;
pub mod store;
pub mod telemetry;
