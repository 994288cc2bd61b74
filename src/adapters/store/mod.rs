//! Local replica storage
//!
//! One SQLite file holds the `subjects` table that the registry sync writes
//! and the geocoding pipeline enriches.

pub mod schema;
pub mod sqlite;

pub use schema::setup_database;
pub use sqlite::{StoreStats, SubjectStore, UpsertStats};
