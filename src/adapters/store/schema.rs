//! Replica schema
//!
//! `subjects` is also read directly by the serving layer, so column names
//! are part of the external contract.

use rusqlite::Connection;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS subjects (
    id                  TEXT PRIMARY KEY,
    entity_type         TEXT NOT NULL,
    name                TEXT,
    region              TEXT,
    region_code         TEXT,
    municipality        TEXT,
    municipality_part   TEXT,
    street              TEXT,
    house_number        TEXT,
    orientation_number  TEXT,
    postal_code         TEXT,
    registration_date   TEXT,
    status              TEXT,
    lat                 REAL,
    lng                 REAL,
    geocode_status      TEXT NOT NULL DEFAULT 'pending'
                        CHECK (geocode_status IN ('pending', 'succeeded', 'failed')),
    geocode_attempts    INTEGER NOT NULL DEFAULT 0,
    geocoded_at         TEXT,
    updated_at          TEXT NOT NULL,
    CHECK ((lat IS NULL) = (lng IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_subjects_municipality ON subjects(municipality);
CREATE INDEX IF NOT EXISTS idx_subjects_entity_type ON subjects(entity_type);
CREATE INDEX IF NOT EXISTS idx_subjects_municipality_part ON subjects(municipality_part);
CREATE INDEX IF NOT EXISTS idx_subjects_street ON subjects(street);
CREATE INDEX IF NOT EXISTS idx_subjects_coordinates ON subjects(lat, lng);
CREATE INDEX IF NOT EXISTS idx_subjects_geocode_status ON subjects(geocode_status);

CREATE TABLE IF NOT EXISTS sync_runs (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    finished_at         TEXT NOT NULL,
    records_written     INTEGER NOT NULL,
    records_unchanged   INTEGER NOT NULL
);
";

/// Creates the tables and indices if they don't exist yet
pub fn setup_database(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}
