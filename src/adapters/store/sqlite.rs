//! SQLite-backed subject store

use super::schema::setup_database;
use crate::domain::{
    Coordinates, EntityType, GeocodeCandidate, GeocodeStatus, GeocodeUpdate, PrvotkarError,
    RegistrationId, Result, StoredSubject, Subject,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const UPSERT_SQL: &str = "
INSERT INTO subjects (
    id, entity_type, name, region, region_code, municipality, municipality_part,
    street, house_number, orientation_number, postal_code, registration_date, status,
    updated_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
ON CONFLICT(id) DO UPDATE SET
    entity_type = excluded.entity_type,
    name = excluded.name,
    region = excluded.region,
    region_code = excluded.region_code,
    municipality = excluded.municipality,
    municipality_part = excluded.municipality_part,
    street = excluded.street,
    house_number = excluded.house_number,
    orientation_number = excluded.orientation_number,
    postal_code = excluded.postal_code,
    registration_date = excluded.registration_date,
    status = excluded.status,
    updated_at = excluded.updated_at
WHERE subjects.entity_type IS NOT excluded.entity_type
   OR subjects.name IS NOT excluded.name
   OR subjects.region IS NOT excluded.region
   OR subjects.region_code IS NOT excluded.region_code
   OR subjects.municipality IS NOT excluded.municipality
   OR subjects.municipality_part IS NOT excluded.municipality_part
   OR subjects.street IS NOT excluded.street
   OR subjects.house_number IS NOT excluded.house_number
   OR subjects.orientation_number IS NOT excluded.orientation_number
   OR subjects.postal_code IS NOT excluded.postal_code
   OR subjects.registration_date IS NOT excluded.registration_date
   OR subjects.status IS NOT excluded.status
";

/// Counts from one upsert batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertStats {
    /// Rows inserted or whose attributes changed
    pub written: usize,
    /// Rows already identical in the store
    pub unchanged: usize,
}

impl UpsertStats {
    pub fn merge(&mut self, other: UpsertStats) {
        self.written += other.written;
        self.unchanged += other.unchanged;
    }
}

/// Aggregate figures for the `status` command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreStats {
    pub total: u64,
    pub svj: u64,
    pub bd: u64,
    pub municipalities: u64,
    pub geocode_pending: u64,
    pub geocode_succeeded: u64,
    pub geocode_failed: u64,
    pub last_updated: Option<DateTime<Utc>>,
    /// When the last uninterrupted sync finished
    pub last_sync: Option<DateTime<Utc>>,
}

/// The local replica
///
/// A single connection behind a mutex. Every method takes the lock for the
/// duration of one statement or transaction and never across an await.
pub struct SubjectStore {
    conn: Mutex<Connection>,
}

impl SubjectStore {
    /// Opens (creating if needed) the replica at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(|e| {
            PrvotkarError::Store(format!("Failed to open {}: {}", path.display(), e))
        })?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;

        Self::initialize(conn)
    }

    /// In-memory replica, used by tests and dry runs
    pub fn open_in_memory() -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PrvotkarError::Store("Store connection lock poisoned".to_string()))
    }

    /// Inserts or refreshes subjects in one transaction
    ///
    /// Coordinates and geocoding columns are never touched, and `updated_at`
    /// only moves for rows whose attributes actually changed.
    pub fn upsert_subjects(&self, subjects: &[Subject], now: DateTime<Utc>) -> Result<UpsertStats> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let timestamp = format_timestamp(now);
        let mut stats = UpsertStats::default();

        {
            let mut stmt = tx.prepare_cached(UPSERT_SQL)?;
            for subject in subjects {
                let changed = stmt.execute(params![
                    subject.id.as_str(),
                    subject.entity_type.as_str(),
                    subject.name.as_deref(),
                    subject.region.as_deref(),
                    subject.region_code.as_deref(),
                    subject.municipality.as_deref(),
                    subject.municipality_part.as_deref(),
                    subject.street.as_deref(),
                    subject.house_number.as_deref(),
                    subject.orientation_number.as_deref(),
                    subject.postal_code.as_deref(),
                    subject.registration_date.as_deref(),
                    subject.status.as_deref(),
                    timestamp,
                ])?;
                if changed > 0 {
                    stats.written += 1;
                } else {
                    stats.unchanged += 1;
                }
            }
        }

        tx.commit()?;
        Ok(stats)
    }

    /// Subjects that still need geocoding, grouped by municipality then street
    pub fn pending_geocodes(&self) -> Result<Vec<GeocodeCandidate>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, street, house_number, municipality, postal_code
             FROM subjects
             WHERE geocode_status = 'pending'
             ORDER BY municipality, street, id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;

        let mut candidates = Vec::new();
        for row in rows {
            let (id, street, house_number, municipality, postal_code) = row?;
            candidates.push(GeocodeCandidate {
                id: parse_id(&id)?,
                street,
                house_number,
                municipality,
                postal_code,
            });
        }
        Ok(candidates)
    }

    /// Writes geocoding outcomes in one transaction
    ///
    /// Only the coordinate and geocoding columns are updated.
    pub fn apply_geocodes(&self, updates: &[GeocodeUpdate], now: DateTime<Utc>) -> Result<usize> {
        if updates.is_empty() {
            return Ok(0);
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let timestamp = format_timestamp(now);
        let mut applied = 0;

        {
            let mut stmt = tx.prepare_cached(
                "UPDATE subjects
                 SET lat = ?2, lng = ?3, geocode_status = ?4,
                     geocode_attempts = geocode_attempts + 1, geocoded_at = ?5
                 WHERE id = ?1",
            )?;
            for update in updates {
                applied += stmt.execute(params![
                    update.id.as_str(),
                    update.coordinates.lat,
                    update.coordinates.lng,
                    update.status.as_str(),
                    timestamp,
                ])?;
            }
        }

        tx.commit()?;
        Ok(applied)
    }

    /// Puts failed subjects with fewer than `max_attempts` attempts back in
    /// the pending pool, clearing the sentinel
    pub fn reset_failed_geocodes(&self, max_attempts: u32) -> Result<usize> {
        let conn = self.lock()?;
        let reset = conn.execute(
            "UPDATE subjects
             SET lat = NULL, lng = NULL, geocode_status = 'pending'
             WHERE geocode_status = 'failed' AND geocode_attempts < ?1",
            params![max_attempts],
        )?;
        Ok(reset)
    }

    pub fn get(&self, id: &RegistrationId) -> Result<Option<StoredSubject>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT id, entity_type, name, region, region_code, municipality,
                        municipality_part, street, house_number, orientation_number,
                        postal_code, registration_date, status, lat, lng,
                        geocode_status, geocode_attempts, updated_at
                 FROM subjects WHERE id = ?1",
                params![id.as_str()],
                |row| {
                    Ok(SubjectRow {
                        id: row.get(0)?,
                        entity_type: row.get(1)?,
                        name: row.get(2)?,
                        region: row.get(3)?,
                        region_code: row.get(4)?,
                        municipality: row.get(5)?,
                        municipality_part: row.get(6)?,
                        street: row.get(7)?,
                        house_number: row.get(8)?,
                        orientation_number: row.get(9)?,
                        postal_code: row.get(10)?,
                        registration_date: row.get(11)?,
                        status: row.get(12)?,
                        lat: row.get(13)?,
                        lng: row.get(14)?,
                        geocode_status: row.get(15)?,
                        geocode_attempts: row.get(16)?,
                        updated_at: row.get(17)?,
                    })
                },
            )
            .optional()?;

        row.map(SubjectRow::into_stored).transpose()
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.lock()?;
        let (total, svj, bd, municipalities, pending, succeeded, failed, last_updated, last_sync) = conn
            .query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(entity_type = 'svj'), 0),
                        COALESCE(SUM(entity_type = 'bd'), 0),
                        COUNT(DISTINCT municipality),
                        COALESCE(SUM(geocode_status = 'pending'), 0),
                        COALESCE(SUM(geocode_status = 'succeeded'), 0),
                        COALESCE(SUM(geocode_status = 'failed'), 0),
                        MAX(updated_at),
                        (SELECT MAX(finished_at) FROM sync_runs)
                 FROM subjects",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, i64>(6)?,
                        row.get::<_, Option<String>>(7)?,
                        row.get::<_, Option<String>>(8)?,
                    ))
                },
            )?;

        Ok(StoreStats {
            total: total as u64,
            svj: svj as u64,
            bd: bd as u64,
            municipalities: municipalities as u64,
            geocode_pending: pending as u64,
            geocode_succeeded: succeeded as u64,
            geocode_failed: failed as u64,
            last_updated: last_updated.as_deref().map(parse_timestamp).transpose()?,
            last_sync: last_sync.as_deref().map(parse_timestamp).transpose()?,
        })
    }

    /// Records a sync that ran to completion
    ///
    /// Written even when nothing changed, so a stable registry still counts
    /// as recently synchronized.
    pub fn record_sync_run(&self, finished_at: DateTime<Utc>, stats: UpsertStats) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sync_runs (finished_at, records_written, records_unchanged)
             VALUES (?1, ?2, ?3)",
            params![
                format_timestamp(finished_at),
                stats.written as i64,
                stats.unchanged as i64
            ],
        )?;
        Ok(())
    }

    /// Finish time of the newest completed sync, if any
    pub fn last_sync_run(&self) -> Result<Option<DateTime<Utc>>> {
        let conn = self.lock()?;
        let raw: Option<String> =
            conn.query_row("SELECT MAX(finished_at) FROM sync_runs", [], |row| row.get(0))?;
        raw.as_deref().map(parse_timestamp).transpose()
    }
}

struct SubjectRow {
    id: String,
    entity_type: String,
    name: Option<String>,
    region: Option<String>,
    region_code: Option<String>,
    municipality: Option<String>,
    municipality_part: Option<String>,
    street: Option<String>,
    house_number: Option<String>,
    orientation_number: Option<String>,
    postal_code: Option<String>,
    registration_date: Option<String>,
    status: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    geocode_status: String,
    geocode_attempts: i64,
    updated_at: String,
}

impl SubjectRow {
    fn into_stored(self) -> Result<StoredSubject> {
        let entity_type = EntityType::from_str(&self.entity_type).map_err(PrvotkarError::Store)?;
        let geocode_status =
            GeocodeStatus::from_str(&self.geocode_status).map_err(PrvotkarError::Store)?;
        let coordinates = match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        };

        Ok(StoredSubject {
            subject: Subject {
                id: parse_id(&self.id)?,
                entity_type,
                name: self.name,
                region: self.region,
                region_code: self.region_code,
                municipality: self.municipality,
                municipality_part: self.municipality_part,
                street: self.street,
                house_number: self.house_number,
                orientation_number: self.orientation_number,
                postal_code: self.postal_code,
                registration_date: self.registration_date,
                status: self.status,
            },
            coordinates,
            geocode_status,
            geocode_attempts: self.geocode_attempts.max(0) as u32,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

fn parse_id(raw: &str) -> Result<RegistrationId> {
    RegistrationId::new(raw).map_err(PrvotkarError::Store)
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| PrvotkarError::Store(format!("Invalid timestamp '{raw}': {e}")))
}
