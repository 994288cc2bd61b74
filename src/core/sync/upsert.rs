//! Normalization and idempotent persistence of registry records

use crate::adapters::registry::RawSubject;
use crate::adapters::store::{SubjectStore, UpsertStats};
use crate::core::sync::fetcher::PageSink;
use crate::domain::{EntityType, RegistrationId, Result, Subject};
use chrono::Utc;
use std::sync::Arc;

/// Flattens a raw registry record into a [`Subject`]
///
/// Returns `None` for records without a usable registration number.
pub fn normalize(entity_type: EntityType, raw: &RawSubject) -> Option<Subject> {
    let id = RegistrationId::new(raw.ico()?).ok()?;

    let mut subject = Subject::new(id, entity_type);
    subject.name = raw.text("obchodniJmeno");
    subject.region = raw.seat_text("nazevKraje");
    subject.region_code = raw.seat_text("kodKraje");
    subject.municipality = raw.seat_text("nazevObce");
    subject.municipality_part = raw.seat_text("nazevCastiObce");
    subject.street = raw.seat_text("nazevUlice");
    subject.house_number = raw.seat_text("cisloDomovni");
    subject.orientation_number = raw.seat_text("cisloOrientacni");
    subject.postal_code = raw.seat_text("psc");
    subject.registration_date = raw
        .text("datumVzniku")
        .map(|date| date.chars().take(10).collect());
    subject.status = raw.text("stavSubjektu");
    Some(subject)
}

/// Writes batches of registry records to the store
pub struct BatchUpserter {
    store: Arc<SubjectStore>,
}

impl BatchUpserter {
    pub fn new(store: Arc<SubjectStore>) -> Self {
        Self { store }
    }

    /// Normalizes and upserts one batch in a single transaction
    pub fn upsert(&self, entity_type: EntityType, records: &[RawSubject]) -> Result<UpsertStats> {
        let mut subjects = Vec::with_capacity(records.len());
        for raw in records {
            match normalize(entity_type, raw) {
                Some(subject) => subjects.push(subject),
                None => {
                    tracing::warn!(
                        entity_type = %entity_type,
                        ico = raw.ico().as_deref().unwrap_or(""),
                        "Skipping registry record without a valid registration number"
                    );
                }
            }
        }

        if subjects.is_empty() {
            return Ok(UpsertStats::default());
        }
        self.store.upsert_subjects(&subjects, Utc::now())
    }

    /// A sink that upserts each completed partition and tallies the results
    pub fn sink(&self) -> UpsertSink<'_> {
        UpsertSink {
            upserter: self,
            stats: UpsertStats::default(),
        }
    }
}

pub struct UpsertSink<'a> {
    upserter: &'a BatchUpserter,
    stats: UpsertStats,
}

impl UpsertSink<'_> {
    pub fn stats(&self) -> UpsertStats {
        self.stats
    }
}

impl PageSink for UpsertSink<'_> {
    fn accept(&mut self, entity_type: EntityType, records: &[RawSubject]) -> Result<()> {
        let stats = self.upserter.upsert(entity_type, records)?;
        self.stats.merge(stats);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn brno_record(ico: &str, name: &str) -> RawSubject {
        RawSubject(json!({
            "ico": ico,
            "obchodniJmeno": name,
            "datumVzniku": "2001-05-14T00:00:00",
            "stavSubjektu": "AKTIVNI",
            "sidlo": {
                "nazevKraje": "Jihomoravský kraj",
                "kodKraje": 116,
                "nazevObce": "Brno",
                "nazevCastiObce": "Zábrdovice",
                "nazevUlice": "Cejl",
                "cisloDomovni": 1234,
                "cisloOrientacni": "56",
                "psc": 60200
            }
        }))
    }

    #[test]
    fn test_normalize_flattens_seat() {
        let subject =
            normalize(EntityType::Svj, &brno_record("27074358", "SVJ Cejl 56")).unwrap();

        assert_eq!(subject.id.as_str(), "27074358");
        assert_eq!(subject.name.as_deref(), Some("SVJ Cejl 56"));
        assert_eq!(subject.region_code.as_deref(), Some("116"));
        assert_eq!(subject.municipality.as_deref(), Some("Brno"));
        assert_eq!(subject.municipality_part.as_deref(), Some("Zábrdovice"));
        assert_eq!(subject.house_number.as_deref(), Some("1234"));
        assert_eq!(subject.orientation_number.as_deref(), Some("56"));
        assert_eq!(subject.postal_code.as_deref(), Some("60200"));
        assert_eq!(subject.registration_date.as_deref(), Some("2001-05-14"));
        assert_eq!(subject.status.as_deref(), Some("AKTIVNI"));
    }

    #[test]
    fn test_normalize_missing_seat() {
        let subject = normalize(EntityType::Bd, &RawSubject(json!({"ico": "123"}))).unwrap();
        assert_eq!(subject.municipality, None);
        assert_eq!(subject.street, None);
    }

    #[test]
    fn test_normalize_rejects_missing_ico() {
        assert!(normalize(EntityType::Svj, &RawSubject(json!({"obchodniJmeno": "x"}))).is_none());
        assert!(normalize(EntityType::Svj, &RawSubject(json!({"ico": "  "}))).is_none());
    }

    #[test]
    fn test_upsert_skips_invalid_records() {
        let store = Arc::new(SubjectStore::open_in_memory().unwrap());
        let upserter = BatchUpserter::new(store.clone());

        let stats = upserter
            .upsert(
                EntityType::Svj,
                &[
                    brno_record("1", "A"),
                    RawSubject(json!({"obchodniJmeno": "no id"})),
                    brno_record("2", "B"),
                ],
            )
            .unwrap();

        assert_eq!(stats.written, 2);
        assert_eq!(store.stats().unwrap().total, 2);
    }

    #[test]
    fn test_sink_tallies_pages() {
        let store = Arc::new(SubjectStore::open_in_memory().unwrap());
        let upserter = BatchUpserter::new(store);
        let mut sink = upserter.sink();

        sink.accept(EntityType::Svj, &[brno_record("1", "A")]).unwrap();
        sink.accept(EntityType::Svj, &[brno_record("1", "A"), brno_record("2", "B")])
            .unwrap();

        assert_eq!(sink.stats(), UpsertStats { written: 2, unchanged: 1 });
    }
}
