//! Resumable, rate-limited geocoding pass
//!
//! Works through every `pending` subject with one request per subject and a
//! fixed minimum gap between requests. Outcomes are buffered and committed
//! in batches; a stopped run leaves every committed subject finished and
//! everything else still `pending`, so the next run picks up where this one
//! ended.

use super::query::build_query;
use crate::adapters::geocoder::{Geocoder, NominatimGeocoder};
use crate::adapters::store::SubjectStore;
use crate::config::{GeocodingConfig, PrvotkarConfig};
use crate::core::pacing::{Pacer, Pacing};
use crate::core::status::{estimate_remaining, Phase, Progress, StatusTracker};
use crate::domain::{GeocodeCandidate, GeocodeStatus, GeocodeUpdate, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeSettings {
    /// Outcomes buffered before each store commit
    pub commit_every: usize,
    /// Appended to every query
    pub country_name: String,
}

impl From<&GeocodingConfig> for GeocodeSettings {
    fn from(config: &GeocodingConfig) -> Self {
        Self {
            commit_every: config.commit_every.max(1),
            country_name: config.country_name.clone(),
        }
    }
}

/// Outcome of one geocoding pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeocodeSummary {
    /// Pending subjects when the pass started
    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Subjects failed without a request because the address had no municipality
    pub without_address: usize,
    pub interrupted: bool,
    pub duration: Duration,
}

impl GeocodeSummary {
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.processed)
    }

    pub fn log_summary(&self) {
        tracing::info!(
            total = self.total,
            processed = self.processed,
            succeeded = self.succeeded,
            failed = self.failed,
            without_address = self.without_address,
            interrupted = self.interrupted,
            duration_secs = self.duration.as_secs(),
            "Geocoding pass finished"
        );
    }
}

pub struct GeocodingPipeline {
    store: Arc<SubjectStore>,
    geocoder: Arc<dyn Geocoder>,
    pacer: Arc<dyn Pacer>,
    settings: GeocodeSettings,
    status: StatusTracker,
    shutdown: watch::Receiver<bool>,
}

impl GeocodingPipeline {
    pub fn new(
        store: Arc<SubjectStore>,
        geocoder: Arc<dyn Geocoder>,
        pacer: Arc<dyn Pacer>,
        settings: GeocodeSettings,
        status: StatusTracker,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            store,
            geocoder,
            pacer,
            settings,
            status,
            shutdown,
        }
    }

    /// Pipeline against the configured geocoding service, for standalone runs
    pub fn from_config(
        config: &PrvotkarConfig,
        store: Arc<SubjectStore>,
        status: StatusTracker,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self> {
        Ok(Self::new(
            store,
            Arc::new(NominatimGeocoder::new(&config.geocoding)?),
            Pacing::from_config(config).geocode,
            GeocodeSettings::from(&config.geocoding),
            status,
            shutdown,
        ))
    }

    /// Geocodes every pending subject
    ///
    /// Only store errors are returned. A shutdown signal stops the pass
    /// between subjects after flushing what has been resolved so far.
    pub async fn run(&self) -> Result<GeocodeSummary> {
        let started = Instant::now();
        let candidates = self.store.pending_geocodes()?;
        let mut summary = GeocodeSummary {
            total: candidates.len(),
            ..GeocodeSummary::default()
        };

        self.status.enter_phase(
            Phase::Geocoding,
            format!("Geocoding {} subjects", summary.total),
        );

        if candidates.is_empty() {
            tracing::info!("No subjects pending geocoding");
            return Ok(summary);
        }

        tracing::info!(pending = summary.total, "Starting geocoding pass");

        let mut buffer: Vec<GeocodeUpdate> = Vec::with_capacity(self.settings.commit_every);

        for candidate in &candidates {
            if *self.shutdown.borrow() {
                tracing::info!(
                    processed = summary.processed,
                    remaining = summary.remaining(),
                    "Shutdown requested, stopping geocoding"
                );
                summary.interrupted = true;
                break;
            }

            let update = self.geocode_one(candidate, &mut summary).await;
            if update.status == GeocodeStatus::Succeeded {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
            summary.processed += 1;
            buffer.push(update);

            if buffer.len() >= self.settings.commit_every {
                self.flush(&mut buffer)?;
                tracing::info!(
                    processed = summary.processed,
                    total = summary.total,
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    "Geocoding progress"
                );
            }

            let processed = summary.processed as u64;
            let total = summary.total as u64;
            self.status.progress(
                Progress {
                    processed,
                    total,
                    succeeded: summary.succeeded as u64,
                    failed: summary.failed as u64,
                    eta: estimate_remaining(started.elapsed(), processed, total),
                },
                format!(
                    "Geocoding {}/{} ({})",
                    processed,
                    total,
                    candidate.municipality.as_deref().unwrap_or("?")
                ),
            );
        }

        self.flush(&mut buffer)?;

        summary.duration = started.elapsed();
        summary.log_summary();
        Ok(summary)
    }

    async fn geocode_one(
        &self,
        candidate: &GeocodeCandidate,
        summary: &mut GeocodeSummary,
    ) -> GeocodeUpdate {
        let Some(query) = build_query(candidate, &self.settings.country_name) else {
            tracing::debug!(id = %candidate.id, "No municipality on record, marking failed");
            summary.without_address += 1;
            return GeocodeUpdate::failed(candidate.id.clone());
        };

        self.pacer.wait().await;

        match self.geocoder.geocode(&query).await {
            Ok(Some(coordinates)) if coordinates.is_valid() => {
                GeocodeUpdate::located(candidate.id.clone(), coordinates)
            }
            Ok(Some(coordinates)) => {
                tracing::debug!(
                    id = %candidate.id,
                    query = %query,
                    lat = coordinates.lat,
                    lng = coordinates.lng,
                    "Geocoder answered with an unusable point"
                );
                GeocodeUpdate::failed(candidate.id.clone())
            }
            Ok(None) => {
                tracing::debug!(id = %candidate.id, query = %query, "No geocoding result");
                GeocodeUpdate::failed(candidate.id.clone())
            }
            Err(e) => {
                tracing::debug!(
                    id = %candidate.id,
                    query = %query,
                    error = %e,
                    "Geocoding request failed"
                );
                GeocodeUpdate::failed(candidate.id.clone())
            }
        }
    }

    fn flush(&self, buffer: &mut Vec<GeocodeUpdate>) -> Result<()> {
        if buffer.is_empty() {
            return Ok(());
        }
        self.store.apply_geocodes(buffer, Utc::now())?;
        buffer.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pacing::{FixedIntervalGate, NoPacing};
    use crate::domain::{Coordinates, EntityType, HttpError, RegistrationId, Subject};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Answers from a fixed table; optionally raises shutdown after N calls
    struct FakeGeocoder {
        answers: HashMap<String, std::result::Result<Option<Coordinates>, HttpError>>,
        queries: Mutex<Vec<String>>,
        stop_after: Option<(usize, watch::Sender<bool>)>,
    }

    impl FakeGeocoder {
        fn new() -> Self {
            Self {
                answers: HashMap::new(),
                queries: Mutex::new(Vec::new()),
                stop_after: None,
            }
        }

        fn answer(
            mut self,
            query: &str,
            result: std::result::Result<Option<Coordinates>, HttpError>,
        ) -> Self {
            self.answers.insert(query.to_string(), result);
            self
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn geocode(
            &self,
            query: &str,
        ) -> std::result::Result<Option<Coordinates>, HttpError> {
            let calls = {
                let mut queries = self.queries.lock().unwrap();
                queries.push(query.to_string());
                queries.len()
            };
            if let Some((limit, tx)) = &self.stop_after {
                if calls >= *limit {
                    let _ = tx.send(true);
                }
            }
            self.answers
                .get(query)
                .cloned()
                .unwrap_or(Ok(Some(Coordinates::new(49.19, 16.61))))
        }
    }

    fn seed(store: &SubjectStore, rows: &[(&str, Option<&str>, Option<&str>, Option<&str>)]) {
        let subjects: Vec<Subject> = rows
            .iter()
            .map(|(id, street, municipality, postal)| {
                let mut s = Subject::new(RegistrationId::new(*id).unwrap(), EntityType::Svj);
                s.street = street.map(str::to_string);
                s.house_number = street.map(|_| "1".to_string());
                s.municipality = municipality.map(str::to_string);
                s.postal_code = postal.map(str::to_string);
                s
            })
            .collect();
        store.upsert_subjects(&subjects, Utc::now()).unwrap();
    }

    type Row = (
        String,
        Option<&'static str>,
        Option<&'static str>,
        Option<&'static str>,
    );

    fn brno_rows(count: usize) -> Vec<Row> {
        (0..count)
            .map(|i| (format!("{}", i + 1), Some("Cejl"), Some("Brno"), None))
            .collect()
    }

    fn seed_owned(store: &SubjectStore, rows: &[Row]) {
        let borrowed: Vec<_> = rows
            .iter()
            .map(|(id, s, m, p)| (id.as_str(), *s, *m, *p))
            .collect();
        seed(store, &borrowed);
    }

    fn pipeline(
        store: &Arc<SubjectStore>,
        geocoder: Arc<FakeGeocoder>,
        pacer: Arc<dyn Pacer>,
        commit_every: usize,
        shutdown: watch::Receiver<bool>,
    ) -> GeocodingPipeline {
        GeocodingPipeline::new(
            store.clone(),
            geocoder,
            pacer,
            GeocodeSettings {
                commit_every,
                country_name: "Česká republika".to_string(),
            },
            StatusTracker::new(),
            shutdown,
        )
    }

    fn id(raw: &str) -> RegistrationId {
        RegistrationId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn test_postal_fallback_stores_result() {
        let store = Arc::new(SubjectStore::open_in_memory().unwrap());
        seed(&store, &[("1", None, Some("Praha"), Some("11000"))]);
        let geocoder = Arc::new(FakeGeocoder::new().answer(
            "11000 Praha, Česká republika",
            Ok(Some(Coordinates::new(50.0755, 14.4378))),
        ));
        let (_tx, rx) = watch::channel(false);

        let summary = pipeline(&store, geocoder.clone(), Arc::new(NoPacing), 100, rx)
            .run()
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 1);
        assert_eq!(geocoder.queries(), vec!["11000 Praha, Česká republika"]);
        let stored = store.get(&id("1")).unwrap().unwrap();
        assert_eq!(stored.coordinates, Some(Coordinates::new(50.0755, 14.4378)));
        assert_eq!(stored.geocode_status, GeocodeStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_failures_write_sentinel_without_retry() {
        let store = Arc::new(SubjectStore::open_in_memory().unwrap());
        seed(
            &store,
            &[
                ("1", Some("Cejl"), Some("Brno"), None),
                ("2", Some("Údolní"), Some("Brno"), None),
                ("3", Some("Zelná"), Some("Brno"), None),
            ],
        );
        let geocoder = Arc::new(
            FakeGeocoder::new()
                .answer(
                    "Cejl 1, Brno, Česká republika",
                    Err(HttpError::Timeout("10s".to_string())),
                )
                .answer("Údolní 1, Brno, Česká republika", Ok(None))
                .answer(
                    "Zelná 1, Brno, Česká republika",
                    Ok(Some(Coordinates::SENTINEL)),
                ),
        );
        let (_tx, rx) = watch::channel(false);

        let summary = pipeline(&store, geocoder.clone(), Arc::new(NoPacing), 100, rx)
            .run()
            .await
            .unwrap();

        assert_eq!(summary.failed, 3);
        assert_eq!(geocoder.queries().len(), 3);
        for raw in ["1", "2", "3"] {
            let stored = store.get(&id(raw)).unwrap().unwrap();
            assert_eq!(stored.coordinates, Some(Coordinates::SENTINEL));
            assert_eq!(stored.geocode_status, GeocodeStatus::Failed);
            assert_eq!(stored.geocode_attempts, 1);
        }
    }

    #[tokio::test]
    async fn test_missing_municipality_makes_no_request() {
        let store = Arc::new(SubjectStore::open_in_memory().unwrap());
        seed(&store, &[("1", Some("Cejl"), None, Some("60200"))]);
        let geocoder = Arc::new(FakeGeocoder::new());
        let (_tx, rx) = watch::channel(false);

        let summary = pipeline(&store, geocoder.clone(), Arc::new(NoPacing), 100, rx)
            .run()
            .await
            .unwrap();

        assert_eq!(summary.without_address, 1);
        assert_eq!(summary.failed, 1);
        assert!(geocoder.queries().is_empty());
        assert_eq!(
            store.get(&id("1")).unwrap().unwrap().geocode_status,
            GeocodeStatus::Failed
        );
    }

    #[tokio::test]
    async fn test_interrupted_run_resumes_without_repeats() {
        let store = Arc::new(SubjectStore::open_in_memory().unwrap());
        seed_owned(&store, &brno_rows(10));
        let (tx, rx) = watch::channel(false);

        let mut first = FakeGeocoder::new();
        first.stop_after = Some((4, tx));
        let first = Arc::new(first);
        let summary = pipeline(&store, first.clone(), Arc::new(NoPacing), 3, rx)
            .run()
            .await
            .unwrap();

        assert!(summary.interrupted);
        assert_eq!(summary.processed, 4);
        // the partial batch was flushed on the way out
        assert_eq!(store.stats().unwrap().geocode_succeeded, 4);

        let (_tx, rx) = watch::channel(false);
        let second = Arc::new(FakeGeocoder::new());
        let summary = pipeline(&store, second.clone(), Arc::new(NoPacing), 3, rx)
            .run()
            .await
            .unwrap();

        assert!(!summary.interrupted);
        assert_eq!(summary.total, 6);
        assert_eq!(first.queries().len() + second.queries().len(), 10);
        assert_eq!(store.stats().unwrap().geocode_pending, 0);
    }

    #[tokio::test]
    async fn test_failed_rows_are_not_selected_again() {
        let store = Arc::new(SubjectStore::open_in_memory().unwrap());
        seed(&store, &[("1", Some("Cejl"), Some("Brno"), None)]);
        let geocoder =
            Arc::new(FakeGeocoder::new().answer("Cejl 1, Brno, Česká republika", Ok(None)));

        for _ in 0..2 {
            let (_tx, rx) = watch::channel(false);
            pipeline(&store, geocoder.clone(), Arc::new(NoPacing), 100, rx)
                .run()
                .await
                .unwrap();
        }

        assert_eq!(geocoder.queries().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_respect_minimum_gap() {
        let store = Arc::new(SubjectStore::open_in_memory().unwrap());
        seed_owned(&store, &brno_rows(5));
        let (_tx, rx) = watch::channel(false);
        let gate = Arc::new(FixedIntervalGate::new(Duration::from_millis(1100)));

        let start = tokio::time::Instant::now();
        let summary = pipeline(&store, Arc::new(FakeGeocoder::new()), gate, 100, rx)
            .run()
            .await
            .unwrap();

        assert_eq!(summary.processed, 5);
        assert!(start.elapsed() >= Duration::from_millis(4 * 1100));
    }
}
