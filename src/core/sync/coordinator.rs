//! Sync coordinator - main orchestrator for a replica refresh
//!
//! Enumerates municipalities once, fetches and upserts every
//! (entity type, municipality) pair in turn, then runs the geocoding pass.
//! Problems confined to one municipality are recorded in the summary and
//! the run moves on; store failures abort it.

use crate::adapters::gazetteer::{Gazetteer, RuianGazetteer};
use crate::adapters::geocoder::{Geocoder, NominatimGeocoder};
use crate::adapters::registry::{AresRegistry, RegistrySource};
use crate::adapters::store::{SubjectStore, UpsertStats};
use crate::config::PrvotkarConfig;
use crate::core::geocode::{GeocodeSettings, GeocodingPipeline};
use crate::core::pacing::{Pacer, Pacing};
use crate::core::regions::RegionEnumerator;
use crate::core::status::{estimate_remaining, Phase, Progress, RunStatus, StatusTracker};
use crate::core::sync::fetcher::{FetchSettings, SubjectFetcher};
use crate::core::sync::summary::{SyncIssue, SyncIssueKind, SyncSummary};
use crate::core::sync::upsert::BatchUpserter;
use crate::domain::{EntityType, MunicipalityId, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Per-run choices layered over the configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Overrides `registry.entity_types` when non-empty
    pub entity_types: Vec<EntityType>,
    /// Skips enumeration and syncs only these when non-empty
    pub municipalities: Vec<MunicipalityId>,
    pub skip_geocode: bool,
}

/// The collaborators a coordinator drives
pub struct SyncParts {
    pub store: Arc<SubjectStore>,
    pub gazetteer: Arc<dyn Gazetteer>,
    pub registry: Arc<dyn RegistrySource>,
    pub geocoder: Arc<dyn Geocoder>,
    pub pacing: Pacing,
}

impl SyncParts {
    /// Real HTTP clients and the on-disk store described by `config`
    pub fn from_config(config: &PrvotkarConfig) -> Result<Self> {
        Ok(Self {
            store: Arc::new(SubjectStore::open(&config.store.path)?),
            gazetteer: Arc::new(RuianGazetteer::new(&config.gazetteer)?),
            registry: Arc::new(AresRegistry::new(&config.registry)?),
            geocoder: Arc::new(NominatimGeocoder::new(&config.geocoding)?),
            pacing: Pacing::from_config(config),
        })
    }
}

pub struct SyncCoordinator {
    store: Arc<SubjectStore>,
    enumerator: RegionEnumerator,
    fetcher: SubjectFetcher,
    upserter: BatchUpserter,
    geocoding: Option<GeocodingPipeline>,
    municipality_pacer: Arc<dyn Pacer>,
    entity_types: Vec<EntityType>,
    status: StatusTracker,
    shutdown: watch::Receiver<bool>,
}

impl SyncCoordinator {
    /// Create a coordinator talking to the configured services
    pub fn new(config: &PrvotkarConfig, shutdown: watch::Receiver<bool>) -> Result<Self> {
        let parts = SyncParts::from_config(config)?;
        Ok(Self::from_parts(config, parts, shutdown))
    }

    /// Create a coordinator over explicit collaborators
    pub fn from_parts(
        config: &PrvotkarConfig,
        parts: SyncParts,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let status = StatusTracker::new();

        let geocoding = config.geocoding.enabled.then(|| {
            GeocodingPipeline::new(
                parts.store.clone(),
                parts.geocoder.clone(),
                parts.pacing.geocode.clone(),
                GeocodeSettings::from(&config.geocoding),
                status.clone(),
                shutdown.clone(),
            )
        });

        Self {
            enumerator: RegionEnumerator::new(parts.gazetteer, parts.pacing.region.clone()),
            fetcher: SubjectFetcher::new(
                parts.registry,
                parts.pacing.page.clone(),
                FetchSettings::from(&config.registry),
            ),
            upserter: BatchUpserter::new(parts.store.clone()),
            store: parts.store,
            geocoding,
            municipality_pacer: parts.pacing.municipality,
            entity_types: config.registry.entity_types.clone(),
            status,
            shutdown,
        }
    }

    /// Read-only view of the run status
    pub fn subscribe(&self) -> watch::Receiver<RunStatus> {
        self.status.subscribe()
    }

    pub fn store(&self) -> &Arc<SubjectStore> {
        &self.store
    }

    /// Execute one sync run
    ///
    /// The run status is reset on entry. On return it is `done` (also for an
    /// interrupted run) or `failed` if an error aborted the run. Only runs
    /// that were not interrupted are recorded in the store's run history.
    pub async fn execute(&self, options: &SyncOptions) -> Result<SyncSummary> {
        let start_time = Instant::now();
        let mut summary = SyncSummary::new();

        tracing::info!("Starting sync");
        self.status.begin("Sync started");

        if let Err(e) = self.run(options, &mut summary).await {
            tracing::error!(error = %e, "Sync aborted");
            self.status.fail(format!("Sync failed: {e}"));
            return Err(e);
        }

        summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();

        if summary.interrupted {
            self.status.finish("Sync interrupted");
        } else {
            let stats = UpsertStats {
                written: summary.records_written,
                unchanged: summary.records_unchanged,
            };
            if let Err(e) = self.store.record_sync_run(Utc::now(), stats) {
                tracing::error!(error = %e, "Failed to record completed sync");
                self.status.fail(format!("Sync failed: {e}"));
                return Err(e);
            }
            self.status.finish(format!(
                "Sync complete: {} records written",
                summary.records_written
            ));
        }

        Ok(summary)
    }

    async fn run(&self, options: &SyncOptions, summary: &mut SyncSummary) -> Result<()> {
        let municipalities = self.municipalities(options, summary).await;
        summary.total_municipalities = municipalities.len();

        let entity_types = if options.entity_types.is_empty() {
            self.entity_types.clone()
        } else {
            options.entity_types.clone()
        };

        tracing::info!(
            entity_types = ?entity_types,
            municipalities = municipalities.len(),
            "Processing entity types and municipalities"
        );

        self.fetch_all(&entity_types, &municipalities, summary).await?;

        if summary.interrupted {
            return Ok(());
        }

        match &self.geocoding {
            Some(_) if options.skip_geocode => {
                tracing::info!("Geocoding skipped for this run");
            }
            Some(pipeline) => {
                let geocode = pipeline.run().await?;
                summary.interrupted = geocode.interrupted;
                summary.geocode = Some(geocode);
            }
            None => tracing::info!("Geocoding disabled in configuration"),
        }

        Ok(())
    }

    async fn municipalities(
        &self,
        options: &SyncOptions,
        summary: &mut SyncSummary,
    ) -> Vec<(MunicipalityId, String)> {
        if !options.municipalities.is_empty() {
            tracing::info!(
                count = options.municipalities.len(),
                "Using municipalities given on the command line"
            );
            return options
                .municipalities
                .iter()
                .map(|id| (*id, id.to_string()))
                .collect();
        }

        self.status.enter_phase(Phase::Regions, "Enumerating municipalities");
        let enumeration = self.enumerator.enumerate().await;
        summary.degraded_regions = enumeration.degraded;
        enumeration.municipalities.into_iter().collect()
    }

    async fn fetch_all(
        &self,
        entity_types: &[EntityType],
        municipalities: &[(MunicipalityId, String)],
        summary: &mut SyncSummary,
    ) -> Result<()> {
        self.status.enter_phase(Phase::Registry, "Fetching subjects");

        let started = Instant::now();
        let total = (entity_types.len() * municipalities.len()) as u64;
        let mut processed = 0u64;
        let mut with_errors = 0u64;

        for &entity_type in entity_types {
            for (municipality, name) in municipalities {
                if *self.shutdown.borrow() {
                    tracing::info!(
                        processed,
                        total,
                        "Shutdown requested, stopping registry fetch"
                    );
                    summary.interrupted = true;
                    return Ok(());
                }

                self.municipality_pacer.wait().await;

                let mut sink = self.upserter.sink();
                let report = self
                    .fetcher
                    .fetch(entity_type, *municipality, None, &mut sink)
                    .await?;
                summary.record_fetch(&report, sink.stats());

                let context =
                    format!("entity_type={entity_type}, municipality={municipality} ({name})");
                if let Some(e) = report.coverage_error(entity_type, *municipality) {
                    summary.add_error(
                        SyncIssue::new(SyncIssueKind::Coverage, e.to_string())
                            .with_context(context.clone()),
                    );
                }
                for prefix in &report.truncated {
                    summary.add_error(
                        SyncIssue::new(
                            SyncIssueKind::Truncated,
                            format!("Page cap reached for prefix '{prefix}'"),
                        )
                        .with_context(context.clone()),
                    );
                }
                if report.failed_pages > 0 {
                    summary.add_error(
                        SyncIssue::new(
                            SyncIssueKind::Connection,
                            format!("{} registry page(s) failed", report.failed_pages),
                        )
                        .with_context(context),
                    );
                }
                if !report.is_complete() {
                    with_errors += 1;
                }

                processed += 1;
                tracing::debug!(
                    entity_type = %entity_type,
                    municipality = %municipality,
                    name = %name,
                    records = report.records,
                    "Municipality synced"
                );
                self.status.progress(
                    Progress {
                        processed,
                        total,
                        succeeded: processed - with_errors,
                        failed: with_errors,
                        eta: estimate_remaining(started.elapsed(), processed, total),
                    },
                    format!("{entity_type}: {name}"),
                );
            }
        }

        Ok(())
    }
}

/// True when the last completed sync finished less than `max_age_days` ago
///
/// A store that never completed a sync is never fresh.
pub fn store_is_fresh(
    store: &SubjectStore,
    max_age_days: u32,
    now: DateTime<Utc>,
) -> Result<bool> {
    let Some(last_sync) = store.last_sync_run()? else {
        return Ok(false);
    };
    Ok(now - last_sync < chrono::Duration::days(i64::from(max_age_days)))
}
