//! Partitioned registry fetch
//!
//! A partition is one (entity type, municipality, name prefix) search. When
//! the registry refuses a partition as too large, it is split into one child
//! per character of [`PREFIX_ALPHABET`] appended to the prefix, down to the
//! configured depth. Partitions still too large at that depth are reported,
//! never silently dropped.
//!
//! The registry may also report overflow part way through paging. A
//! partition's pages are therefore held back until it completes, and an
//! overflowing partition contributes nothing before its children run.

use crate::adapters::registry::{RawSubject, RegistrySource, SearchQuery};
use crate::config::RegistryConfig;
use crate::core::pacing::Pacer;
use crate::domain::{EntityType, MunicipalityId, PrvotkarError, Result};
use crate::log_partition_refined;
use std::sync::Arc;

/// Characters used to refine an overflowing name prefix
pub const PREFIX_ALPHABET: &str = "ABCČDĎEÉĚFGHIÍJKLMNŇOÓPQRŘSŠTŤUÚŮVWXYÝZŽ0123456789";

/// Receives the records of each completed partition
///
/// An error from the sink aborts the fetch.
pub trait PageSink {
    fn accept(&mut self, entity_type: EntityType, records: &[RawSubject]) -> Result<()>;
}

impl PageSink for Vec<RawSubject> {
    fn accept(&mut self, _entity_type: EntityType, records: &[RawSubject]) -> Result<()> {
        self.extend_from_slice(records);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    pub page_size: usize,
    pub max_pages_per_partition: usize,
    pub max_prefix_depth: usize,
}

impl From<&RegistryConfig> for FetchSettings {
    fn from(config: &RegistryConfig) -> Self {
        Self {
            page_size: config.page_size,
            max_pages_per_partition: config.max_pages_per_partition,
            max_prefix_depth: config.max_prefix_depth,
        }
    }
}

/// What one municipality fetch did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// Search requests that returned records or an empty page
    pub pages: usize,
    pub records: usize,
    /// Pages given up on after retries; treated as empty
    pub failed_pages: usize,
    /// Partitions split because they overflowed
    pub refined: usize,
    /// Prefixes still overflowing at the maximum depth
    pub unresolved: Vec<String>,
    /// Prefixes cut off by the page cap
    pub truncated: Vec<String>,
}

impl FetchReport {
    /// The explicit coverage error for unresolved partitions, if any
    pub fn coverage_error(
        &self,
        entity_type: EntityType,
        municipality: MunicipalityId,
    ) -> Option<PrvotkarError> {
        if self.unresolved.is_empty() {
            return None;
        }
        Some(PrvotkarError::UnresolvedCoverage {
            entity_type: entity_type.to_string(),
            municipality: municipality.get(),
            prefixes: self.unresolved.clone(),
        })
    }

    pub fn is_complete(&self) -> bool {
        self.failed_pages == 0 && self.unresolved.is_empty() && self.truncated.is_empty()
    }
}

struct Partition {
    prefix: Option<String>,
    depth: usize,
}

impl Partition {
    fn label(&self) -> &str {
        self.prefix.as_deref().unwrap_or("*")
    }
}

pub struct SubjectFetcher {
    registry: Arc<dyn RegistrySource>,
    pacer: Arc<dyn Pacer>,
    settings: FetchSettings,
}

impl SubjectFetcher {
    pub fn new(
        registry: Arc<dyn RegistrySource>,
        pacer: Arc<dyn Pacer>,
        settings: FetchSettings,
    ) -> Self {
        Self {
            registry,
            pacer,
            settings,
        }
    }

    /// Fetches every subject of `entity_type` seated in `municipality`,
    /// handing each completed partition to `sink`
    ///
    /// Partitions are visited depth first in alphabet order. Only sink
    /// errors are returned; registry failures are counted in the report.
    pub async fn fetch<S>(
        &self,
        entity_type: EntityType,
        municipality: MunicipalityId,
        name_prefix: Option<&str>,
        sink: &mut S,
    ) -> Result<FetchReport>
    where
        S: PageSink + ?Sized,
    {
        let mut report = FetchReport::default();
        let mut stack = vec![Partition {
            prefix: name_prefix.map(str::to_string),
            depth: 0,
        }];

        while let Some(partition) = stack.pop() {
            let overflowed = self
                .fetch_partition(entity_type, municipality, &partition, sink, &mut report)
                .await?;
            if !overflowed {
                continue;
            }

            if partition.depth >= self.settings.max_prefix_depth {
                tracing::warn!(
                    entity_type = %entity_type,
                    municipality = %municipality,
                    prefix = partition.label(),
                    depth = partition.depth,
                    "Partition still exceeds the result ceiling at maximum prefix depth"
                );
                report.unresolved.push(partition.label().to_string());
                continue;
            }

            log_partition_refined!(
                entity_type,
                municipality,
                partition.label(),
                partition.depth + 1
            );
            report.refined += 1;

            let base = partition.prefix.unwrap_or_default();
            let children: Vec<Partition> = PREFIX_ALPHABET
                .chars()
                .map(|c| Partition {
                    prefix: Some(format!("{base}{c}")),
                    depth: partition.depth + 1,
                })
                .collect();
            // Reversed so the stack pops them in alphabet order
            stack.extend(children.into_iter().rev());
        }

        tracing::debug!(
            entity_type = %entity_type,
            municipality = %municipality,
            pages = report.pages,
            records = report.records,
            failed_pages = report.failed_pages,
            refined = report.refined,
            "Municipality fetch finished"
        );

        Ok(report)
    }

    /// Collects everything into memory, failing on unresolved coverage
    pub async fn fetch_all(
        &self,
        entity_type: EntityType,
        municipality: MunicipalityId,
        name_prefix: Option<&str>,
    ) -> Result<Vec<RawSubject>> {
        let mut records = Vec::new();
        let report = self
            .fetch(entity_type, municipality, name_prefix, &mut records)
            .await?;
        match report.coverage_error(entity_type, municipality) {
            Some(e) => Err(e),
            None => Ok(records),
        }
    }

    /// Pages through one partition. Returns true if the registry reported
    /// overflow for it, in which case nothing was passed to the sink.
    async fn fetch_partition<S>(
        &self,
        entity_type: EntityType,
        municipality: MunicipalityId,
        partition: &Partition,
        sink: &mut S,
        report: &mut FetchReport,
    ) -> Result<bool>
    where
        S: PageSink + ?Sized,
    {
        let mut query = SearchQuery::first_page(
            entity_type,
            municipality,
            partition.prefix.clone(),
            self.settings.page_size,
        );
        let mut requested = 0;
        let mut pages = 0;
        let mut buffered = Vec::new();

        loop {
            if requested >= self.settings.max_pages_per_partition {
                tracing::warn!(
                    entity_type = %entity_type,
                    municipality = %municipality,
                    prefix = partition.label(),
                    pages = requested,
                    "Page cap reached, partition truncated"
                );
                report.truncated.push(partition.label().to_string());
                break;
            }

            self.pacer.wait().await;
            requested += 1;

            let page = match self.registry.search(&query).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(
                        entity_type = %entity_type,
                        municipality = %municipality,
                        prefix = partition.label(),
                        offset = query.offset,
                        error = %e,
                        "Registry page failed, treating as empty"
                    );
                    report.failed_pages += 1;
                    break;
                }
            };

            if page.overflow {
                if !buffered.is_empty() {
                    tracing::debug!(
                        entity_type = %entity_type,
                        municipality = %municipality,
                        prefix = partition.label(),
                        offset = query.offset,
                        discarded = buffered.len(),
                        "Overflow reported after the first page"
                    );
                }
                return Ok(true);
            }

            pages += 1;
            let count = page.records.len();
            buffered.extend(page.records);

            if count < query.limit {
                break;
            }
            query = query.next_page();
        }

        report.pages += pages;
        if !buffered.is_empty() {
            sink.accept(entity_type, &buffered)?;
            report.records += buffered.len();
        }
        Ok(false)
    }
}
