//! Sync summary and reporting
//!
//! Tracks what a sync run did and the per-municipality problems it ran into
//! without stopping.

use crate::adapters::store::UpsertStats;
use crate::core::geocode::GeocodeSummary;
use crate::core::sync::fetcher::FetchReport;
use std::time::Duration;

/// Summary of a sync run
#[derive(Debug, Clone)]
pub struct SyncSummary {
    /// Municipalities in scope for the run
    pub total_municipalities: usize,

    /// (entity type, municipality) pairs that were fetched
    pub partitions_processed: usize,

    /// Records received from the registry
    pub records_fetched: usize,

    /// Rows inserted or changed
    pub records_written: usize,

    /// Rows already up to date
    pub records_unchanged: usize,

    /// Registry pages given up on after retries
    pub failed_pages: usize,

    /// Municipality list came from the built-in fallback
    pub degraded_regions: bool,

    /// Stopped early by a shutdown signal
    pub interrupted: bool,

    /// Geocoding phase result, if the phase ran
    pub geocode: Option<GeocodeSummary>,

    /// Duration of the run
    pub duration: Duration,

    /// Problems recorded without aborting the run
    pub errors: Vec<SyncIssue>,
}

impl SyncSummary {
    pub fn new() -> Self {
        Self {
            total_municipalities: 0,
            partitions_processed: 0,
            records_fetched: 0,
            records_written: 0,
            records_unchanged: 0,
            failed_pages: 0,
            degraded_regions: false,
            interrupted: false,
            geocode: None,
            duration: Duration::from_secs(0),
            errors: Vec::new(),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn add_error(&mut self, error: SyncIssue) {
        self.errors.push(error);
    }

    /// Folds one municipality fetch into the totals
    pub fn record_fetch(&mut self, report: &FetchReport, stats: UpsertStats) {
        self.partitions_processed += 1;
        self.records_fetched += report.records;
        self.failed_pages += report.failed_pages;
        self.records_written += stats.written;
        self.records_unchanged += stats.unchanged;
    }

    /// No recorded problems, nothing skipped
    pub fn is_successful(&self) -> bool {
        self.errors.is_empty() && self.failed_pages == 0 && !self.interrupted
    }

    pub fn log_summary(&self) {
        tracing::info!(
            municipalities = self.total_municipalities,
            partitions = self.partitions_processed,
            fetched = self.records_fetched,
            written = self.records_written,
            unchanged = self.records_unchanged,
            failed_pages = self.failed_pages,
            degraded_regions = self.degraded_regions,
            interrupted = self.interrupted,
            duration_secs = self.duration.as_secs(),
            "Sync completed"
        );

        if let Some(geocode) = &self.geocode {
            geocode.log_summary();
        }

        if !self.errors.is_empty() {
            tracing::warn!(error_count = self.errors.len(), "Sync completed with errors");
            for error in &self.errors {
                tracing::warn!(
                    kind = ?error.kind,
                    message = %error.message,
                    context = error.context.as_deref().unwrap_or(""),
                    "Sync error"
                );
            }
        }
    }
}

impl Default for SyncSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// Kind of problem recorded during a sync
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncIssueKind {
    /// Registry or gazetteer unreachable or refusing requests
    Connection,
    /// A partition still overflowed at the maximum prefix depth
    Coverage,
    /// A partition hit the page cap
    Truncated,
    /// Local store failure
    Storage,
    /// Anything else
    Unknown,
}

/// A problem with context
#[derive(Debug, Clone)]
pub struct SyncIssue {
    pub kind: SyncIssueKind,
    pub message: String,
    /// e.g. entity type and municipality
    pub context: Option<String>,
}

impl SyncIssue {
    pub fn new(kind: SyncIssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}
