//! Request pacing
//!
//! Each upstream service gets its own gate. A gate enforces a minimum gap
//! between the *starts* of consecutive requests; time already spent on the
//! previous request counts toward the gap.

use crate::config::PrvotkarConfig;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[async_trait]
pub trait Pacer: Send + Sync {
    /// Waits until the next request may start
    async fn wait(&self);
}

/// Minimum spacing between request starts
#[derive(Debug)]
pub struct FixedIntervalGate {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl FixedIntervalGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Pacer for FixedIntervalGate {
    async fn wait(&self) {
        // Held across the sleep so concurrent callers queue up in order
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            tokio::time::sleep_until(previous + self.interval).await;
        }
        *last = Some(Instant::now());
    }
}

/// Gate that never waits
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPacing;

#[async_trait]
impl Pacer for NoPacing {
    async fn wait(&self) {}
}

/// The gates used by one run
#[derive(Clone)]
pub struct Pacing {
    pub region: Arc<dyn Pacer>,
    pub municipality: Arc<dyn Pacer>,
    pub page: Arc<dyn Pacer>,
    pub geocode: Arc<dyn Pacer>,
}

impl Pacing {
    pub fn from_config(config: &PrvotkarConfig) -> Self {
        Self {
            region: gate(config.gazetteer.region_delay_ms),
            municipality: gate(config.registry.municipality_delay_ms),
            page: gate(config.registry.page_delay_ms),
            geocode: Arc::new(FixedIntervalGate::new(config.geocoding.min_delay())),
        }
    }

    /// No waiting anywhere; for tests against local fakes
    pub fn none() -> Self {
        Self {
            region: Arc::new(NoPacing),
            municipality: Arc::new(NoPacing),
            page: Arc::new(NoPacing),
            geocode: Arc::new(NoPacing),
        }
    }
}

fn gate(delay_ms: u64) -> Arc<dyn Pacer> {
    if delay_ms == 0 {
        Arc::new(NoPacing)
    } else {
        Arc::new(FixedIntervalGate::new(Duration::from_millis(delay_ms)))
    }
}
