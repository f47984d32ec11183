//! Gauge registration cache and exposition rendering.
//!
//! Each (mpxn, tier, kind) identity maps to exactly one registered gauge for
//! the process lifetime. Gauges are created on first use with a constant
//! label set and updated in place thereafter; last write wins. The cache is
//! owned by the scanner instance rather than living in a process-wide
//! default registry, so tests can run independent instances side by side.

use crate::ovo::model::SupplyPoint;
use prometheus::{Encoder, Gauge, Opts, Registry, TextEncoder};
use std::collections::HashMap;
use std::sync::Arc;

pub const READING_LAST: &str = "ovo_reading_last";
pub const READING_AGE_SECONDS: &str = "ovo_reading_age_seconds";

/// Which of the two gauge families an identity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Latest reading value (`ovo_reading_last`)
    Value,
    /// Seconds since the reading timestamp (`ovo_reading_age_seconds`)
    Age,
}

/// Composite key deduplicating gauge creation. One identity maps to exactly
/// one gauge; its constant labels are fixed at creation and never change.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricIdentity {
    pub mpxn: String,
    pub tier: Option<String>,
    pub kind: MetricKind,
}

impl MetricIdentity {
    pub fn value(mpxn: impl Into<String>, tier: Option<String>) -> Self {
        Self {
            mpxn: mpxn.into(),
            tier,
            kind: MetricKind::Value,
        }
    }

    pub fn age(mpxn: impl Into<String>) -> Self {
        Self {
            mpxn: mpxn.into(),
            tier: None,
            kind: MetricKind::Age,
        }
    }
}

/// Identity-keyed gauge cache backed by an instance-owned registry.
pub struct GaugeCache {
    registry: Arc<Registry>,
    gauges: HashMap<MetricIdentity, Gauge>,
}

impl GaugeCache {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            gauges: HashMap::new(),
        }
    }

    /// Registry handle for the exposition endpoint. Gauge values are safe to
    /// read concurrently with scan-task writes; the cache map itself is only
    /// ever touched by the scan task.
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Returns the gauge for an identity, registering it on first use with
    /// constant labels taken from the supply point.
    pub fn get_or_create(
        &mut self,
        identity: &MetricIdentity,
        point: &SupplyPoint,
    ) -> Result<Gauge, prometheus::Error> {
        if let Some(gauge) = self.gauges.get(identity) {
            return Ok(gauge.clone());
        }

        let mut labels = HashMap::new();
        labels.insert("fuel".to_string(), point.fuel.to_string());
        labels.insert("mpxn".to_string(), point.mpxn.clone());
        labels.insert("msn".to_string(), point.msn.clone());

        let opts = match identity.kind {
            MetricKind::Value => {
                labels.insert(
                    "tier".to_string(),
                    identity.tier.clone().unwrap_or_else(|| "default".to_string()),
                );
                Opts::new(READING_LAST, "Latest meter reading value").const_labels(labels)
            }
            MetricKind::Age => Opts::new(
                READING_AGE_SECONDS,
                "Seconds between the latest reading timestamp and its publish time",
            )
            .const_labels(labels),
        };

        let gauge = Gauge::with_opts(opts)?;
        self.registry.register(Box::new(gauge.clone()))?;
        self.gauges.insert(identity.clone(), gauge.clone());
        Ok(gauge)
    }

    /// Overwrites the gauge's current value, creating it if needed.
    pub fn set(
        &mut self,
        identity: &MetricIdentity,
        point: &SupplyPoint,
        value: f64,
    ) -> Result<(), prometheus::Error> {
        self.get_or_create(identity, point)?.set(value);
        Ok(())
    }
}

impl Default for GaugeCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders the registry in the Prometheus text exposition format.
pub fn render(registry: &Registry) -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        tracing::error!("failed to encode metrics: {:?}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
