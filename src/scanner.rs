//! Scan orchestration: one `scan()` drives login, supply point discovery and
//! per-point reading publication with bounded retry. The provider API is
//! flaky and session cookies expire silently, so a cheap fixed-delay retry
//! recovers most transient failures without unbounded resource use.

use crate::error::OvoError;
use crate::metrics::{GaugeCache, MetricIdentity};
use crate::ovo::model::SupplyPoint;
use crate::ovo::normalizer::{normalize, parse_reading_time};
use crate::ovo::OvoClient;
use chrono::Utc;
use prometheus::Registry;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

const SCAN_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(3);

/// Owns the session state and the gauge cache for the process lifetime;
/// both survive across scan cycles. The scan task is their sole writer.
pub struct Scanner {
    client: OvoClient,
    cache: GaugeCache,
    retry_delay: Duration,
}

impl Scanner {
    pub fn new(client: OvoClient) -> Self {
        Self {
            client,
            cache: GaugeCache::new(),
            retry_delay: RETRY_DELAY,
        }
    }

    /// Registry handle for the exposition endpoint.
    pub fn registry(&self) -> Arc<Registry> {
        self.cache.registry()
    }

    /// One full scan cycle with up to three attempts.
    ///
    /// A login failure aborts the whole call; it is only retried on the next
    /// scheduled tick. Fetch and per-point failures are recorded and retried
    /// after a short delay, re-checking the login state first since a
    /// 401/403 in the failed attempt clears it. A per-point failure does not
    /// stop the remaining points in the same pass but does mark the attempt
    /// failed.
    pub async fn scan(&mut self) -> Result<(), OvoError> {
        let mut last_err: Option<OvoError> = None;
        for attempt in 1..=SCAN_ATTEMPTS {
            if let Some(err) = &last_err {
                tokio::time::sleep(self.retry_delay).await;
                tracing::warn!(attempt, "retrying due to error: {}", err);
            }

            if !self.client.logged_in() {
                self.client.login().await?;
            }

            let points = match self.client.load_points().await {
                Ok(points) => points,
                Err(err) => {
                    tracing::warn!("failed to load points: {}", err);
                    last_err = Some(err);
                    continue;
                }
            };

            let mut point_err: Option<OvoError> = None;
            for point in &points {
                if let Err(err) = self.scan_point(point).await {
                    tracing::warn!(mpxn = %point.mpxn, "failed to scan point: {}", err);
                    point_err = Some(err);
                }
            }

            match point_err {
                Some(err) => last_err = Some(err),
                None => return Ok(()),
            }
        }

        match last_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Fetches, normalizes and publishes one point. Value gauges are
    /// published before the timestamp is parsed, so a bad timestamp costs
    /// only the age metric.
    async fn scan_point(&mut self, point: &SupplyPoint) -> Result<(), OvoError> {
        let readings = self.client.load_readings(point).await?;
        let normalized = normalize(point, &readings);
        if normalized.instructions.is_empty() && normalized.read_at.is_none() {
            tracing::info!(mpxn = %point.mpxn, "no recent readings");
            return Ok(());
        }

        for instruction in &normalized.instructions {
            self.cache
                .set(&instruction.identity, point, instruction.value)?;
        }
        if !normalized.instructions.is_empty() {
            tracing::info!(
                mpxn = %point.mpxn,
                gauges = normalized.instructions.len(),
                "published latest reading"
            );
        }

        if let Some(read_at) = &normalized.read_at {
            let timestamp = parse_reading_time(read_at)?;
            let age = Utc::now()
                .naive_utc()
                .signed_duration_since(timestamp)
                .num_seconds() as f64;
            self.cache
                .set(&MetricIdentity::age(&point.mpxn), point, age)?;
        }
        Ok(())
    }
}

/// Scan loop: runs a scan immediately, then once per interval, forever.
/// A failed scan is logged and does not stop future ticks; a new tick never
/// starts while a scan is still running.
pub async fn run(mut scanner: Scanner, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match scanner.scan().await {
            Ok(()) => tracing::info!("scan complete"),
            Err(err) => tracing::error!("failed to scan ovo: {}", err),
        }
    }
}
