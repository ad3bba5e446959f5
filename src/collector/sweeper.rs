use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::table::MembershipTable;
use crate::models::{MemberRecord, MembershipEvent};

/// Missed beacons tolerated before a source is declared dead
pub const TIMEOUT_MULTIPLIER: u32 = 3;

/// Periodically evicts members whose last beacon is older than
/// `TIMEOUT_MULTIPLIER` beacon intervals.
pub struct Sweeper {
    table: MembershipTable,
    interval: Duration,
    events: broadcast::Sender<MembershipEvent>,
}

impl Sweeper {
    pub fn new(
        table: MembershipTable,
        interval: Duration,
        events: broadcast::Sender<MembershipEvent>,
    ) -> Self {
        Self {
            table,
            interval,
            events,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Age past which a member is evicted
    pub fn timeout(&self) -> Duration {
        self.interval.saturating_mul(TIMEOUT_MULTIPLIER)
    }

    /// Run one sweep as of `now` and return the evicted records.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Vec<MemberRecord> {
        let cutoff = chrono::Duration::from_std(self.timeout())
            .ok()
            .and_then(|timeout| now.checked_sub_signed(timeout));
        // A timeout beyond the representable range means nothing is ever old enough
        let Some(cutoff) = cutoff else {
            return Vec::new();
        };

        let evicted = self.table.evict_older_than(cutoff).await;
        for record in &evicted {
            warn!(
                "Machine {} : {} timed out, removed from membership (last seen {})",
                record.source_address, record.identity, record.last_seen
            );
            metrics::increment_counter!("heartbeat_evictions_total");
            let _ = self.events.send(MembershipEvent::Evicted {
                key: record.source_address.clone(),
                identity: record.identity.clone(),
                last_seen: record.last_seen,
            });
        }

        let remaining = self.table.len().await;
        metrics::gauge!("heartbeat_members", remaining as f64);
        debug!("Sweep done: evicted={} remaining={}", evicted.len(), remaining);

        evicted
    }

    pub async fn sweep(&self) -> Vec<MemberRecord> {
        self.sweep_at(Utc::now()).await
    }

    /// Sleep one interval, sweep, repeat until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            "Expiry sweeper started: interval={:?} timeout={:?}",
            self.interval,
            self.timeout()
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Expiry sweeper shutting down");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {
                    self.sweep().await;
                }
            }
        }
    }
}
