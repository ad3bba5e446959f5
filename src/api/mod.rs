pub mod events;
pub mod health;
pub mod members;
pub mod metrics;
pub mod response;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::broadcast;

use crate::collector::MembershipTable;
use crate::config::Config;
use crate::models::MembershipEvent;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub table: MembershipTable,
    pub config: Config,
    pub event_tx: broadcast::Sender<MembershipEvent>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(table: MembershipTable, config: Config) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            table,
            config,
            event_tx,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MembershipEvent> {
        self.event_tx.subscribe()
    }
}
