//! Beacon agent
//!
//! Dials the collector once per interval, writes a single beacon and closes.
//! Failures are logged and the next tick simply tries again.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::collector::protocol;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::Beacon;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Agent {
    target: String,
    identity: String,
    interval: Duration,
}

impl Agent {
    pub fn new(target: impl Into<String>, identity: impl Into<String>, interval: Duration) -> Self {
        Self {
            target: target.into(),
            identity: identity.into(),
            interval,
        }
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Ok(Self::new(
            config.target_addr()?,
            config.agent_identity(),
            config.beacon_interval(),
        ))
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Send a single beacon stamped with the current time.
    pub async fn beacon_once(&self) -> AppResult<()> {
        send_beacon(&self.target, &Beacon::now(&self.identity)).await
    }

    /// Beacon immediately, then once per interval until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            "Agent {} beaconing to {} every {:?}",
            self.identity, self.target, self.interval
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Agent shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    match self.beacon_once().await {
                        Ok(()) => debug!("Beacon sent to {}", self.target),
                        Err(e) => warn!("Beacon to {} failed: {}", self.target, e),
                    }
                }
            }
        }
    }
}

/// Open a connection to `target`, write one beacon, close.
pub async fn send_beacon(target: &str, beacon: &Beacon) -> AppResult<()> {
    let mut stream = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(target))
        .await
        .map_err(|_| AppError::Timeout(CONNECT_TIMEOUT))??;
    protocol::write_beacon(&mut stream, beacon).await
}
