use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::protocol;
use super::table::MembershipTable;
use crate::error::{AppError, AppResult};
use crate::models::MembershipEvent;

const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_PAYLOAD: usize = 4096;
const MAX_ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

/// Accepts beacon connections and commits each decoded beacon to the table.
///
/// Every accepted connection is handled on its own task, so a slow or
/// misbehaving peer never holds up the accept loop or other peers.
pub struct IngestListener {
    listener: TcpListener,
    table: MembershipTable,
    events: broadcast::Sender<MembershipEvent>,
    read_timeout: Duration,
    max_payload: usize,
}

impl IngestListener {
    pub async fn bind(
        addr: SocketAddr,
        table: MembershipTable,
        events: broadcast::Sender<MembershipEvent>,
    ) -> AppResult<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| AppError::Bind { addr, source })?;

        Ok(Self {
            listener,
            table,
            events,
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_payload: DEFAULT_MAX_PAYLOAD,
        })
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn with_max_payload(mut self, max_payload: usize) -> Self {
        self.max_payload = max_payload;
        self
    }

    pub fn local_addr(&self) -> AppResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        if let Ok(addr) = self.listener.local_addr() {
            info!("Beacon listener accepting on {}", addr);
        }

        let mut accept_failures: u32 = 0;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Beacon listener shutting down");
                    break;
                }
                result = self.listener.accept() => match result {
                    Ok((stream, peer)) => {
                        accept_failures = 0;
                        let table = self.table.clone();
                        let events = self.events.clone();
                        let read_timeout = self.read_timeout;
                        let max_payload = self.max_payload;
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, peer, table, events, read_timeout, max_payload).await {
                                metrics::increment_counter!(failure_metric(&e));
                                warn!("Dropped beacon from {}: {}", peer, e);
                            }
                        });
                    }
                    Err(e) => {
                        // Persistent failures such as fd exhaustion fail again immediately
                        accept_failures = accept_failures.saturating_add(1);
                        let backoff = accept_backoff(accept_failures);
                        error!("Connection error: {}; retrying in {:?}", e, backoff);
                        tokio::select! {
                            _ = cancel.cancelled() => {}
                            _ = tokio::time::sleep(backoff) => {}
                        }
                    }
                }
            }
        }
    }
}

/// Delay after the `failures`-th consecutive accept error: 10ms doubling up to one second.
fn accept_backoff(failures: u32) -> Duration {
    let exponent = failures.saturating_sub(1).min(10);
    Duration::from_millis(10u64 << exponent).min(MAX_ACCEPT_BACKOFF)
}

/// Counter a dropped connection is recorded under
fn failure_metric(err: &AppError) -> &'static str {
    match err {
        AppError::Decode(_) | AppError::PayloadTooLarge { .. } => "heartbeat_decode_failures_total",
        _ => "heartbeat_dropped_connections_total",
    }
}

/// Table key for a peer: its IP with the port stripped.
pub(crate) fn source_key(peer: &SocketAddr) -> String {
    peer.ip().to_canonical().to_string()
}

#[instrument(skip(stream, table, events), fields(source = %source_key(&peer)))]
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    table: MembershipTable,
    events: broadcast::Sender<MembershipEvent>,
    read_timeout: Duration,
    max_payload: usize,
) -> AppResult<()> {
    let beacon = tokio::time::timeout(read_timeout, protocol::read_beacon(stream, max_payload))
        .await
        .map_err(|_| AppError::Timeout(read_timeout))??;

    let key = source_key(&peer);
    let previous = table
        .upsert(&key, &beacon.identity, beacon.timestamp)
        .await;
    metrics::increment_counter!("heartbeat_beacons_total");

    let event = match previous {
        None => {
            info!("New member {} ({})", beacon.identity, key);
            MembershipEvent::Joined {
                key,
                identity: beacon.identity,
            }
        }
        Some(_) => {
            debug!("Refreshed member {} ({}) at {}", beacon.identity, key, beacon.timestamp);
            MembershipEvent::Refreshed {
                key,
                identity: beacon.identity,
            }
        }
    };
    let _ = events.send(event);

    Ok(())
}
