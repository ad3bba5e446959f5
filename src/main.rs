use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use heartbeat_monitor::{
    agent::Agent,
    api::AppState,
    collector::{IngestListener, MembershipTable, Sweeper},
    config::{Config, Mode, Overrides},
};

#[derive(Parser, Debug)]
#[command(name = "heartbeat")]
#[command(about = "Liveness collector and beacon agent")]
struct Args {
    /// Run as an agent beaconing to this collector address
    #[arg(long)]
    client: Option<String>,

    /// Expected beacon interval in seconds (agent and collector)
    #[arg(short = 't', long = "interval")]
    interval: Option<u64>,

    /// Port the collector accepts beacons on
    #[arg(long)]
    port: Option<u16>,

    /// Port serving the live host listing
    #[arg(long)]
    http_port: Option<u16>,
}

impl From<Args> for Overrides {
    fn from(args: Args) -> Self {
        Overrides {
            client: args.client,
            interval_secs: args.interval,
            ingest_port: args.port,
            http_port: args.http_port,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    let args = Args::parse();
    let config = Config::load()?.apply(args.into());
    config.validate()?;
    info!("Configuration loaded: mode={:?}", config.mode);

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        shutdown_on_signal(tokio::signal::ctrl_c().await, &shutdown);
    });

    match config.mode {
        Mode::Collector => run_collector(config, cancel).await,
        Mode::Agent => {
            Agent::from_config(&config)?.run(cancel).await;
            Ok(())
        }
    }
}

/// Cancels only on a delivered signal; a handler that failed to install leaves the token alone.
fn shutdown_on_signal(signal: std::io::Result<()>, cancel: &CancellationToken) {
    match signal {
        Ok(()) => {
            info!("Shutting down...");
            cancel.cancel();
        }
        Err(e) => warn!("Could not install Ctrl-C handler: {}; stop the process to exit", e),
    }
}

async fn run_collector(config: Config, cancel: CancellationToken) -> Result<()> {
    info!("Starting heartbeat collector");

    let table = MembershipTable::new();
    let mut state = AppState::new(table.clone(), config.clone());
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => state = state.with_metrics(handle),
        Err(e) => warn!("Metrics recorder unavailable: {}", e),
    }

    // Without the beacon port there is nothing to collect
    let listener = IngestListener::bind(config.ingest_addr()?, table.clone(), state.event_tx.clone())
        .await?
        .with_read_timeout(config.read_timeout())
        .with_max_payload(config.max_beacon_bytes);

    let sweeper = Sweeper::new(table, config.beacon_interval(), state.event_tx.clone());

    let tracker = TaskTracker::new();
    tracker.spawn(sweeper.run(cancel.clone()));
    tracker.spawn(listener.run(cancel.clone()));

    let http_addr = config.http_addr()?;
    match tokio::net::TcpListener::bind(http_addr).await {
        Ok(http_listener) => {
            info!("Listening on {}", http_addr);
            let http_cancel = cancel.clone();
            tracker.spawn(async move {
                if let Err(e) = heartbeat_monitor::serve(http_listener, state, http_cancel).await {
                    error!("HTTP server error: {}", e);
                }
            });
        }
        Err(e) => {
            error!("Could not start snapshot server on {}: {}; beacons are still collected", http_addr, e);
        }
    }

    tracker.close();
    cancel.cancelled().await;
    tracker.wait().await;
    info!("Collector stopped");

    Ok(())
}
