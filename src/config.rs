use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Which half of the system this process runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Collector,
    Agent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mode: Mode,

    #[serde(default = "default_beacon_interval_secs")]
    pub beacon_interval_secs: u64,

    #[serde(default = "default_ingest_port")]
    pub ingest_port: u16,

    #[serde(default = "default_http_port")]
    pub http_port: u16,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Collector to beacon toward (agent mode only)
    #[serde(default)]
    pub target: Option<String>,

    #[serde(default)]
    pub identity: Option<String>,

    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,

    #[serde(default = "default_max_beacon_bytes")]
    pub max_beacon_bytes: usize,

    #[serde(default = "default_public_dir")]
    pub public_dir: String,
}

fn default_beacon_interval_secs() -> u64 {
    10 * 60
}

fn default_ingest_port() -> u16 {
    5656
}

fn default_http_port() -> u16 {
    8080
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_read_timeout_secs() -> u64 {
    30
}

fn default_max_beacon_bytes() -> usize {
    4096
}

fn default_public_dir() -> String {
    "public".to_string()
}

/// Values taken from the command line; anything set here wins over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub client: Option<String>,
    pub interval_secs: Option<u64>,
    pub ingest_port: Option<u16>,
    pub http_port: Option<u16>,
}

impl Config {
    pub fn load() -> AppResult<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(target) = overrides.client {
            self.mode = Mode::Agent;
            self.target = Some(target);
        }
        if let Some(secs) = overrides.interval_secs {
            self.beacon_interval_secs = secs;
        }
        if let Some(port) = overrides.ingest_port {
            self.ingest_port = port;
        }
        if let Some(port) = overrides.http_port {
            self.http_port = port;
        }
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.beacon_interval_secs == 0 {
            return Err(AppError::config("beacon interval must be at least one second"));
        }
        if self.mode == Mode::Agent && self.target.as_deref().map_or(true, str::is_empty) {
            return Err(AppError::config("agent mode requires a target address"));
        }
        if self.max_beacon_bytes == 0 {
            return Err(AppError::config("max beacon size must be positive"));
        }
        Ok(())
    }

    pub fn beacon_interval(&self) -> Duration {
        Duration::from_secs(self.beacon_interval_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn ingest_addr(&self) -> AppResult<SocketAddr> {
        self.socket_addr(self.ingest_port)
    }

    pub fn http_addr(&self) -> AppResult<SocketAddr> {
        self.socket_addr(self.http_port)
    }

    fn socket_addr(&self, port: u16) -> AppResult<SocketAddr> {
        let ip: IpAddr = self
            .bind_address
            .parse()
            .map_err(|_| AppError::Config(format!("invalid bind address {}", self.bind_address)))?;
        Ok(SocketAddr::new(ip, port))
    }

    /// `host:port` the agent dials. A bare host gets the ingestion port appended.
    pub fn target_addr(&self) -> AppResult<String> {
        let target = self
            .target
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::config("agent mode requires a target address"))?;

        if target.parse::<SocketAddr>().is_ok() {
            return Ok(target.to_string());
        }
        if let Ok(ip) = target.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.ingest_port).to_string());
        }
        if target.contains(':') {
            return Ok(target.to_string());
        }
        Ok(format!("{}:{}", target, self.ingest_port))
    }

    /// Name the agent reports: explicit setting, then the host name.
    pub fn agent_identity(&self) -> String {
        self.identity
            .clone()
            .filter(|id| !id.is_empty())
            .or_else(|| std::env::var("HOSTNAME").ok().filter(|h| !h.is_empty()))
            .or_else(|| {
                std::fs::read_to_string("/etc/hostname")
                    .ok()
                    .map(|h| h.trim().to_string())
                    .filter(|h| !h.is_empty())
            })
            .unwrap_or_else(|| "unknown".to_string())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            beacon_interval_secs: default_beacon_interval_secs(),
            ingest_port: default_ingest_port(),
            http_port: default_http_port(),
            bind_address: default_bind_address(),
            target: None,
            identity: None,
            read_timeout_secs: default_read_timeout_secs(),
            max_beacon_bytes: default_max_beacon_bytes(),
            public_dir: default_public_dir(),
        }
    }
}
