//! Service configuration
//!
//! Loaded once at startup from a YAML file with `TAGSRV_`-prefixed
//! environment overrides layered on top.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::remote::Endpoint;
use crate::supervisor::{ConnectTarget, ReconnectPolicy};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagServiceConfig {
    /// Controller endpoint
    pub endpoint: EndpointConfig,

    /// Rack identifier of the target processor unit
    #[serde(default)]
    pub rack: u16,

    /// Ordered slot identifiers to try when connecting
    #[serde(default = "default_slot_candidates")]
    pub slot_candidates: Vec<u16>,

    /// Poll period in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub reconnect: ReconnectConfig,

    /// CSV point table path
    #[serde(default = "default_point_table")]
    pub point_table: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Minimum time between reconnect attempts
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    /// Pause between slot candidates inside one attempt
    #[serde(default = "default_candidate_pause_ms")]
    pub candidate_pause_ms: u64,
    /// Retry ceiling before escalating to a process restart
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: default_cooldown_ms(),
            candidate_pause_ms: default_candidate_pause_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_slot_candidates() -> Vec<u16> {
    // Common CPU slots, tried in order
    vec![0, 1, 2]
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_point_table() -> String {
    "config/points.csv".to_string()
}

fn default_port() -> u16 {
    // ISO-on-TCP well-known port
    102
}

fn default_cooldown_ms() -> u64 {
    5000
}

fn default_candidate_pause_ms() -> u64 {
    500
}

fn default_max_attempts() -> u32 {
    10
}

impl TagServiceConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("TAGSRV_").split("__"))
            .extract()
            .with_context(|| format!("Failed to load configuration from {}", path.display()))
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            host: self.endpoint.host.clone(),
            port: self.endpoint.port,
        }
    }

    pub fn connect_target(&self) -> ConnectTarget {
        ConnectTarget {
            endpoint: self.endpoint(),
            rack: self.rack,
            slot_candidates: self.slot_candidates.clone(),
        }
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            cooldown: Duration::from_millis(self.reconnect.cooldown_ms),
            candidate_pause: Duration::from_millis(self.reconnect.candidate_pause_ms),
            max_attempts: self.reconnect.max_attempts,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
