//! Application settings and TOML configuration parsing.

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Top-level Telwarden configuration, loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardenConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Detection thresholds and window length.
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Authorization collaborator (revoke endpoint) settings.
    #[serde(default)]
    pub auth_service: AuthServiceConfig,

    /// Idle device window eviction settings.
    #[serde(default)]
    pub eviction: EvictionConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the telemetry endpoint binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

/// Detection thresholds. All comparisons are strict greater-than, so the
/// boundary values themselves (exactly `flood_threshold` events, exactly
/// `payload_threshold` bytes) are not anomalous.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Events per window above which a device is flooding.
    #[serde(default = "default_flood_threshold")]
    pub flood_threshold: u64,
    /// Length of the trailing window in seconds.
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
    /// Payload size in bytes above which an event is a spike.
    #[serde(default = "default_payload_threshold")]
    pub payload_threshold: u64,
}

/// Settings for the outbound revoke call to the authorization collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthServiceConfig {
    /// Base URL of the authorization service; `/revoke` is appended.
    #[serde(default = "default_auth_base_url")]
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Delivery attempts per revoke instruction. 1 preserves fire-and-forget
    /// semantics; higher values opt into bounded retry.
    #[serde(default = "default_revoke_attempts")]
    pub revoke_attempts: u32,
    /// Fixed pause between retry attempts in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Capacity of the revocation dispatch queue. When full, instructions
    /// are dropped with a warning rather than blocking ingestion.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

/// Idle device eviction. The store otherwise grows with the set of distinct
/// device identities ever seen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvictionConfig {
    /// Whether the background sweeper runs.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds since last telemetry before a device window is evicted.
    #[serde(default = "default_idle_seconds")]
    pub idle_seconds: u64,
    /// Sweep interval in seconds.
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,
}

// --- Default value functions ---

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_flood_threshold() -> u64 {
    10
}

fn default_window_seconds() -> u64 {
    60
}

fn default_payload_threshold() -> u64 {
    1000
}

fn default_auth_base_url() -> String {
    "http://127.0.0.1:3001".to_string()
}

fn default_request_timeout_ms() -> u64 {
    3000
}

fn default_revoke_attempts() -> u32 {
    1
}

fn default_retry_backoff_ms() -> u64 {
    250
}

fn default_queue_capacity() -> usize {
    256
}

fn default_idle_seconds() -> u64 {
    900
}

fn default_sweep_interval_seconds() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

// --- Trait impls ---

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            detection: DetectionConfig::default(),
            auth_service: AuthServiceConfig::default(),
            eviction: EvictionConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            flood_threshold: default_flood_threshold(),
            window_seconds: default_window_seconds(),
            payload_threshold: default_payload_threshold(),
        }
    }
}

impl Default for AuthServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_auth_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            revoke_attempts: default_revoke_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl Default for EvictionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            idle_seconds: default_idle_seconds(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
        }
    }
}

impl WardenConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// If the file does not exist, returns the default configuration.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config: WardenConfig = toml::from_str(&contents)?;
        Ok(config)
    }
}
