//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bridge: BridgeConfig,

    #[serde(default)]
    pub panel: PanelConfig,

    #[serde(default)]
    pub trust: TrustConfig,

    #[serde(default)]
    pub recommend: RecommendConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Host Bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Deadline for host runtime discovery, in milliseconds.
    #[serde(default = "default_discovery_timeout_ms")]
    pub discovery_timeout_ms: u64,

    /// Interval between discovery probes, in milliseconds.
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,

    /// Selection polling interval, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Attempt cap for forwarding one panel resize request to the host.
    #[serde(default = "default_resize_max_attempts")]
    pub resize_max_attempts: u32,

    /// Delay between resize forwarding attempts, in milliseconds.
    #[serde(default = "default_resize_retry_ms")]
    pub resize_retry_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            discovery_timeout_ms: default_discovery_timeout_ms(),
            probe_interval_ms: default_probe_interval_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            resize_max_attempts: default_resize_max_attempts(),
            resize_retry_ms: default_resize_retry_ms(),
        }
    }
}

fn default_discovery_timeout_ms() -> u64 {
    5000
}

fn default_probe_interval_ms() -> u64 {
    250
}

fn default_poll_interval_ms() -> u64 {
    1500
}

fn default_resize_max_attempts() -> u32 {
    3
}

fn default_resize_retry_ms() -> u64 {
    250
}

/// Panel Controller configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Handshake retry interval, in milliseconds.
    #[serde(default = "default_handshake_interval_ms")]
    pub handshake_interval_ms: u64,

    /// Handshake retry attempt cap.
    #[serde(default = "default_handshake_max_attempts")]
    pub handshake_max_attempts: u32,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            handshake_interval_ms: default_handshake_interval_ms(),
            handshake_max_attempts: default_handshake_max_attempts(),
        }
    }
}

fn default_handshake_interval_ms() -> u64 {
    1000
}

fn default_handshake_max_attempts() -> u32 {
    30
}

/// Origin trust configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustConfig {
    /// Host domains accepted outside development (exact or subdomain match).
    /// An empty list falls back to the built-in allow-list.
    #[serde(default)]
    pub allowed_hosts: Vec<String>,

    /// Force the environment instead of inferring it from the hostname.
    /// `true` forces development, `false` forces production.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_override: Option<bool>,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            allowed_hosts: Vec::new(),
            dev_override: None,
        }
    }
}

/// Recommendation backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendConfig {
    /// Endpoint URL for the recommendation service.
    #[serde(default = "default_recommend_endpoint")]
    pub endpoint: String,

    /// Request timeout, in milliseconds.
    #[serde(default = "default_recommend_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            endpoint: default_recommend_endpoint(),
            timeout_ms: default_recommend_timeout_ms(),
        }
    }
}

fn default_recommend_endpoint() -> String {
    "https://api.sitepilot.io/v1/image-recommendations".to_string()
}

fn default_recommend_timeout_ms() -> u64 {
    10_000
}

/// Local stub server configuration (development only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}
