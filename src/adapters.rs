//! Config schema to component settings mapping.

use std::time::Duration;

use anyhow::Context;
use url::Url;

use riaa_bridge::bridge::BridgeSettings;
use riaa_config::Config;
use riaa_panel::controller::PanelSettings;
use riaa_panel::recommend::RecommendClient;
use riaa_protocols::origin::{Environment, Origin, OriginPolicy, DEFAULT_ALLOWED_HOSTS};

pub(crate) fn bridge_settings(config: &Config) -> BridgeSettings {
    BridgeSettings {
        discovery_timeout: Duration::from_millis(config.bridge.discovery_timeout_ms),
        probe_interval: Duration::from_millis(config.bridge.probe_interval_ms),
        poll_interval: Duration::from_millis(config.bridge.poll_interval_ms),
        resize_max_attempts: config.bridge.resize_max_attempts,
        resize_retry: Duration::from_millis(config.bridge.resize_retry_ms),
    }
}

pub(crate) fn panel_settings(config: &Config) -> PanelSettings {
    PanelSettings {
        handshake_interval: Duration::from_millis(config.panel.handshake_interval_ms),
        handshake_max_attempts: config.panel.handshake_max_attempts,
    }
}

/// Environment for a given hostname, honoring the config override.
pub(crate) fn environment(config: &Config, hostname: &str) -> Environment {
    Environment::detect(hostname, config.trust.dev_override)
}

/// Bridge-side trust policy. An empty configured allow-list falls back to
/// the built-in one.
pub(crate) fn host_policy(
    config: &Config,
    environment: Environment,
    script_origin: Option<Origin>,
) -> OriginPolicy {
    let allowed_hosts = if config.trust.allowed_hosts.is_empty() {
        DEFAULT_ALLOWED_HOSTS.iter().map(|s| s.to_string()).collect()
    } else {
        config.trust.allowed_hosts.clone()
    };
    OriginPolicy::new(environment, script_origin, allowed_hosts)
}

pub(crate) fn recommend_client(config: &Config) -> anyhow::Result<RecommendClient> {
    let endpoint = Url::parse(&config.recommend.endpoint)
        .with_context(|| format!("invalid recommend endpoint: {}", config.recommend.endpoint))?;
    RecommendClient::new(endpoint, Duration::from_millis(config.recommend.timeout_ms))
        .context("failed to build recommendation client")
}
