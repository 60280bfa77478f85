//! Host runtime discovery.
//!
//! The host application exposes its runtime object on the global scope
//! under one of a small set of known property names, and it may appear at
//! any point during page startup. Discovery probes a ranked table of
//! property names on a short tick until the runtime appears or a bounded
//! deadline elapses.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::host::HostRuntime;

/// The global scope the bridge script runs in.
pub trait GlobalScope: Send + Sync {
    /// Look up a host runtime candidate by global property name.
    fn lookup(&self, property: &str) -> Option<Arc<dyn HostRuntime>>;
}

/// One ranked discovery probe.
pub struct HostProbe {
    pub name: &'static str,
    pub property: &'static str,
}

/// Discovery probes in preference order.
pub const HOST_PROBES: &[HostProbe] = &[
    HostProbe {
        name: "designer-api",
        property: "sitepilotDesigner",
    },
    HostProbe {
        name: "legacy-global",
        property: "__sitepilotHost",
    },
];

/// Probe the global scope for a host runtime until `deadline` elapses.
///
/// Returns the runtime and the name of the probe that found it, or `None`
/// when the bounded wait expires with nothing present.
pub async fn discover(
    scope: &dyn GlobalScope,
    deadline: Duration,
    probe_interval: Duration,
) -> Option<(Arc<dyn HostRuntime>, &'static str)> {
    let started = Instant::now();
    loop {
        for probe in HOST_PROBES {
            if let Some(runtime) = scope.lookup(probe.property) {
                info!(probe = probe.name, "host runtime discovered");
                return Some((runtime, probe.name));
            }
        }
        if started.elapsed() >= deadline {
            let waited_ms = deadline.as_millis();
            debug!(%waited_ms, "host discovery timed out");
            return None;
        }
        sleep(probe_interval.min(deadline.saturating_sub(started.elapsed()))).await;
    }
}
