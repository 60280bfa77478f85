//! Offline pipeline simulation.
//!
//! Runs the real Host Bridge and Panel Controller over an in-memory frame
//! link, against either a scripted host with a small fake document or - in
//! offline mode - no host at all, which exercises the dev-mock path. The
//! scenario finishes with a panel resize and, unless skipped, one analysis
//! request against the configured recommendation endpoint.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use serde_json::json;
use tracing::{info, warn};

use riaa_bridge::bridge::HostBridge;
use riaa_bridge::host::HostCapabilities;
use riaa_config::Config;
use riaa_harness::{ContextSpec, FakeDom, FakeNode, LinkedChannel, ScriptedHost, ScriptedScope};
use riaa_panel::controller::{PanelController, PanelPhase};
use riaa_panel::view::LogView;
use riaa_protocols::origin::{Environment, Origin, OriginPolicy};
use riaa_protocols::shutdown::ShutdownSignal;

use crate::adapters;

const SIM_HOST_ORIGIN: &str = "http://localhost:4000";
const SIM_PANEL_ORIGIN: &str = "http://localhost:4100";

/// Run the simulation scenario to completion.
pub(crate) async fn run(config: &Config, offline: bool, skip_analysis: bool) -> anyhow::Result<()> {
    // The simulator is a developer tool; it always runs as development so
    // the offline path produces the dev mock instead of an empty state.
    let environment = adapters::environment(config, "localhost");
    if environment != Environment::Development {
        warn!("simulation forced into production trust rules by dev_override");
    }

    let host_origin = Origin::parse(SIM_HOST_ORIGIN).context("bad simulator host origin")?;
    let panel_origin = Origin::parse(SIM_PANEL_ORIGIN).context("bad simulator panel origin")?;
    let (host_end, panel_end) = LinkedChannel::pair(
        ContextSpec::new(host_origin.clone()),
        ContextSpec::new(panel_origin),
    );

    let dom = Arc::new(FakeDom::new());
    dom.insert(
        1,
        FakeNode::new("img")
            .with_width(640.0)
            .with_label("Hero image")
            .with_css_path("main > img")
            .with_element_id("hero"),
    );

    let scope = if offline {
        info!("offline simulation: no host runtime will be found");
        ScriptedScope::empty()
    } else {
        let host = ScriptedHost::new(HostCapabilities::full());
        host.set_selection(json!({"selectedElements": [{"domNode": 1}]}));
        ScriptedScope::with_host("sitepilotDesigner", host)
    };

    let bridge = HostBridge::new(
        adapters::bridge_settings(config),
        adapters::host_policy(config, environment, Some(host_origin)),
        dom,
    );
    bridge.attach_panel(host_end);

    let controller = Arc::new(PanelController::new(
        adapters::panel_settings(config),
        OriginPolicy::for_panel(environment, Some(SIM_HOST_ORIGIN)),
        panel_end,
        Arc::new(LogView),
        adapters::recommend_client(config)?,
    ));

    let shutdown = ShutdownSignal::new();
    let bridge_task = {
        let bridge = bridge.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move { bridge.run(scope, shutdown).await })
    };
    let controller_task = {
        let controller = controller.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move { controller.run(shutdown).await })
    };

    wait_for_selection(&controller).await?;

    let state = controller
        .current_state()
        .context("selection arrived without a state")?;
    info!(
        elements = state.elements().len(),
        dev_mock = state.is_dev_mock(),
        "panel settled"
    );

    if let Err(e) = controller.request_resize(420, 600) {
        warn!(error = %e, "resize request failed");
    }

    if skip_analysis {
        info!("analysis skipped");
    } else {
        match controller.analyze().await {
            Ok(outcome) => info!(
                universal = outcome.universal_upload_size,
                fallback = outcome.fallback_used,
                explanation = outcome.explanation.as_deref().unwrap_or(""),
                "analysis complete"
            ),
            Err(e) => warn!(error = %e, "analysis failed"),
        }
    }

    shutdown.trigger();
    let _ = bridge_task.await;
    let _ = controller_task.await;
    info!("simulation finished");
    Ok(())
}

/// Wait until the panel leaves the handshake, bounded well past the
/// discovery deadline.
async fn wait_for_selection(controller: &PanelController) -> anyhow::Result<()> {
    let mut phases = controller.watch_phase();
    let settled = tokio::time::timeout(Duration::from_secs(15), async {
        loop {
            let phase = *phases.borrow_and_update();
            if matches!(phase, PanelPhase::SelectionReady | PanelPhase::SelectionEmpty) {
                return phase;
            }
            if phases.changed().await.is_err() {
                return PanelPhase::Error;
            }
        }
    })
    .await;

    match settled {
        Ok(phase) => {
            info!(phase = phase.as_str(), "handshake settled");
            Ok(())
        }
        Err(_) => bail!("panel never received a selection"),
    }
}
