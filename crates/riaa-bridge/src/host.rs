//! Host runtime surface and capability probing.
//!
//! Host API shapes vary across design-tool versions: some expose a
//! `subscribe`-style listener registration, some an `on`-style one; some
//! return the whole selection, some only the first element. Capability
//! probing is expressed as ranked strategy tables - an ordered list of
//! (predicate, action) pairs tried in order - rather than ad hoc branching.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use riaa_protocols::error::HostApiError;

/// Candidate selection-change event names, covering host naming variants.
pub const SELECTION_EVENTS: &[&str] = &["selectionchange", "selection-changed", "selectionChanged"];

/// Which optional methods a discovered host runtime actually exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostCapabilities {
    /// Host-defined ready callback.
    pub ready: bool,
    /// `subscribe(event, handler)`-style listener registration.
    pub subscribe: bool,
    /// `on(event, handler)`-style listener registration.
    pub on: bool,
    /// Single-element selection getter.
    pub selected_element: bool,
    /// Multi-element selection getter.
    pub selected_elements: bool,
    /// Panel resize method.
    pub resize: bool,
}

impl HostCapabilities {
    /// A fully capable host.
    pub fn full() -> Self {
        Self {
            ready: true,
            subscribe: true,
            on: true,
            selected_element: true,
            selected_elements: true,
            resize: true,
        }
    }

    /// True when any selection getter exists.
    pub fn has_selection_getter(&self) -> bool {
        self.selected_element || self.selected_elements
    }
}

/// The host runtime object discovered on the global scope.
///
/// Callers must consult [`HostCapabilities`] before invoking an optional
/// method; invoking a missing capability returns
/// [`HostApiError::MissingCapability`].
#[async_trait]
pub trait HostRuntime: Send + Sync {
    fn capabilities(&self) -> HostCapabilities;

    /// Await the host-defined ready callback. A no-op passthrough when the
    /// host does not define one.
    async fn ready(&self) -> Result<(), HostApiError>;

    /// Attach a change listener for `event`, delivering raw payloads into
    /// `events`.
    fn attach_listener(
        &self,
        style: AttachStyle,
        event: &str,
        events: mpsc::Sender<Value>,
    ) -> Result<(), HostApiError>;

    /// Raw single-element selection.
    async fn selected_element(&self) -> Result<Value, HostApiError>;

    /// Raw multi-element selection.
    async fn selected_elements(&self) -> Result<Value, HostApiError>;

    /// Resize the panel surface.
    async fn resize_panel(&self, width: u32, height: u32) -> Result<(), HostApiError>;
}

/// Listener registration style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachStyle {
    Subscribe,
    On,
}

/// One ranked listener-attachment strategy.
pub struct AttachStrategy {
    pub name: &'static str,
    pub applies: fn(&HostCapabilities) -> bool,
    pub style: AttachStyle,
}

/// Attachment strategies in preference order.
pub const ATTACH_STRATEGIES: &[AttachStrategy] = &[
    AttachStrategy {
        name: "subscribe-style",
        applies: |caps| caps.subscribe,
        style: AttachStyle::Subscribe,
    },
    AttachStrategy {
        name: "on-style",
        applies: |caps| caps.on,
        style: AttachStyle::On,
    },
];

/// First attachment strategy the host supports.
pub fn pick_attach(caps: &HostCapabilities) -> Option<&'static AttachStrategy> {
    ATTACH_STRATEGIES.iter().find(|s| (s.applies)(caps))
}

/// Selection retrieval variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionGetter {
    Multi,
    Single,
}

/// One ranked selection-getter strategy.
pub struct GetterStrategy {
    pub name: &'static str,
    pub applies: fn(&HostCapabilities) -> bool,
    pub getter: SelectionGetter,
}

/// Getter strategies in preference order: the multi-element variant carries
/// the whole selection, so it outranks the single-element one.
pub const GETTER_STRATEGIES: &[GetterStrategy] = &[
    GetterStrategy {
        name: "multi-element",
        applies: |caps| caps.selected_elements,
        getter: SelectionGetter::Multi,
    },
    GetterStrategy {
        name: "single-element",
        applies: |caps| caps.selected_element,
        getter: SelectionGetter::Single,
    },
];

/// First getter strategy the host supports.
pub fn pick_getter(caps: &HostCapabilities) -> Option<&'static GetterStrategy> {
    GETTER_STRATEGIES.iter().find(|s| (s.applies)(caps))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_capabilities() {
        let caps = HostCapabilities::full();
        assert!(caps.has_selection_getter());
        assert!(caps.ready);
    }

    #[test]
    fn test_no_getter() {
        let caps = HostCapabilities {
            resize: true,
            ..Default::default()
        };
        assert!(!caps.has_selection_getter());
        assert!(pick_getter(&caps).is_none());
    }

    #[test]
    fn test_getter_ranking_prefers_multi() {
        let caps = HostCapabilities::full();
        let strategy = pick_getter(&caps).unwrap();
        assert_eq!(strategy.getter, SelectionGetter::Multi);
        assert_eq!(strategy.name, "multi-element");
    }

    #[test]
    fn test_getter_falls_back_to_single() {
        let caps = HostCapabilities {
            selected_element: true,
            ..Default::default()
        };
        let strategy = pick_getter(&caps).unwrap();
        assert_eq!(strategy.getter, SelectionGetter::Single);
    }

    #[test]
    fn test_attach_ranking_prefers_subscribe() {
        let caps = HostCapabilities::full();
        let strategy = pick_attach(&caps).unwrap();
        assert_eq!(strategy.style, AttachStyle::Subscribe);
    }

    #[test]
    fn test_attach_falls_back_to_on() {
        let caps = HostCapabilities {
            on: true,
            ..Default::default()
        };
        let strategy = pick_attach(&caps).unwrap();
        assert_eq!(strategy.style, AttachStyle::On);
    }

    #[test]
    fn test_attach_none_without_listener_methods() {
        assert!(pick_attach(&HostCapabilities::default()).is_none());
    }
}
