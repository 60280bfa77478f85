//! Scripted host runtime and global scope.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;

use riaa_bridge::discovery::GlobalScope;
use riaa_bridge::host::{AttachStyle, HostCapabilities, HostRuntime};
use riaa_protocols::error::HostApiError;

/// Host runtime driven by the test script.
///
/// Capability gaps are configured up front; selection payloads and failure
/// injection are mutable while the bridge runs.
pub struct ScriptedHost {
    caps: HostCapabilities,
    selection: Mutex<Value>,
    listeners: Mutex<Vec<(String, mpsc::Sender<Value>)>>,
    selection_failures_left: AtomicU32,
    resize_failures_left: AtomicU32,
    resize_log: Mutex<Vec<(u32, u32)>>,
    attach_log: Mutex<Vec<(AttachStyle, String)>>,
    ready_calls: AtomicU32,
}

impl ScriptedHost {
    pub fn new(caps: HostCapabilities) -> Arc<Self> {
        Arc::new(Self {
            caps,
            selection: Mutex::new(Value::Null),
            listeners: Mutex::new(Vec::new()),
            selection_failures_left: AtomicU32::new(0),
            resize_failures_left: AtomicU32::new(0),
            resize_log: Mutex::new(Vec::new()),
            attach_log: Mutex::new(Vec::new()),
            ready_calls: AtomicU32::new(0),
        })
    }

    /// Replace the current selection payload returned by the getters.
    pub fn set_selection(&self, payload: Value) {
        *self.selection.lock() = payload;
    }

    /// Fire a selection-change event with `payload` to every attached
    /// listener.
    pub async fn fire_selection_change(&self, payload: Value) {
        let listeners: Vec<_> = self.listeners.lock().clone();
        for (_event, tx) in listeners {
            let _ = tx.send(payload.clone()).await;
        }
    }

    /// Make the next `n` selection getter calls throw.
    pub fn fail_next_selection_calls(&self, n: u32) {
        self.selection_failures_left.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` resize calls throw.
    pub fn fail_next_resizes(&self, n: u32) {
        self.resize_failures_left.store(n, Ordering::SeqCst);
    }

    /// Resize calls the host accepted, in order.
    pub fn resize_log(&self) -> Vec<(u32, u32)> {
        self.resize_log.lock().clone()
    }

    /// Listener attachments observed, in order.
    pub fn attach_log(&self) -> Vec<(AttachStyle, String)> {
        self.attach_log.lock().clone()
    }

    pub fn ready_calls(&self) -> u32 {
        self.ready_calls.load(Ordering::SeqCst)
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl HostRuntime for ScriptedHost {
    fn capabilities(&self) -> HostCapabilities {
        self.caps
    }

    async fn ready(&self) -> Result<(), HostApiError> {
        if !self.caps.ready {
            return Err(HostApiError::MissingCapability("ready"));
        }
        self.ready_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn attach_listener(
        &self,
        style: AttachStyle,
        event: &str,
        events: mpsc::Sender<Value>,
    ) -> Result<(), HostApiError> {
        let supported = match style {
            AttachStyle::Subscribe => self.caps.subscribe,
            AttachStyle::On => self.caps.on,
        };
        if !supported {
            return Err(HostApiError::MissingCapability("attach"));
        }
        self.attach_log.lock().push((style, event.to_string()));
        self.listeners.lock().push((event.to_string(), events));
        Ok(())
    }

    async fn selected_element(&self) -> Result<Value, HostApiError> {
        if !self.caps.selected_element {
            return Err(HostApiError::MissingCapability("selected_element"));
        }
        if Self::take_failure(&self.selection_failures_left) {
            return Err(HostApiError::CallFailed("scripted failure".to_string()));
        }
        // The single-element variant hands out the first element when the
        // scripted payload is an array.
        let payload = self.selection.lock().clone();
        Ok(match payload {
            Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
            other => other,
        })
    }

    async fn selected_elements(&self) -> Result<Value, HostApiError> {
        if !self.caps.selected_elements {
            return Err(HostApiError::MissingCapability("selected_elements"));
        }
        if Self::take_failure(&self.selection_failures_left) {
            return Err(HostApiError::CallFailed("scripted failure".to_string()));
        }
        Ok(self.selection.lock().clone())
    }

    async fn resize_panel(&self, width: u32, height: u32) -> Result<(), HostApiError> {
        if !self.caps.resize {
            return Err(HostApiError::MissingCapability("resize"));
        }
        if Self::take_failure(&self.resize_failures_left) {
            return Err(HostApiError::CallFailed("scripted failure".to_string()));
        }
        self.resize_log.lock().push((width, height));
        Ok(())
    }
}

/// Global scope whose properties the test script controls, including hosts
/// that appear mid-discovery.
#[derive(Default)]
pub struct ScriptedScope {
    globals: Mutex<HashMap<String, Arc<dyn HostRuntime>>>,
}

impl ScriptedScope {
    /// A scope with no host runtime at all.
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A scope with `host` pre-installed under `property`.
    pub fn with_host(property: &str, host: Arc<dyn HostRuntime>) -> Arc<Self> {
        let scope = Self::default();
        scope.globals.lock().insert(property.to_string(), host);
        Arc::new(scope)
    }

    /// Install a host runtime while discovery is already probing.
    pub fn install(&self, property: &str, host: Arc<dyn HostRuntime>) {
        self.globals.lock().insert(property.to_string(), host);
    }
}

impl GlobalScope for ScriptedScope {
    fn lookup(&self, property: &str) -> Option<Arc<dyn HostRuntime>> {
        self.globals.lock().get(property).cloned()
    }
}
