//! Cooperative shutdown signal for long-running loops.

use tokio::sync::broadcast;

/// Broadcast-backed shutdown signal.
///
/// The bridge and panel run loops select on a subscription to this signal
/// alongside their inbound work; triggering it stops every loop cleanly.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    sender: broadcast::Sender<()>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self { sender }
    }

    /// Trigger shutdown. Safe to call more than once.
    pub fn trigger(&self) {
        let _ = self.sender.send(());
    }

    /// Subscribe to the signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_reaches_subscribers() {
        let signal = ShutdownSignal::new();
        let mut rx = signal.subscribe();
        signal.trigger();
        assert!(rx.recv().await.is_ok());
    }

    #[test]
    fn test_trigger_without_subscribers_is_harmless() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        signal.trigger();
    }
}
