//! Cooperative shutdown flag shared by every suspension point in the
//! backend (dequeue, rate-limit gate, retry backoff, HTTP GET).
//!
//! Replaces the Python `threading.Event`-backed `StoppableThread._stop`
//! (`original_source/totalimpact/backend.py`) with an atomic flag plus a
//! `tokio::sync::Notify` so waiters wake immediately instead of polling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Clone, Debug)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        Self { flag: Arc::new(AtomicBool::new(false)), notify: Arc::new(Notify::new()) }
    }

    /// Set the flag and wake every waiter. Idempotent.
    pub fn signal(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_signalled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Resolves once `signal()` has been (or is ever) called. Safe to await
    /// repeatedly and from multiple tasks.
    pub async fn notified(&self) {
        if self.is_signalled() {
            return;
        }
        let notified = self.notify.notified();
        tokio::pin!(notified);
        if self.is_signalled() {
            return;
        }
        notified.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn signal_is_idempotent_and_visible() {
        let s = Shutdown::new();
        assert!(!s.is_signalled());
        s.signal();
        s.signal();
        assert!(s.is_signalled());
    }

    #[tokio::test]
    async fn notified_resolves_after_signal_from_other_task() {
        let s = Shutdown::new();
        let s2 = s.clone();
        let handle = tokio::spawn(async move {
            s2.notified().await;
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        s.signal();
        tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn notified_returns_immediately_if_already_signalled() {
        let s = Shutdown::new();
        s.signal();
        tokio::time::timeout(Duration::from_millis(50), s.notified()).await.unwrap();
    }
}
