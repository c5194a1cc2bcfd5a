//! Background sync poller
//!
//! Periodically fetches the remote, compares its tip against the last known
//! local commit (the history pointer), rebase-pulls new history in and
//! broadcasts a notification for the front end. All remote operations are
//! best-effort: the remote may legitimately not exist yet, so failures are
//! logged and swallowed, never surfaced to the user.

use crate::history::HistoryBackend;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, RwLock};

/// Notification emitted when a pull brought in new artifacts.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SyncEvent {
    /// New commits were pulled; the store should be re-read.
    #[serde(rename = "newMessages")]
    NewMessages { tip: String },
}

/// Timer-driven poller reconciling the working copy with the remote.
pub struct SyncPoller {
    history: Arc<dyn HistoryBackend>,
    /// Most recently known local commit. Only this poller writes it, and it
    /// only ever moves forward.
    pointer: Arc<RwLock<Option<String>>>,
    events: broadcast::Sender<SyncEvent>,
    interval: Duration,
    shutdown_tx: watch::Sender<bool>,
}

impl SyncPoller {
    pub fn new(history: Arc<dyn HistoryBackend>, interval: Duration) -> Self {
        let (events, _) = broadcast::channel(16);
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            history,
            pointer: Arc::new(RwLock::new(None)),
            events,
            interval,
            shutdown_tx,
        }
    }

    /// Subscribe to sync notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Current history pointer.
    pub async fn pointer(&self) -> Option<String> {
        self.pointer.read().await.clone()
    }

    /// Seed the history pointer from the local tip. An absent repository
    /// leaves the pointer unset.
    pub async fn init(&self) {
        match self.history.local_tip().await {
            Ok(tip) => {
                if let Some(ref tip) = tip {
                    tracing::debug!(tip = %tip, "Seeded history pointer");
                }
                *self.pointer.write().await = tip;
            }
            Err(e) => {
                tracing::debug!("No local history yet: {}", e);
            }
        }
    }

    /// One poll cycle: fetch, compare, pull, notify.
    pub async fn tick(&self) {
        if let Err(e) = self.history.fetch().await {
            // Expected while no remote is configured.
            tracing::debug!("Fetch failed: {}", e);
        }

        let remote = match self.history.remote_tip().await {
            Ok(tip) => tip,
            Err(e) => {
                tracing::debug!("Could not resolve remote tip: {}", e);
                None
            }
        };
        let Some(remote) = remote else {
            return;
        };
        if self.pointer.read().await.as_deref() == Some(remote.as_str()) {
            return;
        }

        tracing::info!(tip = %remote, "New commits detected, pulling");
        if let Err(e) = self.history.pull_rebase().await {
            // The pointer stays put, so the next cycle still sees the
            // difference and retries the pull.
            tracing::warn!("Pull failed: {}", e);
            return;
        }

        match self.history.local_tip().await {
            Ok(Some(tip)) => {
                *self.pointer.write().await = Some(tip.clone());
                tracing::info!(tip = %tip, "Pulled new artifacts");
                let _ = self.events.send(SyncEvent::NewMessages { tip });
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Failed to read local tip after pull: {}", e);
            }
        }
    }

    /// Start the poll loop. The first cycle runs one full interval after
    /// startup; `stop()` ends the loop.
    pub fn start(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let poller = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            poller.init().await;
            let mut interval = tokio::time::interval(poller.interval);
            // interval fires immediately; swallow that tick so the first
            // poll happens after one full period.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => poller.tick().await,
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            tracing::info!("Sync poller stopped");
                            break;
                        }
                    }
                }
            }
        })
    }

    /// Signal the poll loop to stop.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Scripted backend: `remote` is what the remote advertises, `local`
    /// follows it on a successful pull.
    #[derive(Default)]
    struct FakeHistory {
        local: std::sync::Mutex<Option<String>>,
        remote: std::sync::Mutex<Option<String>>,
        fetch_fails: AtomicBool,
        pull_fails: AtomicBool,
        pulls: AtomicUsize,
    }

    impl FakeHistory {
        fn set_local(&self, tip: &str) {
            *self.local.lock().unwrap() = Some(tip.to_string());
        }

        fn set_remote(&self, tip: &str) {
            *self.remote.lock().unwrap() = Some(tip.to_string());
        }
    }

    #[async_trait]
    impl HistoryBackend for FakeHistory {
        async fn init(&self) -> Result<()> {
            Ok(())
        }

        async fn commit_file(&self, _filename: &str, _message: &str) -> Result<()> {
            Ok(())
        }

        async fn fetch(&self) -> Result<()> {
            if self.fetch_fails.load(Ordering::SeqCst) {
                return Err(Error::History("no remote configured".to_string()));
            }
            Ok(())
        }

        async fn local_tip(&self) -> Result<Option<String>> {
            Ok(self.local.lock().unwrap().clone())
        }

        async fn remote_tip(&self) -> Result<Option<String>> {
            Ok(self.remote.lock().unwrap().clone())
        }

        async fn pull_rebase(&self) -> Result<()> {
            if self.pull_fails.load(Ordering::SeqCst) {
                return Err(Error::History("rebase conflict".to_string()));
            }
            self.pulls.fetch_add(1, Ordering::SeqCst);
            let remote = self.remote.lock().unwrap().clone();
            *self.local.lock().unwrap() = remote;
            Ok(())
        }
    }

    fn make_poller(history: Arc<FakeHistory>) -> SyncPoller {
        SyncPoller::new(history, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_init_seeds_pointer_from_local_tip() {
        let history = Arc::new(FakeHistory::default());
        history.set_local("abc123");
        let poller = make_poller(history);

        poller.init().await;
        assert_eq!(poller.pointer().await.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_init_without_repository_leaves_pointer_unset() {
        let poller = make_poller(Arc::new(FakeHistory::default()));
        poller.init().await;
        assert!(poller.pointer().await.is_none());
    }

    #[tokio::test]
    async fn test_matching_tips_do_not_pull_or_notify() {
        let history = Arc::new(FakeHistory::default());
        history.set_local("abc123");
        history.set_remote("abc123");
        let poller = make_poller(history.clone());
        let mut events = poller.subscribe();

        poller.init().await;
        poller.tick().await;

        assert_eq!(history.pulls.load(Ordering::SeqCst), 0);
        assert!(events.try_recv().is_err());
        assert_eq!(poller.pointer().await.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_new_remote_tip_pulls_and_notifies_once() {
        let history = Arc::new(FakeHistory::default());
        history.set_local("abc123");
        history.set_remote("abc123");
        let poller = make_poller(history.clone());
        let mut events = poller.subscribe();
        poller.init().await;

        history.set_remote("def456");
        poller.tick().await;

        assert_eq!(history.pulls.load(Ordering::SeqCst), 1);
        assert_eq!(poller.pointer().await.as_deref(), Some("def456"));
        let SyncEvent::NewMessages { tip } = events.try_recv().unwrap();
        assert_eq!(tip, "def456");
        // Exactly one notification
        assert!(events.try_recv().is_err());

        // Next cycle sees no change
        poller.tick().await;
        assert_eq!(history.pulls.load(Ordering::SeqCst), 1);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unreachable_remote_changes_nothing() {
        let history = Arc::new(FakeHistory::default());
        history.set_local("abc123");
        history.fetch_fails.store(true, Ordering::SeqCst);
        let poller = make_poller(history.clone());
        let mut events = poller.subscribe();
        poller.init().await;

        for _ in 0..5 {
            poller.tick().await;
        }

        assert_eq!(history.pulls.load(Ordering::SeqCst), 0);
        assert!(events.try_recv().is_err());
        assert_eq!(poller.pointer().await.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_pointer_never_reverts_across_idle_cycles() {
        let history = Arc::new(FakeHistory::default());
        history.set_local("abc123");
        history.set_remote("def456");
        let poller = make_poller(history.clone());
        poller.init().await;

        poller.tick().await;
        assert_eq!(poller.pointer().await.as_deref(), Some("def456"));

        // Remote disappears; many cycles observe no change
        *history.remote.lock().unwrap() = None;
        for _ in 0..5 {
            poller.tick().await;
        }
        assert_eq!(poller.pointer().await.as_deref(), Some("def456"));
    }

    #[tokio::test]
    async fn test_failed_pull_keeps_stale_pointer_and_retries() {
        let history = Arc::new(FakeHistory::default());
        history.set_local("abc123");
        history.set_remote("def456");
        history.pull_fails.store(true, Ordering::SeqCst);
        let poller = make_poller(history.clone());
        let mut events = poller.subscribe();
        poller.init().await;

        poller.tick().await;
        assert_eq!(poller.pointer().await.as_deref(), Some("abc123"));
        assert!(events.try_recv().is_err());

        // Pull recovers; the stale pointer still differs, so the next
        // cycle retries and succeeds.
        history.pull_fails.store(false, Ordering::SeqCst);
        poller.tick().await;
        assert_eq!(poller.pointer().await.as_deref(), Some("def456"));
        assert!(events.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_fresh_clone_pulls_from_unset_pointer() {
        let history = Arc::new(FakeHistory::default());
        history.set_remote("def456");
        let poller = make_poller(history.clone());
        poller.init().await;
        assert!(poller.pointer().await.is_none());

        poller.tick().await;
        assert_eq!(poller.pointer().await.as_deref(), Some("def456"));
    }

    #[tokio::test]
    async fn test_stop_ends_run_loop() {
        let history = Arc::new(FakeHistory::default());
        let poller = Arc::new(SyncPoller::new(history, Duration::from_millis(10)));

        let handle = poller.start();
        tokio::time::sleep(Duration::from_millis(30)).await;
        poller.stop();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("poller did not stop")
            .unwrap();
    }
}
