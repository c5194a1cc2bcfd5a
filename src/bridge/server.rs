//! Bridge server implementation
//!
//! Serves the board API plus a WebSocket notification stream on the loopback
//! interface. The sync poller is started only once the listener is accepting
//! connections, so the front end can already re-read the store when the
//! first "new messages" notification lands.

use crate::config::BoardConfig;
use crate::device;
use crate::error::{Error, Result};
use crate::history::{GitCli, HistoryBackend};
use crate::store::{board_router, ArtifactStore, BoardState};
use crate::sync::{SyncEvent, SyncPoller};
use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Bridge server state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Not started
    Stopped,
    /// Starting up
    Starting,
    /// Running
    Running,
    /// Shutting down
    ShuttingDown,
}

/// Hearthboard bridge server
pub struct Bridge {
    config: BoardConfig,
    state: Arc<RwLock<BridgeState>>,
    store: Arc<ArtifactStore>,
    poller: Arc<SyncPoller>,
    server: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

impl Bridge {
    /// Create a new bridge with the given configuration, bootstrapping the
    /// artifact store if needed.
    pub async fn new(config: BoardConfig) -> Result<Self> {
        let device = config
            .store
            .device
            .clone()
            .unwrap_or_else(device::device_identity);

        let history: Arc<dyn HistoryBackend> = Arc::new(
            GitCli::new(&config.store.dir)
                .remote(&config.sync.remote)
                .branches(config.sync.branches.clone()),
        );

        let store = Arc::new(
            ArtifactStore::open(config.store.dir.clone(), device, history.clone()).await?,
        );

        let poller = Arc::new(SyncPoller::new(
            history,
            Duration::from_secs(config.sync.interval_secs),
        ));

        Ok(Self {
            config,
            state: Arc::new(RwLock::new(BridgeState::Stopped)),
            store,
            poller,
            server: Arc::new(RwLock::new(None)),
        })
    }

    /// Get current state
    pub async fn state(&self) -> BridgeState {
        *self.state.read().await
    }

    /// Get the artifact store
    pub fn store(&self) -> &Arc<ArtifactStore> {
        &self.store
    }

    /// Get the sync poller
    pub fn poller(&self) -> &Arc<SyncPoller> {
        &self.poller
    }

    /// Get configuration
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Start the bridge, returning the bound address.
    pub async fn start(&self) -> Result<SocketAddr> {
        let mut state = self.state.write().await;
        if *state != BridgeState::Stopped {
            return Err(Error::Bridge("Bridge already running".to_string()));
        }
        *state = BridgeState::Starting;
        drop(state);

        let addr = format!("{}:{}", self.config.bridge.host, self.config.bridge.port);
        // A failed startup must leave the bridge restartable.
        let listener = match tokio::net::TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(e) => {
                *self.state.write().await = BridgeState::Stopped;
                return Err(Error::Bridge(format!("failed to bind {}: {}", addr, e)));
            }
        };
        let local_addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(e) => {
                *self.state.write().await = BridgeState::Stopped;
                return Err(Error::Bridge(format!(
                    "failed to read local address: {}",
                    e
                )));
            }
        };

        let router = build_router(self.store.clone(), self.poller.clone());
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Bridge server error: {}", e);
            }
        });
        *self.server.write().await = Some(handle);

        // The poller starts only after the bridge is accepting connections.
        if self.config.sync.enabled {
            self.poller.start();
        }

        *self.state.write().await = BridgeState::Running;
        tracing::info!(addr = %local_addr, "Hearthboard bridge started");
        Ok(local_addr)
    }

    /// Stop the bridge
    pub async fn stop(&self) {
        let mut state = self.state.write().await;
        if *state != BridgeState::Running {
            return;
        }
        *state = BridgeState::ShuttingDown;
        drop(state);

        self.poller.stop();
        if let Some(handle) = self.server.write().await.take() {
            handle.abort();
        }

        *self.state.write().await = BridgeState::Stopped;
        tracing::info!("Hearthboard bridge stopped");
    }
}

/// Shared state for the notification WebSocket
#[derive(Clone)]
struct NotifyState {
    poller: Arc<SyncPoller>,
}

fn build_router(store: Arc<ArtifactStore>, poller: Arc<SyncPoller>) -> Router {
    board_router(BoardState { store })
        .merge(
            Router::new()
                .route("/ws", get(ws_notifications))
                .with_state(NotifyState { poller }),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// GET /ws — push sync notifications to the front end
async fn ws_notifications(
    State(state): State<NotifyState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let events = state.poller.subscribe();
    ws.on_upgrade(move |socket| forward_events(socket, events))
}

async fn forward_events(socket: WebSocket, mut events: broadcast::Receiver<SyncEvent>) {
    let (mut sender, mut receiver) = socket.split();
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let payload = match serde_json::to_string(&event) {
                        Ok(payload) => payload,
                        Err(e) => {
                            tracing::warn!("Failed to serialize sync event: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(payload)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped = skipped, "Notification stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            // The front end never sends application messages; drain the
            // socket so close frames end the task.
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

/// Builder for Bridge
pub struct BridgeBuilder {
    config: BoardConfig,
}

impl BridgeBuilder {
    /// Create a new builder with default config
    pub fn new() -> Self {
        Self {
            config: BoardConfig::default(),
        }
    }

    /// Set the configuration
    pub fn config(mut self, config: BoardConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the bridge host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.bridge.host = host.into();
        self
    }

    /// Set the bridge port
    pub fn port(mut self, port: u16) -> Self {
        self.config.bridge.port = port;
        self
    }

    /// Set the store directory
    pub fn store_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.config.store.dir = dir.into();
        self
    }

    /// Enable/disable the sync poller
    pub fn sync_enabled(mut self, enabled: bool) -> Self {
        self.config.sync.enabled = enabled;
        self
    }

    /// Build the bridge
    pub async fn build(self) -> Result<Bridge> {
        Bridge::new(self.config).await
    }
}

impl Default for BridgeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn make_bridge(dir: &TempDir) -> Bridge {
        BridgeBuilder::new()
            .host("127.0.0.1")
            .port(0)
            .store_dir(dir.path().join("notes"))
            .sync_enabled(false)
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_bridge_creation() {
        let dir = TempDir::new().unwrap();
        let bridge = make_bridge(&dir).await;

        assert_eq!(bridge.state().await, BridgeState::Stopped);
        assert!(!bridge.store().device().is_empty());
        assert!(bridge.config().store.dir.ends_with("notes"));
    }

    #[tokio::test]
    async fn test_bridge_lifecycle() {
        let dir = TempDir::new().unwrap();
        let bridge = make_bridge(&dir).await;

        let addr = bridge.start().await.unwrap();
        assert_ne!(addr.port(), 0);
        assert_eq!(bridge.state().await, BridgeState::Running);

        // Double start is rejected
        assert!(bridge.start().await.is_err());

        bridge.stop().await;
        assert_eq!(bridge.state().await, BridgeState::Stopped);
    }

    #[tokio::test]
    async fn test_failed_bind_leaves_bridge_restartable() {
        let dir = TempDir::new().unwrap();
        // Occupy a port so the bridge cannot bind it.
        let blocker = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = blocker.local_addr().unwrap().port();

        let bridge = BridgeBuilder::new()
            .host("127.0.0.1")
            .port(port)
            .store_dir(dir.path().join("notes"))
            .sync_enabled(false)
            .build()
            .await
            .unwrap();

        assert!(bridge.start().await.is_err());
        assert_eq!(bridge.state().await, BridgeState::Stopped);

        // Once the port frees up the same bridge starts cleanly.
        drop(blocker);
        bridge.start().await.unwrap();
        assert_eq!(bridge.state().await, BridgeState::Running);
        bridge.stop().await;
    }

    #[tokio::test]
    async fn test_bridge_bootstraps_store_directory() {
        let dir = TempDir::new().unwrap();
        let store_dir = dir.path().join("notes");
        assert!(!store_dir.exists());

        let _bridge = BridgeBuilder::new()
            .store_dir(store_dir.clone())
            .sync_enabled(false)
            .build()
            .await
            .unwrap();

        assert!(store_dir.exists());
    }
}
