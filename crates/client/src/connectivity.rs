//! Connectivity monitor.
//!
//! Drives the client's online/offline flag from host network notifications
//! and a periodic health probe. Coming back online drains the offline queue.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::offline::ConnectivityState;
use crate::resource::ResourceClient;
use crate::types::FlushReport;

/// Display-only view of connectivity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivitySnapshot {
    pub state: ConnectivityState,
    pub last_checked: Option<DateTime<Utc>>,
    pub pending: usize,
}

/// Background probe plus network change handling.
pub struct ConnectivityMonitor {
    client: Arc<ResourceClient>,
    interval: Duration,
    last_checked: Mutex<Option<DateTime<Utc>>>,
    shutdown: Arc<Notify>,
}

impl ConnectivityMonitor {
    /// Probe period comes from the client configuration.
    pub fn new(client: Arc<ResourceClient>) -> Self {
        let interval = client.config().probe_interval;
        Self::with_interval(client, interval)
    }

    pub fn with_interval(client: Arc<ResourceClient>, interval: Duration) -> Self {
        Self {
            client,
            interval,
            last_checked: Mutex::new(None),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Host-level network notification.
    ///
    /// Returns the flush report when this brought the client back online.
    pub async fn network_changed(&self, online: bool) -> Option<FlushReport> {
        tracing::info!("network reported {}", if online { "up" } else { "down" });
        self.apply(ConnectivityState::from_online(online)).await
    }

    /// Probe `GET /api/health` once and update the flag.
    ///
    /// Only network failures and 5xx/timeouts count as offline; any HTTP
    /// answer (including 401) means the backend is reachable.
    pub async fn probe_now(&self) -> ConnectivityState {
        let state = match self.client.health().await {
            Ok(_) => ConnectivityState::Online,
            Err(err) if err.is_retryable() => {
                tracing::debug!("health probe failed: {err}");
                ConnectivityState::Offline
            }
            Err(err) => {
                tracing::debug!("health probe answered with an error: {err}");
                ConnectivityState::Online
            }
        };
        *self.last_checked.lock().unwrap_or_else(|e| e.into_inner()) = Some(Utc::now());
        self.apply(state).await;
        state
    }

    async fn apply(&self, state: ConnectivityState) -> Option<FlushReport> {
        let previous = self.client.set_connectivity(state);
        let reconnected = previous == ConnectivityState::Offline;
        if state == ConnectivityState::Online && (reconnected || self.client.pending_count() > 0) {
            Some(self.client.flush_queue().await)
        } else {
            None
        }
    }

    pub fn snapshot(&self) -> ConnectivitySnapshot {
        ConnectivitySnapshot {
            state: self.client.connectivity(),
            last_checked: *self.last_checked.lock().unwrap_or_else(|e| e.into_inner()),
            pending: self.client.pending_count(),
        }
    }

    /// Spawn the periodic probe. The first probe runs immediately.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            tracing::info!("connectivity monitor started (every {:?})", monitor.interval);

            let mut ticker = tokio::time::interval(monitor.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown.notified() => {
                        tracing::info!("connectivity monitor received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        monitor.probe_now().await;
                    }
                }
            }

            tracing::info!("connectivity monitor stopped");
        })
    }

    /// Request graceful shutdown of the probe loop.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}

impl core::fmt::Debug for ConnectivityMonitor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConnectivityMonitor")
            .field("interval", &self.interval)
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}
