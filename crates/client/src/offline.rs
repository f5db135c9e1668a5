//! Online/offline flag shared by the resource client and the monitor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Connectivity state of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityState {
    /// Online and connected to the API.
    Online,
    /// Offline (network unreachable or API unavailable).
    Offline,
}

impl ConnectivityState {
    pub fn from_online(online: bool) -> Self {
        if online {
            ConnectivityState::Online
        } else {
            ConnectivityState::Offline
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectivityState::Online => "online",
            ConnectivityState::Offline => "offline",
        }
    }
}

/// Offline mode state.
///
/// The client starts online; only the connectivity monitor moves it.
#[derive(Debug, Clone)]
pub struct OfflineMode {
    state: ConnectivityState,
    changed_at: DateTime<Utc>,
}

impl OfflineMode {
    pub fn new() -> Self {
        Self {
            state: ConnectivityState::Online,
            changed_at: Utc::now(),
        }
    }

    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    /// When the state last flipped.
    pub fn changed_at(&self) -> DateTime<Utc> {
        self.changed_at
    }

    /// Set the state, returning the previous one.
    pub fn set(&mut self, state: ConnectivityState) -> ConnectivityState {
        let previous = self.state;
        if previous != state {
            self.state = state;
            self.changed_at = Utc::now();
        }
        previous
    }

    pub fn is_offline(&self) -> bool {
        self.state == ConnectivityState::Offline
    }
}

impl Default for OfflineMode {
    fn default() -> Self {
        Self::new()
    }
}
