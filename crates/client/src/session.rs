//! Session manager: login, logout and restoring a stored session.
//!
//! ```text
//! Anonymous ──login──▶ Authenticated
//!     ▲                    │
//!     └──────logout────────┘
//! Checking ──probe ok──▶ Authenticated
//! Checking ──probe failed──▶ Anonymous (+ notice)
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use visual_erp_core::{Credentials, Session, User};

use crate::error::{ClientError, ClientResult};
use crate::resource::ResourceClient;
use crate::storage::{SessionStore, StoredKeys};

pub const SESSION_EXPIRED_NOTICE: &str = "Your session has expired. Please log in again.";
pub const LOGIN_REJECTED_MESSAGE: &str = "Login failed. Please check your credentials.";

/// Authentication state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Anonymous,
    /// A stored session exists and has not been validated yet.
    Checking,
    Authenticated,
}

#[derive(Debug)]
struct Inner {
    state: SessionState,
    session: Option<Session>,
    /// Stored session awaiting validation (only while `Checking`).
    stored: Option<Session>,
    notice: Option<String>,
    /// Bumped by login and logout so an in-flight status check can tell
    /// that its result is stale.
    generation: u64,
}

/// Owns the token/user pair and is the only writer of session storage.
pub struct SessionManager {
    client: Arc<ResourceClient>,
    store: Arc<dyn SessionStore>,
    inner: Mutex<Inner>,
}

impl SessionManager {
    /// Read session storage and decide the initial state.
    ///
    /// A half-present or unreadable pair is cleared and treated as absent.
    pub fn open(client: Arc<ResourceClient>, store: Arc<dyn SessionStore>) -> Self {
        let stored = match store.load() {
            Ok(keys) => restore(keys),
            Err(err) => {
                tracing::warn!("failed to read stored session: {err}");
                Err(())
            }
        };

        let stored = match stored {
            Ok(stored) => stored,
            Err(()) => {
                if let Err(err) = store.clear() {
                    tracing::warn!("failed to clear stored session: {err}");
                }
                None
            }
        };

        let state = if stored.is_some() {
            SessionState::Checking
        } else {
            SessionState::Anonymous
        };
        tracing::debug!("session opened in state {:?}", state);

        Self {
            client,
            store,
            inner: Mutex::new(Inner {
                state,
                session: None,
                stored,
                notice: None,
                generation: 0,
            }),
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Validate a stored session against the backend.
    ///
    /// Any probe failure ends the session and leaves an expiry notice. A
    /// login or logout that lands while the probe is in flight wins; the
    /// probe result is then discarded.
    pub async fn check_status(&self) -> SessionState {
        let (stored, generation) = {
            let mut inner = self.inner();
            if inner.state != SessionState::Checking {
                return inner.state;
            }
            (inner.stored.take(), inner.generation)
        };
        let Some(stored) = stored else {
            let mut inner = self.inner();
            if inner.generation == generation {
                inner.state = SessionState::Anonymous;
            }
            return inner.state;
        };

        let probe = self.client.probe_with_token(stored.token()).await;

        let mut inner = self.inner();
        if inner.generation != generation {
            tracing::debug!("discarding stale session check for {}", stored.user().username);
            return inner.state;
        }
        match probe {
            Ok(_) => {
                self.client.install_token(Some(stored.token().to_string()));
                tracing::info!("restored session for {}", stored.user().username);
                inner.state = SessionState::Authenticated;
                inner.session = Some(stored);
            }
            Err(err) => {
                tracing::warn!("stored session rejected: {err}");
                self.clear_store();
                self.client.install_token(None);
                inner.state = SessionState::Anonymous;
                inner.session = None;
                inner.notice = Some(SESSION_EXPIRED_NOTICE.to_string());
            }
        }
        inner.state
    }

    /// Authenticate and persist the session.
    ///
    /// The state is left untouched when login fails.
    pub async fn login(&self, credentials: &Credentials) -> ClientResult<Session> {
        let reply = self.client.authenticate(credentials).await?;

        let token = reply.token.filter(|t| !t.trim().is_empty());
        let (Some(token), Some(user)) = (token, reply.user) else {
            tracing::warn!("login reply for {} lacked token or user", credentials.username);
            return Err(ClientError::LoginRejected(LOGIN_REJECTED_MESSAGE.to_string()));
        };
        let session = Session::new(token, user)?;

        let mut inner = self.inner();
        match serde_json::to_string(session.user()) {
            Ok(user_json) => {
                if let Err(err) = self.store.save(session.token(), &user_json) {
                    tracing::warn!("session will not survive restart: {err}");
                }
            }
            Err(err) => tracing::warn!("failed to serialize user record: {err}"),
        }
        self.client.install_token(Some(session.token().to_string()));
        tracing::info!("logged in as {}", session.user().username);

        inner.state = SessionState::Authenticated;
        inner.session = Some(session.clone());
        inner.stored = None;
        inner.notice = None;
        inner.generation += 1;
        Ok(session)
    }

    /// End the session. Storage failures are logged, never returned.
    pub fn logout(&self) {
        let mut inner = self.inner();
        self.clear_store();
        self.client.install_token(None);

        if let Some(session) = inner.session.take() {
            tracing::info!("logged out {}", session.user().username);
        }
        inner.state = SessionState::Anonymous;
        inner.stored = None;
        inner.generation += 1;
    }

    pub fn state(&self) -> SessionState {
        self.inner().state
    }

    pub fn session(&self) -> Option<Session> {
        self.inner().session.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.inner().session.as_ref().map(|s| s.user().clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner().state == SessionState::Authenticated
    }

    /// One-shot notice for the login screen (e.g. session expiry).
    pub fn take_notice(&self) -> Option<String> {
        self.inner().notice.take()
    }

    fn clear_store(&self) {
        if let Err(err) = self.store.clear() {
            tracing::warn!("failed to clear stored session: {err}");
        }
    }
}

impl core::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// `Ok(None)` when nothing is stored, `Err` when the pair must be discarded.
fn restore(keys: StoredKeys) -> Result<Option<Session>, ()> {
    match (keys.token, keys.user) {
        (None, None) => Ok(None),
        (Some(token), Some(user_json)) => {
            let user: User = serde_json::from_str(&user_json).map_err(|err| {
                tracing::warn!("discarding unreadable stored user: {err}");
            })?;
            Session::new(token, user).map(Some).map_err(|err| {
                tracing::warn!("discarding stored session: {err}");
            })
        }
        _ => {
            tracing::warn!("discarding half-present stored session");
            Err(())
        }
    }
}
