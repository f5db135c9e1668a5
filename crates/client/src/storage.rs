//! Durable session storage.
//!
//! Two keys, written and cleared together: `erp_token` (bearer token) and
//! `erp_user` (JSON-serialized user record).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

pub const TOKEN_KEY: &str = "erp_token";
pub const USER_KEY: &str = "erp_user";

const APP_DIR: &str = "visual-erp";
const SESSION_FILE: &str = "session.json";

/// Raw contents of session storage. Either key may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredKeys {
    #[serde(rename = "erp_token", default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(rename = "erp_user", default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl StoredKeys {
    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.user.is_none()
    }
}

/// Key-value storage for the session pair.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> ClientResult<StoredKeys>;

    /// Write both keys in one step.
    fn save(&self, token: &str, user_json: &str) -> ClientResult<()>;

    /// Remove both keys in one step.
    fn clear(&self) -> ClientResult<()>;
}

/// JSON document on disk, replaced through a temp file + rename.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `VISUAL_ERP_SESSION_FILE` if set, else the per-user data directory.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        match &config.session_file {
            Some(path) => Ok(Self::new(path.clone())),
            None => default_session_path()
                .map(Self::new)
                .ok_or_else(|| ClientError::Storage("no data directory available".to_string())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomically(&self, contents: &str) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| storage_error("create session directory", &self.path, e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents).map_err(|e| storage_error("write session file", &tmp, e))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| storage_error("replace session file", &self.path, e))
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> ClientResult<StoredKeys> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StoredKeys::default()),
            Err(e) => return Err(storage_error("read session file", &self.path, e)),
        };
        if raw.trim().is_empty() {
            return Ok(StoredKeys::default());
        }
        serde_json::from_str(&raw)
            .map_err(|e| ClientError::Storage(format!("corrupt session file {:?}: {e}", self.path)))
    }

    fn save(&self, token: &str, user_json: &str) -> ClientResult<()> {
        let keys = StoredKeys {
            token: Some(token.to_string()),
            user: Some(user_json.to_string()),
        };
        let contents =
            serde_json::to_string_pretty(&keys).map_err(|e| ClientError::Storage(e.to_string()))?;
        self.write_atomically(&contents)
    }

    fn clear(&self) -> ClientResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error("remove session file", &self.path, e)),
        }
    }
}

/// `<data_dir>/visual-erp/session.json`.
pub fn default_session_path() -> Option<PathBuf> {
    dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
        .map(|dir| dir.join(APP_DIR).join(SESSION_FILE))
}

fn storage_error(action: &str, path: &Path, err: std::io::Error) -> ClientError {
    ClientError::Storage(format!("failed to {action} at {path:?}: {err}"))
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    keys: Mutex<StoredKeys>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded store (possibly with only one key present).
    pub fn with_keys(token: Option<&str>, user_json: Option<&str>) -> Self {
        Self {
            keys: Mutex::new(StoredKeys {
                token: token.map(str::to_string),
                user: user_json.map(str::to_string),
            }),
        }
    }

    pub fn snapshot(&self) -> StoredKeys {
        self.keys.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> ClientResult<StoredKeys> {
        Ok(self.snapshot())
    }

    fn save(&self, token: &str, user_json: &str) -> ClientResult<()> {
        let mut keys = self.keys.lock().unwrap_or_else(|e| e.into_inner());
        keys.token = Some(token.to_string());
        keys.user = Some(user_json.to_string());
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        *self.keys.lock().unwrap_or_else(|e| e.into_inner()) = StoredKeys::default();
        Ok(())
    }
}
