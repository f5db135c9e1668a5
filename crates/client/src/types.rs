//! Response payloads that are not domain records.

use serde::{Deserialize, Serialize};
use visual_erp_core::{OrderId, User};

/// Body of `POST /api/auth/login`.
///
/// Both fields are optional on the wire; the session manager rejects a reply
/// that lacks either.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoginReply {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HealthReport {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// Body of `POST /api/quotes/:id/convert`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionReceipt {
    #[serde(default, alias = "order_id")]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Result of draining the offline queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FlushReport {
    /// Requests that reached the backend and succeeded.
    pub replayed: usize,
    /// Requests whose replay failed (their handles carry the error).
    pub failed: usize,
}

impl FlushReport {
    pub fn total(&self) -> usize {
        self.replayed + self.failed
    }
}
