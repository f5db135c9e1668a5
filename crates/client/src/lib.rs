//! `visual-erp-client`
//!
//! **Responsibility:** talk to the Visual ERP backend on behalf of a UI.
//!
//! This crate provides:
//! - A resource client with retry, an offline write queue and envelope decoding
//! - Session management with durable token storage
//! - A connectivity monitor that replays queued writes on reconnect
//! - Sample data for development backends that are down
//!
//! The backend stays the authority; client-side validation is best-effort.

pub mod config;
pub mod connectivity;
pub mod envelope;
pub mod error;
pub mod fallback;
pub mod offline;
pub mod queue;
pub mod resource;
pub mod retry;
pub mod session;
pub mod share;
pub mod state;
pub mod storage;
pub mod transport;
pub mod types;

pub use config::{ClientConfig, CompanyProfile};
pub use connectivity::{ConnectivityMonitor, ConnectivitySnapshot};
pub use envelope::Resource;
pub use error::{ClientError, ClientResult, ConfigError};
pub use offline::{ConnectivityState, OfflineMode};
pub use queue::{PendingRequest, QueuedRequestInfo, Submission};
pub use resource::{Listing, ResourceClient};
pub use retry::RetryPolicy;
pub use session::{SessionManager, SessionState};
pub use share::ShareSheet;
pub use state::AppState;
pub use storage::{FileSessionStore, MemorySessionStore, SessionStore};
pub use transport::{HttpTransport, Method, OutgoingRequest, RawResponse, RequestDescriptor, Transport, TransportError};
pub use types::{ConversionReceipt, FlushReport, HealthReport, LoginReply};
