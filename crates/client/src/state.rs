//! Application state shared by the UI layer.

use std::sync::Arc;

use visual_erp_core::{Customer, Product, Quote};

use crate::config::ClientConfig;
use crate::connectivity::ConnectivityMonitor;
use crate::error::ClientResult;
use crate::resource::ResourceClient;
use crate::session::SessionManager;
use crate::share::ShareSheet;
use crate::storage::{FileSessionStore, SessionStore};
use crate::transport::Transport;

/// Explicitly wired client components, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<ResourceClient>,
    pub session: Arc<SessionManager>,
    pub monitor: Arc<ConnectivityMonitor>,
}

impl AppState {
    /// HTTP transport and file-backed session storage.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let store = FileSessionStore::from_config(&config)?;
        tracing::debug!("session storage at {:?}", store.path());
        Ok(Self::with_store(config, Arc::new(store)))
    }

    pub fn with_store(config: ClientConfig, store: Arc<dyn SessionStore>) -> Self {
        Self::from_client(Arc::new(ResourceClient::new(config)), store)
    }

    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self::from_client(Arc::new(ResourceClient::with_transport(config, transport)), store)
    }

    fn from_client(client: Arc<ResourceClient>, store: Arc<dyn SessionStore>) -> Self {
        let session = Arc::new(SessionManager::open(client.clone(), store));
        let monitor = Arc::new(ConnectivityMonitor::new(client.clone()));
        Self {
            client,
            session,
            monitor,
        }
    }

    pub fn share_product(&self, product: &Product) -> ShareSheet {
        ShareSheet::for_product(&self.client.config().company, product)
    }

    pub fn share_quote(&self, quote: &Quote, customers: &[Customer]) -> ShareSheet {
        let customer = visual_erp_core::find_by_id(customers, &quote.customer_id);
        ShareSheet::for_quote(&self.client.config().company, quote, customer)
    }
}
