//! Remote resource client.
//!
//! One `ResourceClient` owns the installed bearer token, the online/offline
//! flag and the offline queue. It is constructed once and shared through
//! `Arc` by the session manager, the connectivity monitor and the UI layer.

use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use visual_erp_core::{
    Credentials, Customer, CustomerDraft, CustomerId, Entity, Product, ProductDraft, ProductId,
    Quote, QuoteDraft, QuoteId, find_by_id,
};

use crate::config::ClientConfig;
use crate::envelope::{
    self, HEALTH_PATH, LOGIN_PATH, ListEnvelope, Resource, convert_quote_path, decode_item,
    decode_list,
};
use crate::error::{ClientError, ClientResult};
use crate::fallback;
use crate::offline::{ConnectivityState, OfflineMode};
use crate::queue::{OfflineQueue, PendingRequest, QueuedRequestInfo, Submission};
use crate::retry::{RetryPolicy, RetryStep};
use crate::transport::{HttpTransport, OutgoingRequest, RequestDescriptor, Transport};
use crate::types::{ConversionReceipt, FlushReport, HealthReport, LoginReply};

/// Outcome of a list call. List calls never fail outright.
#[derive(Debug, Clone, PartialEq)]
pub enum Listing<T> {
    /// Records served by the backend.
    Live(Vec<T>),
    /// Backend unavailable; canned records substituted.
    Mock { records: Vec<T>, cause: ClientError },
    /// Backend unavailable and no substitution allowed.
    Failed(ClientError),
}

impl<T> Listing<T> {
    /// Whether records are available (live or substituted).
    pub fn is_success(&self) -> bool {
        !matches!(self, Listing::Failed(_))
    }

    pub fn is_mock(&self) -> bool {
        matches!(self, Listing::Mock { .. })
    }

    pub fn records(&self) -> &[T] {
        match self {
            Listing::Live(records) | Listing::Mock { records, .. } => records,
            Listing::Failed(_) => &[],
        }
    }

    /// The failure behind a mock or failed listing.
    pub fn error(&self) -> Option<&ClientError> {
        match self {
            Listing::Live(_) => None,
            Listing::Mock { cause, .. } => Some(cause),
            Listing::Failed(err) => Some(err),
        }
    }

    pub fn into_result(self) -> ClientResult<Vec<T>> {
        match self {
            Listing::Live(records) | Listing::Mock { records, .. } => Ok(records),
            Listing::Failed(err) => Err(err),
        }
    }
}

/// HTTP client for the ERP backend.
pub struct ResourceClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    token: RwLock<Option<String>>,
    offline: Mutex<OfflineMode>,
    queue: OfflineQueue,
    flush_lock: tokio::sync::Mutex<()>,
}

impl ResourceClient {
    /// Create a client talking HTTP to `config.base_url`.
    pub fn new(config: ClientConfig) -> Self {
        let transport = Arc::new(HttpTransport::new(config.request_timeout));
        Self::with_transport(config, transport)
    }

    /// Create a client over an arbitrary transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            token: RwLock::new(None),
            offline: Mutex::new(OfflineMode::new()),
            queue: OfflineQueue::new(),
            flush_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ----- token -----

    /// Install (or clear) the session token used for every subsequent request.
    pub(crate) fn install_token(&self, token: Option<String>) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = token.filter(|t| !t.trim().is_empty());
    }

    /// Whether a session token is installed.
    pub fn has_session_token(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Session token, else the configured API token.
    fn bearer(&self) -> Option<String> {
        let installed = self.token.read().unwrap_or_else(|e| e.into_inner()).clone();
        installed.or_else(|| self.config.api_token.clone().filter(|t| !t.trim().is_empty()))
    }

    // ----- connectivity -----

    fn offline_mode(&self) -> MutexGuard<'_, OfflineMode> {
        self.offline.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn connectivity(&self) -> ConnectivityState {
        self.offline_mode().state()
    }

    pub fn is_offline(&self) -> bool {
        self.offline_mode().is_offline()
    }

    /// When the connectivity flag last changed.
    pub fn connectivity_changed_at(&self) -> DateTime<Utc> {
        self.offline_mode().changed_at()
    }

    /// Set the connectivity flag; returns the previous state.
    pub(crate) fn set_connectivity(&self, state: ConnectivityState) -> ConnectivityState {
        let previous = self.offline_mode().set(state);
        if previous != state {
            tracing::info!("connectivity changed: {} -> {}", previous.as_str(), state.as_str());
        }
        previous
    }

    /// Canned data may stand in for the backend only on a development host
    /// with no credential in play.
    pub fn fallback_applies(&self) -> bool {
        self.config.is_dev_target() && !self.config.has_api_token() && !self.has_session_token()
    }

    // ----- queue -----

    /// Queued mutations in replay order.
    pub fn pending_requests(&self) -> Vec<QueuedRequestInfo> {
        self.queue.snapshot()
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Replay every queued mutation in enqueue order.
    ///
    /// Stops early (leaving the rest queued) if the client goes offline again.
    pub async fn flush_queue(&self) -> FlushReport {
        let _flushing = self.flush_lock.lock().await;
        let mut report = FlushReport::default();

        while let Some(request) = self.queue.pop_front() {
            if self.is_offline() {
                self.queue.push_front(request);
                tracing::info!("flush interrupted: client went offline");
                break;
            }

            let result = self.execute(&request.descriptor, self.bearer(), self.config.retry).await;
            match &result {
                Ok(_) => {
                    report.replayed += 1;
                    tracing::info!("replayed queued request: {}", request.id);
                }
                Err(err) => {
                    report.failed += 1;
                    tracing::error!("failed to replay queued request {}: {}", request.id, err);
                }
            }
            request.resolve(result);
        }

        if report.total() > 0 {
            tracing::info!(
                "offline queue flushed: {} replayed, {} failed",
                report.replayed,
                report.failed
            );
        }
        report
    }

    // ----- probes and auth -----

    /// Single-attempt reachability probe with the current credentials.
    pub async fn health(&self) -> ClientResult<HealthReport> {
        self.probe(self.bearer()).await
    }

    /// Single-attempt probe with an explicit token (session validation).
    pub async fn probe_with_token(&self, token: &str) -> ClientResult<HealthReport> {
        self.probe(Some(token.to_string())).await
    }

    async fn probe(&self, bearer: Option<String>) -> ClientResult<HealthReport> {
        let body = self
            .execute(&RequestDescriptor::get(HEALTH_PATH), bearer, RetryPolicy::once())
            .await?;
        // Any 2xx counts as healthy, whatever the body looks like.
        Ok(serde_json::from_value(body).unwrap_or_default())
    }

    /// `POST /api/auth/login`. Never queued.
    pub async fn authenticate(&self, credentials: &Credentials) -> ClientResult<LoginReply> {
        credentials.validate()?;
        let descriptor = RequestDescriptor::post(
            LOGIN_PATH,
            json!({ "username": credentials.username.trim(), "password": credentials.password }),
        );
        let body = self.execute(&descriptor, None, self.config.retry).await?;
        decode_item("data", body)
    }

    // ----- products -----

    pub async fn list_products(&self) -> Listing<Product> {
        self.list(Resource::Products).await
    }

    pub async fn get_product(&self, id: &ProductId) -> ClientResult<Product> {
        self.get(Resource::Products, id).await
    }

    /// Validates against `existing` (the loaded catalog) before sending.
    pub async fn create_product(
        &self,
        draft: &ProductDraft,
        existing: &[Product],
    ) -> ClientResult<Submission<Product>> {
        draft.validate(existing, None)?;
        let body = to_body(&draft.normalized())?;
        self.submit(
            RequestDescriptor::post(Resource::Products.collection_path(), body),
            decode_product,
        )
        .await
    }

    pub async fn update_product(
        &self,
        id: &ProductId,
        draft: &ProductDraft,
        existing: &[Product],
    ) -> ClientResult<Submission<Product>> {
        draft.validate(existing, Some(id))?;
        let body = to_body(&draft.normalized())?;
        self.submit(
            RequestDescriptor::put(Resource::Products.item_path(id.as_str()), body),
            decode_product,
        )
        .await
    }

    pub async fn delete_product(&self, id: &ProductId) -> ClientResult<Submission<()>> {
        self.submit(
            RequestDescriptor::delete(Resource::Products.item_path(id.as_str())),
            envelope::decode_ack,
        )
        .await
    }

    // ----- customers -----

    pub async fn list_customers(&self) -> Listing<Customer> {
        self.list(Resource::Customers).await
    }

    pub async fn get_customer(&self, id: &CustomerId) -> ClientResult<Customer> {
        self.get(Resource::Customers, id).await
    }

    pub async fn create_customer(&self, draft: &CustomerDraft) -> ClientResult<Submission<Customer>> {
        draft.validate()?;
        let body = to_body(&draft.normalized())?;
        self.submit(
            RequestDescriptor::post(Resource::Customers.collection_path(), body),
            decode_customer,
        )
        .await
    }

    pub async fn update_customer(
        &self,
        id: &CustomerId,
        draft: &CustomerDraft,
    ) -> ClientResult<Submission<Customer>> {
        draft.validate()?;
        let body = to_body(&draft.normalized())?;
        self.submit(
            RequestDescriptor::put(Resource::Customers.item_path(id.as_str()), body),
            decode_customer,
        )
        .await
    }

    pub async fn delete_customer(&self, id: &CustomerId) -> ClientResult<Submission<()>> {
        self.submit(
            RequestDescriptor::delete(Resource::Customers.item_path(id.as_str())),
            envelope::decode_ack,
        )
        .await
    }

    // ----- quotes -----

    pub async fn list_quotes(&self) -> Listing<Quote> {
        self.list(Resource::Quotes).await
    }

    pub async fn get_quote(&self, id: &QuoteId) -> ClientResult<Quote> {
        self.get(Resource::Quotes, id).await
    }

    /// The submitted total is recomputed from the line items.
    pub async fn create_quote(&self, draft: &QuoteDraft) -> ClientResult<Submission<Quote>> {
        let body = to_body(&draft.prepare()?)?;
        self.submit(
            RequestDescriptor::post(Resource::Quotes.collection_path(), body),
            decode_quote,
        )
        .await
    }

    pub async fn update_quote(&self, id: &QuoteId, draft: &QuoteDraft) -> ClientResult<Submission<Quote>> {
        let body = to_body(&draft.prepare()?)?;
        self.submit(
            RequestDescriptor::put(Resource::Quotes.item_path(id.as_str()), body),
            decode_quote,
        )
        .await
    }

    pub async fn delete_quote(&self, id: &QuoteId) -> ClientResult<Submission<()>> {
        self.submit(
            RequestDescriptor::delete(Resource::Quotes.item_path(id.as_str())),
            envelope::decode_ack,
        )
        .await
    }

    /// `POST /api/quotes/:id/convert`.
    pub async fn convert_quote(&self, id: &QuoteId) -> ClientResult<Submission<ConversionReceipt>> {
        self.submit(
            RequestDescriptor::post(convert_quote_path(id.as_str()), json!({})),
            decode_receipt,
        )
        .await
    }

    // ----- internals -----

    async fn list<T: DeserializeOwned>(&self, resource: Resource) -> Listing<T> {
        let key = resource.collection_key();
        let descriptor = RequestDescriptor::get(resource.collection_path());

        let cause = match self.execute(&descriptor, self.bearer(), self.config.retry).await {
            Ok(body) => match decode_list::<T>(key, body) {
                Ok(ListEnvelope::Success(records)) => return Listing::Live(records),
                Ok(ListEnvelope::Failure(message)) => ClientError::Backend(message),
                Err(err) => err,
            },
            Err(err) => err,
        };

        if self.fallback_applies() {
            match decode_list::<T>(key, fallback::envelope(resource)) {
                Ok(ListEnvelope::Success(records)) => {
                    tracing::warn!("serving sample {} ({} records): {}", resource, records.len(), cause);
                    return Listing::Mock { records, cause };
                }
                Ok(ListEnvelope::Failure(_)) | Err(_) => {
                    tracing::error!("sample {} failed to decode", resource);
                }
            }
        }

        tracing::warn!("failed to list {}: {}", resource, cause);
        Listing::Failed(cause)
    }

    async fn get<T>(&self, resource: Resource, id: &T::Id) -> ClientResult<T>
    where
        T: DeserializeOwned + Entity + Clone,
        T::Id: core::fmt::Display,
    {
        let descriptor = RequestDescriptor::get(resource.item_path(&id.to_string()));
        let result = match self.execute(&descriptor, self.bearer(), self.config.retry).await {
            Ok(body) => decode_item::<T>(resource.item_key(), body),
            Err(err) => Err(err),
        };

        match result {
            Err(err) if self.fallback_applies() && !matches!(err, ClientError::NotFound(_)) => {
                let sample = match decode_list::<T>(resource.collection_key(), fallback::envelope(resource)) {
                    Ok(ListEnvelope::Success(records)) => records,
                    _ => Vec::new(),
                };
                match find_by_id(&sample, id) {
                    Some(record) => {
                        tracing::warn!("serving sample {} {}: {}", resource, id, err);
                        Ok(record.clone())
                    }
                    None => Err(err),
                }
            }
            other => other,
        }
    }

    /// Send a mutation now, or queue it while offline.
    ///
    /// While earlier mutations are still queued a new one goes behind them,
    /// so writes reach the backend in the order they were issued.
    async fn submit<T>(
        &self,
        descriptor: RequestDescriptor,
        decode: fn(Value) -> ClientResult<T>,
    ) -> ClientResult<Submission<T>> {
        if descriptor.method.is_mutation() && (self.is_offline() || !self.queue.is_empty()) {
            let (id, rx) = self.queue.enqueue(descriptor);
            let pending = PendingRequest::new(id, rx, decode);
            if self.is_offline() {
                return Ok(Submission::Queued(pending));
            }

            self.flush_queue().await;
            if self.queue.contains(id) {
                return Ok(Submission::Queued(pending));
            }
            return pending.wait().await.map(Submission::Completed);
        }

        let body = self.execute(&descriptor, self.bearer(), self.config.retry).await?;
        decode(body).map(Submission::Completed)
    }

    /// Send with retry; transient failures back off linearly between attempts.
    async fn execute(
        &self,
        descriptor: &RequestDescriptor,
        bearer: Option<String>,
        policy: RetryPolicy,
    ) -> ClientResult<Value> {
        let request = OutgoingRequest {
            method: descriptor.method,
            url: format!("{}{}", self.config.base_url, descriptor.path),
            bearer,
            body: descriptor.body.clone(),
        };

        let mut retry = policy.start();
        loop {
            let attempt = retry.begin_attempt();
            let err = match self.send_once(&request).await {
                Ok(body) => return Ok(body),
                Err(err) => err,
            };

            match retry.on_failure(err.is_retryable()) {
                RetryStep::Retry { after } => {
                    tracing::warn!(
                        "{} {} failed (attempt {}): {}; retrying in {:?}",
                        request.method,
                        descriptor.path,
                        attempt,
                        err,
                        after
                    );
                    tokio::time::sleep(after).await;
                }
                RetryStep::GiveUp => {
                    tracing::debug!(
                        "{} {} failed after {} attempt(s): {}",
                        request.method,
                        descriptor.path,
                        attempt,
                        err
                    );
                    return Err(err);
                }
            }
        }
    }

    async fn send_once(&self, request: &OutgoingRequest) -> ClientResult<Value> {
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(ClientError::from_status(response.status, &response.body));
        }
        Ok(parse_body(&response.body))
    }
}

impl core::fmt::Debug for ResourceClient {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResourceClient")
            .field("config", &self.config)
            .field("connectivity", &self.connectivity())
            .field("pending", &self.queue.len())
            .finish_non_exhaustive()
    }
}

/// Empty bodies become `null`; non-JSON bodies are kept as a string.
fn parse_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

fn to_body<T: Serialize>(payload: &T) -> ClientResult<Value> {
    serde_json::to_value(payload).map_err(|e| ClientError::Decode(e.to_string()))
}

fn decode_product(body: Value) -> ClientResult<Product> {
    decode_item(Resource::Products.item_key(), body)
}

fn decode_customer(body: Value) -> ClientResult<Customer> {
    decode_item(Resource::Customers.item_key(), body)
}

fn decode_quote(body: Value) -> ClientResult<Quote> {
    decode_item(Resource::Quotes.item_key(), body)
}

fn decode_receipt(body: Value) -> ClientResult<ConversionReceipt> {
    match body {
        Value::Null => Ok(ConversionReceipt::default()),
        other => decode_item("data", other),
    }
}
