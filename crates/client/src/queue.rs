//! In-memory FIFO of mutations deferred while offline.
//!
//! Each entry carries a serializable [`RequestDescriptor`] and a oneshot
//! responder. The caller keeps the matching [`PendingRequest`] and awaits it;
//! the responder fires when the entry is replayed (or dropped).

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};
use crate::transport::{Method, RequestDescriptor};

type Responder = oneshot::Sender<ClientResult<Value>>;

/// A deferred mutation waiting for connectivity.
#[derive(Debug)]
pub struct QueuedRequest {
    pub id: Uuid,
    pub descriptor: RequestDescriptor,
    pub enqueued_at: DateTime<Utc>,
    responder: Responder,
}

impl QueuedRequest {
    pub fn info(&self) -> QueuedRequestInfo {
        QueuedRequestInfo {
            id: self.id,
            method: self.descriptor.method,
            path: self.descriptor.path.clone(),
            enqueued_at: self.enqueued_at,
        }
    }

    /// Deliver the replay outcome to whoever is waiting.
    pub fn resolve(self, result: ClientResult<Value>) {
        if self.responder.send(result).is_err() {
            tracing::debug!(request_id = %self.id, "queued request resolved with no one waiting");
        }
    }
}

/// Inspectable view of a queued request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedRequestInfo {
    pub id: Uuid,
    pub method: Method,
    pub path: String,
    pub enqueued_at: DateTime<Utc>,
}

/// FIFO of deferred mutations.
///
/// Not persisted: entries are lost when the process exits.
#[derive(Debug, Default)]
pub struct OfflineQueue {
    entries: Mutex<VecDeque<QueuedRequest>>,
}

impl OfflineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, VecDeque<QueuedRequest>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a descriptor; returns its id and the receiver for its outcome.
    pub fn enqueue(&self, descriptor: RequestDescriptor) -> (Uuid, oneshot::Receiver<ClientResult<Value>>) {
        let (tx, rx) = oneshot::channel();
        let request = QueuedRequest {
            id: Uuid::now_v7(),
            descriptor,
            enqueued_at: Utc::now(),
            responder: tx,
        };
        let id = request.id;

        let mut entries = self.entries();
        entries.push_back(request);
        tracing::info!(request_id = %id, queued = entries.len(), "request queued for replay");

        (id, rx)
    }

    pub fn pop_front(&self) -> Option<QueuedRequest> {
        self.entries().pop_front()
    }

    /// Put an entry back at the head (replay interrupted).
    pub fn push_front(&self, request: QueuedRequest) {
        self.entries().push_front(request);
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.entries().iter().any(|request| request.id == id)
    }

    /// Entries in replay order.
    pub fn snapshot(&self) -> Vec<QueuedRequestInfo> {
        self.entries().iter().map(QueuedRequest::info).collect()
    }

    /// Drop every entry; waiters observe [`ClientError::QueueDropped`].
    pub fn clear(&self) -> usize {
        let drained: Vec<_> = self.entries().drain(..).collect();
        let count = drained.len();
        for request in drained {
            request.resolve(Err(ClientError::QueueDropped));
        }
        count
    }
}

/// Handle to a queued mutation's eventual outcome.
#[derive(Debug)]
pub struct PendingRequest<T> {
    id: Uuid,
    rx: oneshot::Receiver<ClientResult<Value>>,
    decode: fn(Value) -> ClientResult<T>,
}

impl<T> PendingRequest<T> {
    pub(crate) fn new(
        id: Uuid,
        rx: oneshot::Receiver<ClientResult<Value>>,
        decode: fn(Value) -> ClientResult<T>,
    ) -> Self {
        Self { id, rx, decode }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Wait until the request is replayed and decode its response.
    pub async fn wait(self) -> ClientResult<T> {
        match self.rx.await {
            Ok(Ok(body)) => (self.decode)(body),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(ClientError::QueueDropped),
        }
    }
}

/// Outcome of a mutation: done now, or deferred until connectivity returns.
#[derive(Debug)]
pub enum Submission<T> {
    Completed(T),
    Queued(PendingRequest<T>),
}

impl<T> Submission<T> {
    pub fn is_queued(&self) -> bool {
        matches!(self, Submission::Queued(_))
    }

    /// The value, if the mutation already completed.
    pub fn completed(self) -> Option<T> {
        match self {
            Submission::Completed(value) => Some(value),
            Submission::Queued(_) => None,
        }
    }

    /// The value, waiting for replay when queued.
    pub async fn resolve(self) -> ClientResult<T> {
        match self {
            Submission::Completed(value) => Ok(value),
            Submission::Queued(pending) => pending.wait().await,
        }
    }
}
