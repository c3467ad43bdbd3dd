// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Proxy side of the bus protocol.
//!
//! Each statement becomes a [`QueryRequest`] with a fresh correlation id.
//! A pending entry waits for the matching [`QueryResponse`]; the listener
//! task routes responses to it. If the owner stays silent past the timeout
//! the call fails with [`HearthError::LeaderUnreachable`] and the restart
//! token fires so the supervisor can run a fresh election.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use hearth_core::{
    BusMessage, BusReceiver, ExecMode, ExecOutcome, HearthError, MessageBus, QueryRequest,
    RequesterId, StatementExecutor,
};

type Reply = Result<ExecOutcome, HearthError>;

struct PendingRequest {
    reply: oneshot::Sender<Reply>,
    deadline: Instant,
}

type PendingTable = Arc<DashMap<u64, PendingRequest>>;

/// Executes statements by round trip to whichever actor owns the store.
pub struct ProxyClient {
    requester_id: RequesterId,
    bus: Arc<dyn MessageBus>,
    pending: PendingTable,
    next_id: AtomicU64,
    timeout: Duration,
    restart: CancellationToken,
}

impl ProxyClient {
    pub fn new(
        requester_id: RequesterId,
        bus: Arc<dyn MessageBus>,
        timeout: Duration,
        restart: CancellationToken,
    ) -> Self {
        Self {
            requester_id,
            bus,
            pending: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(1),
            timeout,
            restart,
        }
    }

    pub fn requester_id(&self) -> &RequesterId {
        &self.requester_id
    }

    /// Requests still waiting for a response.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Start routing responses from `receiver` to pending calls.
    ///
    /// The receiver must be subscribed before the first request is published.
    pub fn spawn_listener(
        &self,
        receiver: Box<dyn BusReceiver>,
        tasks: &TaskTracker,
        shutdown: CancellationToken,
    ) {
        tasks.spawn(listen(
            self.requester_id.clone(),
            Arc::clone(&self.pending),
            receiver,
            shutdown,
        ));
    }
}

#[async_trait]
impl StatementExecutor for ProxyClient {
    async fn execute(
        &self,
        sql: &str,
        params: &[Value],
        mode: ExecMode,
    ) -> Result<ExecOutcome, HearthError> {
        let correlation_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (reply, rx) = oneshot::channel();
        self.pending.insert(
            correlation_id,
            PendingRequest {
                reply,
                deadline: Instant::now() + self.timeout,
            },
        );

        let request = BusMessage::Query(QueryRequest {
            requester_id: self.requester_id.clone(),
            correlation_id,
            sql: sql.to_string(),
            params: params.to_vec(),
            mode,
        });
        if let Err(e) = self.bus.publish(&request).await {
            self.pending.remove(&correlation_id);
            return Err(e);
        }
        debug!(requester_id = %self.requester_id, correlation_id, mode = %mode, "query sent");

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(Err(e))) if e.is_fatal() => {
                warn!(
                    requester_id = %self.requester_id,
                    correlation_id,
                    error = %e,
                    "owner reports its engine is gone, requesting re-election"
                );
                self.restart.cancel();
                Err(e)
            }
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => Err(HearthError::bus("proxy listener stopped")),
            Err(_) => {
                self.pending.remove(&correlation_id);
                warn!(
                    requester_id = %self.requester_id,
                    correlation_id,
                    timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                    "owner did not answer, requesting re-election"
                );
                self.restart.cancel();
                Err(HearthError::LeaderUnreachable {
                    timeout: self.timeout,
                })
            }
        }
    }
}

async fn listen(
    requester_id: RequesterId,
    pending: PendingTable,
    mut receiver: Box<dyn BusReceiver>,
    shutdown: CancellationToken,
) {
    loop {
        let message = tokio::select! {
            _ = shutdown.cancelled() => break,
            message = receiver.recv() => message,
        };
        match message {
            Some(BusMessage::Result(response)) if response.is_for(&requester_id) => {
                let correlation_id = response.correlation_id;
                match pending.remove(&correlation_id) {
                    Some((_, entry)) if Instant::now() <= entry.deadline => {
                        let _ = entry.reply.send(response.into_outcome());
                    }
                    Some(_) => debug!(correlation_id, "dropping response past its deadline"),
                    None => debug!(correlation_id, "dropping response for unknown correlation id"),
                }
            }
            Some(_) => {}
            None => {
                warn!(requester_id = %requester_id, "bus closed, failing pending requests");
                break;
            }
        }
    }
    fail_all(&pending);
}

/// Fail every outstanding call; nothing will answer them any more.
fn fail_all(pending: &PendingTable) {
    let ids: Vec<u64> = pending.iter().map(|entry| *entry.key()).collect();
    for id in ids {
        if let Some((_, entry)) = pending.remove(&id) {
            let _ = entry
                .reply
                .send(Err(HearthError::bus("proxy stopped before the owner answered")));
        }
    }
}
