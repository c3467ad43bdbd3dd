// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Owner side of the bus protocol: answer every query exactly once.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use hearth_core::{
    BusMessage, BusReceiver, HearthError, MessageBus, QueryRequest, QueryResponse, StatementExecutor,
};

/// Start the dispatch loop on `tasks`.
///
/// Each query runs in its own task so a slow statement never stalls the
/// loop; the storage engine still serializes execution. Statement failures
/// become failed responses and never end the loop.
pub fn spawn_dispatch(
    engine: Arc<dyn StatementExecutor>,
    bus: Arc<dyn MessageBus>,
    receiver: Box<dyn BusReceiver>,
    tasks: &TaskTracker,
    shutdown: CancellationToken,
) {
    let spawner = tasks.clone();
    tasks.spawn(dispatch(engine, bus, receiver, spawner, shutdown));
}

async fn dispatch(
    engine: Arc<dyn StatementExecutor>,
    bus: Arc<dyn MessageBus>,
    mut receiver: Box<dyn BusReceiver>,
    tasks: TaskTracker,
    shutdown: CancellationToken,
) {
    info!("owner dispatch loop started");
    loop {
        let message = tokio::select! {
            _ = shutdown.cancelled() => break,
            message = receiver.recv() => message,
        };
        match message {
            Some(BusMessage::Query(request)) => {
                tasks.spawn(answer(Arc::clone(&engine), Arc::clone(&bus), request));
            }
            // Our own answers, and answers from a stale owner, come back too.
            Some(BusMessage::Result(_)) => {}
            None => {
                warn!("bus closed, owner dispatch loop stopping");
                break;
            }
        }
    }
    debug!("owner dispatch loop stopped");
}

async fn answer(engine: Arc<dyn StatementExecutor>, bus: Arc<dyn MessageBus>, request: QueryRequest) {
    let result = engine
        .execute(&request.sql, &request.params, request.mode)
        .await;
    if let Err(e) = &result {
        debug!(
            requester_id = %request.requester_id,
            correlation_id = request.correlation_id,
            error = %e,
            "query failed"
        );
    }
    let succeeded = result.is_ok();
    let response = QueryResponse::for_request(&request, result);
    let Err(e) = bus.publish(&BusMessage::Result(response)).await else {
        return;
    };
    warn!(
        requester_id = %request.requester_id,
        correlation_id = request.correlation_id,
        error = %e,
        "failed to publish response"
    );
    if !succeeded {
        return;
    }
    // The statement ran, but its result cannot cross the bus (usually too
    // large). The caller still gets an answer instead of a timeout.
    let fallback = QueryResponse::for_request(
        &request,
        Err(HearthError::Statement {
            message: format!("result could not be delivered: {e}"),
        }),
    );
    if let Err(e) = bus.publish(&BusMessage::Result(fallback)).await {
        warn!(
            requester_id = %request.requester_id,
            correlation_id = request.correlation_id,
            error = %e,
            "failed to publish failure response"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use hearth_bus::LocalBus;
    use hearth_core::{ExecMode, RequesterId};
    use hearth_storage::{Database, StorageEngine};
    use serde_json::json;

    async fn start_owner() -> (Arc<LocalBus>, CancellationToken, TaskTracker) {
        let bus = Arc::new(LocalBus::new(64));
        let engine = Arc::new(StorageEngine::from_database(
            Database::open_in_memory().await.unwrap(),
        ));
        let shutdown = CancellationToken::new();
        let tasks = TaskTracker::new();
        spawn_dispatch(
            engine,
            bus.clone(),
            bus.subscribe().await.unwrap(),
            &tasks,
            shutdown.clone(),
        );
        (bus, shutdown, tasks)
    }

    fn query(id: u64, sql: &str, params: Vec<serde_json::Value>, mode: ExecMode) -> BusMessage {
        BusMessage::Query(QueryRequest {
            requester_id: RequesterId("tab".into()),
            correlation_id: id,
            sql: sql.into(),
            params,
            mode,
        })
    }

    async fn next_result(rx: &mut Box<dyn BusReceiver>) -> QueryResponse {
        loop {
            let msg = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .unwrap()
                .unwrap();
            if let BusMessage::Result(r) = msg {
                return r;
            }
        }
    }

    #[tokio::test]
    async fn answers_each_query_once() {
        let (bus, shutdown, _tasks) = start_owner().await;
        let mut rx = bus.subscribe().await.unwrap();

        bus.publish(&query(9, "SELECT value FROM counter", vec![], ExecMode::First))
            .await
            .unwrap();
        let response = next_result(&mut rx).await;
        assert_eq!(response.correlation_id, 9);
        assert!(response.ok);
        assert_eq!(response.rows.unwrap()[0]["value"], json!(42));
        shutdown.cancel();
    }

    #[tokio::test]
    async fn statement_errors_become_failed_responses() {
        let (bus, shutdown, _tasks) = start_owner().await;
        let mut rx = bus.subscribe().await.unwrap();

        bus.publish(&query(1, "SELEC nonsense", vec![], ExecMode::All))
            .await
            .unwrap();
        let response = next_result(&mut rx).await;
        assert!(!response.ok);
        assert!(response.error.is_some());
        assert!(matches!(
            response.into_outcome(),
            Err(HearthError::Statement { .. })
        ));

        // Still serving.
        bus.publish(&query(2, "UPDATE counter SET value = ?", vec![json!(5)], ExecMode::Run))
            .await
            .unwrap();
        let response = next_result(&mut rx).await;
        assert_eq!(response.correlation_id, 2);
        assert_eq!(response.changes, Some(1));
        shutdown.cancel();
    }

    /// A local bus that enforces the datagram size limit.
    struct SizedBus(LocalBus);

    #[async_trait::async_trait]
    impl MessageBus for SizedBus {
        async fn publish(&self, message: &BusMessage) -> Result<(), HearthError> {
            hearth_bus::codec::encode(message)?;
            self.0.publish(message).await
        }

        async fn subscribe(&self) -> Result<Box<dyn BusReceiver>, HearthError> {
            self.0.subscribe().await
        }
    }

    #[tokio::test]
    async fn undeliverable_result_becomes_a_failure() {
        let bus = Arc::new(SizedBus(LocalBus::new(64)));
        let engine = Arc::new(StorageEngine::from_database(
            Database::open_in_memory().await.unwrap(),
        ));
        let shutdown = CancellationToken::new();
        let tasks = TaskTracker::new();
        spawn_dispatch(engine, bus.clone(), bus.subscribe().await.unwrap(), &tasks, shutdown.clone());
        let mut rx = bus.subscribe().await.unwrap();

        let big = format!("SELECT printf('%.*c', {}, 'x') AS big", hearth_bus::codec::MAX_MESSAGE_BYTES + 1);
        bus.publish(&query(3, &big, vec![], ExecMode::First)).await.unwrap();
        let response = next_result(&mut rx).await;
        assert_eq!(response.correlation_id, 3);
        assert!(!response.ok);
        match response.into_outcome() {
            Err(HearthError::Statement { message }) => {
                assert!(message.contains("could not be delivered"), "{message}");
            }
            other => panic!("expected statement failure, got {other:?}"),
        }
        shutdown.cancel();
    }

    #[tokio::test]
    async fn shutdown_stops_the_loop() {
        let (_bus, shutdown, tasks) = start_owner().await;
        shutdown.cancel();
        tasks.close();
        tokio::time::timeout(Duration::from_secs(5), tasks.wait())
            .await
            .unwrap();
    }
}
