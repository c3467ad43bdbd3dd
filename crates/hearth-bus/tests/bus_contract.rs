// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The same delivery contract checked against every bus implementation.

use std::sync::Arc;
use std::time::Duration;

use hearth_bus::{DatagramBus, LocalBus};
use hearth_core::{BusMessage, ExecMode, MessageBus, QueryRequest, RequesterId};

fn query(id: u64) -> BusMessage {
    BusMessage::Query(QueryRequest {
        requester_id: RequesterId("contract".into()),
        correlation_id: id,
        sql: "SELECT 1".into(),
        params: vec![],
        mode: ExecMode::Run,
    })
}

async fn publisher_sees_its_own_message(bus: Arc<dyn MessageBus>) {
    let mut rx = bus.subscribe().await.unwrap();
    bus.publish(&query(1)).await.unwrap();
    let got = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap();
    assert_eq!(got, Some(query(1)));
}

async fn messages_arrive_in_publish_order(bus: Arc<dyn MessageBus>) {
    let mut rx = bus.subscribe().await.unwrap();
    for id in 0..10 {
        bus.publish(&query(id)).await.unwrap();
    }
    for id in 0..10 {
        let got = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert_eq!(got, Some(query(id)));
    }
}

#[tokio::test]
async fn local_bus_contract() {
    publisher_sees_its_own_message(Arc::new(LocalBus::new(16))).await;
    messages_arrive_in_publish_order(Arc::new(LocalBus::new(16))).await;
}

#[tokio::test]
async fn datagram_bus_contract() {
    let dir = tempfile::tempdir().unwrap();
    publisher_sees_its_own_message(Arc::new(DatagramBus::new(dir.path(), "a"))).await;
    messages_arrive_in_publish_order(Arc::new(DatagramBus::new(dir.path(), "b"))).await;
}
