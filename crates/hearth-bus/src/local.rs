// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process bus backed by a tokio broadcast channel.
//!
//! Useful when every actor is a task in one process (tests, embedded use).
//! Clones share the same channel.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use hearth_core::{BusMessage, BusReceiver, HearthError, MessageBus};

/// Broadcast bus for actors living in one process.
#[derive(Clone)]
pub struct LocalBus {
    sender: broadcast::Sender<Arc<BusMessage>>,
}

impl LocalBus {
    /// Create a bus buffering up to `capacity` messages per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl MessageBus for LocalBus {
    async fn publish(&self, message: &BusMessage) -> Result<(), HearthError> {
        match self.sender.send(Arc::new(message.clone())) {
            Ok(receivers) => debug!(receivers, "published on local bus"),
            // No subscribers: nobody to deliver to, which is not an error.
            Err(_) => debug!("published on local bus with no subscribers"),
        }
        Ok(())
    }

    async fn subscribe(&self) -> Result<Box<dyn BusReceiver>, HearthError> {
        Ok(Box::new(LocalReceiver {
            receiver: self.sender.subscribe(),
        }))
    }
}

struct LocalReceiver {
    receiver: broadcast::Receiver<Arc<BusMessage>>,
}

#[async_trait]
impl BusReceiver for LocalReceiver {
    async fn recv(&mut self) -> Option<BusMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(message) => return Some(message.as_ref().clone()),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "local bus subscriber lagged, messages dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
