// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast message bus shared by every actor on the host.

use async_trait::async_trait;

use crate::error::HearthError;
use crate::protocol::BusMessage;

/// Publish/subscribe channel with fan-out to all current subscribers.
///
/// Delivery is best effort to subscribers present at publish time; absent
/// subscribers never see the message.
#[async_trait]
pub trait MessageBus: Send + Sync + 'static {
    /// Deliver `message` to every current subscriber, including the publisher's own.
    async fn publish(&self, message: &BusMessage) -> Result<(), HearthError>;

    /// Register a new subscriber.
    async fn subscribe(&self) -> Result<Box<dyn BusReceiver>, HearthError>;
}

/// Receiving end of one subscription.
#[async_trait]
pub trait BusReceiver: Send + 'static {
    /// Next message, or `None` once the bus is closed for this subscriber.
    async fn recv(&mut self) -> Option<BusMessage>;
}
