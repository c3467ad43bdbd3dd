// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message bus implementations for the Hearth coordination layer.
//!
//! [`LocalBus`] fans messages out to tasks within one process.
//! [`DatagramBus`] fans them out to every process on the host through Unix
//! datagram sockets. Both carry the same [`BusMessage`](hearth_core::BusMessage)
//! values and give the same guarantee: delivery to current subscribers,
//! nothing for absent ones.

pub mod codec;
#[cfg(unix)]
pub mod datagram;
pub mod local;

#[cfg(unix)]
pub use datagram::DatagramBus;
pub use local::LocalBus;
