// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seams between the coordination layer and its collaborators.

pub mod bus;
pub mod executor;
pub mod lock;

pub use bus::{BusReceiver, MessageBus};
pub use executor::StatementExecutor;
pub use lock::{LockLease, NamedLock};
