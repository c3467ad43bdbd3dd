// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Leader election and query routing for the Hearth coordination layer.
//!
//! Every actor runs the same code: [`Coordinator::start`] elects a role and
//! hands back a [`Facade`] that behaves identically in both. The owner
//! executes on its storage engine and answers queries from the bus; proxies
//! forward their statements over the bus and wait for the answer. When a
//! proxy's owner goes silent, the [`Supervisor`] tears it down and elects
//! again.

pub mod coordinator;
pub mod counter;
pub mod elector;
pub mod facade;
#[cfg(unix)]
pub mod lock;
pub mod owner;
pub mod proxy;
pub mod shutdown;
pub mod supervisor;
pub mod sync;
pub mod tracker;

pub use coordinator::{Coordinator, LocalStatus};
pub use elector::{Election, Elector};
pub use facade::{BoundStatement, Facade, QueryMeta, QueryResult, RunResult, Statement};
#[cfg(unix)]
pub use lock::FileLock;
pub use proxy::ProxyClient;
pub use supervisor::Supervisor;
pub use sync::{RemoteSync, SyncReport, sync_to_remote};
pub use tracker::{MutationTracker, is_mutation};
