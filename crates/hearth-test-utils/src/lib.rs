// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Hearth integration tests.
//!
//! Provides an isolated multi-actor environment (temp store, lock directory,
//! and bus) so election and routing can be exercised in one process.
//!
//! # Components
//!
//! - [`TestCluster`] - shared config, lock, and bus for N actors
//! - [`CountingLock`] - lock wrapper that records election attempts

pub mod harness;
pub mod lock;

pub use harness::{TestCluster, TestClusterBuilder};
pub use lock::CountingLock;
