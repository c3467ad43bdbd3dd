// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The single operation both roles must provide: run one statement.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::HearthError;
use crate::types::{ExecMode, ExecOutcome};

/// Executes statements against the logical store.
///
/// The owner implements this by calling its storage engine directly; a proxy
/// implements it with a correlated round trip over the bus. The query façade
/// is written once against this trait.
#[async_trait]
pub trait StatementExecutor: Send + Sync + 'static {
    /// Execute `sql` with positional `params` in the given `mode`.
    async fn execute(
        &self,
        sql: &str,
        params: &[Value],
        mode: ExecMode,
    ) -> Result<ExecOutcome, HearthError>;
}
