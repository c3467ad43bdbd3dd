// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messages exchanged between proxies and the owner on the bus.
//!
//! The bus is broadcast: every actor sees every message. Queries are
//! addressed implicitly to whoever owns the store; results carry the
//! requester id so every other proxy can discard them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::HearthError;
use crate::types::{ExecMode, ExecOutcome, RequesterId, Row};

/// Fallback error text when a failed result carries no message.
const DEFAULT_FAILURE: &str = "owner error";

/// Everything that travels on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BusMessage {
    Query(QueryRequest),
    Result(QueryResponse),
}

/// A statement forwarded by a proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub requester_id: RequesterId,
    #[serde(rename = "id")]
    pub correlation_id: u64,
    pub sql: String,
    #[serde(default)]
    pub params: Vec<Value>,
    pub mode: ExecMode,
}

/// The owner's answer to exactly one [`QueryRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub requester_id: RequesterId,
    #[serde(rename = "id")]
    pub correlation_id: u64,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Row>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Class of a failure. Absent means a statement failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
}

/// Why the owner could not answer with rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// The statement itself failed; the owner is still serving.
    Statement,
    /// The owner's storage engine is gone; the owner is shutting down.
    Engine,
}

impl QueryResponse {
    /// Build the response for a request from the engine's result.
    pub fn for_request(request: &QueryRequest, result: Result<ExecOutcome, HearthError>) -> Self {
        match result {
            Ok(outcome) => Self {
                requester_id: request.requester_id.clone(),
                correlation_id: request.correlation_id,
                ok: true,
                rows: Some(outcome.rows),
                changes: Some(outcome.changes),
                error: None,
                kind: None,
            },
            Err(err) => Self {
                requester_id: request.requester_id.clone(),
                correlation_id: request.correlation_id,
                ok: false,
                rows: None,
                changes: None,
                error: Some(failure_text(&err)),
                kind: Some(if err.is_fatal() {
                    FailureKind::Engine
                } else {
                    FailureKind::Statement
                }),
            },
        }
    }

    /// Whether this response answers one of `requester`'s requests.
    pub fn is_for(&self, requester: &RequesterId) -> bool {
        &self.requester_id == requester
    }

    /// Convert into the caller-facing result.
    pub fn into_outcome(self) -> Result<ExecOutcome, HearthError> {
        if self.ok {
            Ok(ExecOutcome {
                rows: self.rows.unwrap_or_default(),
                changes: self.changes.unwrap_or(0),
            })
        } else {
            let message = self.error.unwrap_or_else(|| DEFAULT_FAILURE.to_string());
            match self.kind {
                Some(FailureKind::Engine) => Err(HearthError::EngineUnavailable { reason: message }),
                Some(FailureKind::Statement) | None => Err(HearthError::Statement { message }),
            }
        }
    }
}

/// Strip the local error prefix for statement failures so proxies see the
/// same message the owner's caller would.
fn failure_text(err: &HearthError) -> String {
    match err {
        HearthError::Statement { message } => message.clone(),
        HearthError::EngineUnavailable { reason } => reason.clone(),
        other => other.to_string(),
    }
}
