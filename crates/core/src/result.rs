//! The Result envelope every command returns (spec §6).

use crate::error::JidoError;
use serde::{Deserialize, Serialize};

/// Whether a command is safe to retry/replay without changing semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Idempotency {
    Idempotent,
    ConditionallyIdempotent,
    NonIdempotent,
}

/// `{status: ok|error}` discriminant surfaced alongside value/error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionMetadata {
    pub action: String,
    pub idempotency: Idempotency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    pub duration_us: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl ActionMetadata {
    pub fn new(action: impl Into<String>, idempotency: Idempotency, duration_us: u64) -> Self {
        Self {
            action: action.into(),
            idempotency,
            correlation_id: None,
            duration_us,
            idempotency_key: None,
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// `{status, value?, error?, metadata}` — the envelope every command
/// returns instead of a bare `Result`, so transport adapters can serialize
/// it verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult<T> {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JidoError>,
    pub metadata: ActionMetadata,
}

impl<T> ActionResult<T> {
    pub fn ok(value: T, metadata: ActionMetadata) -> Self {
        Self {
            status: Status::Ok,
            value: Some(value),
            error: None,
            metadata,
        }
    }

    pub fn err(error: JidoError, metadata: ActionMetadata) -> Self {
        Self {
            status: Status::Error,
            value: None,
            error: Some(error),
            metadata,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.status, Status::Ok)
    }

    /// Build an envelope from a plain `Result`, filling in the metadata.
    pub fn from_result(result: Result<T, JidoError>, metadata: ActionMetadata) -> Self {
        match result {
            Ok(value) => Self::ok(value, metadata),
            Err(error) => Self::err(error, metadata),
        }
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
