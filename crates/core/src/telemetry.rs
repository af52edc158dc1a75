//! Structured telemetry hook emitted once per action (spec §9).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionTelemetry {
    pub event: String,
    pub duration_us: u64,
    pub status: String,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

/// Pluggable sink so callers can wire telemetry into metrics/logging
/// backends without the core depending on any of them directly.
pub trait TelemetrySink: Send + Sync {
    fn record(&self, event: ActionTelemetry);
}

/// Default sink that forwards to `tracing`.
#[derive(Default)]
pub struct NoopTelemetrySink;

impl TelemetrySink for NoopTelemetrySink {
    fn record(&self, event: ActionTelemetry) {
        tracing::debug!(
            event = %event.event,
            duration_us = event.duration_us,
            status = %event.status,
            session_id = %event.session_id,
            correlation_id = ?event.correlation_id,
            "action telemetry"
        );
    }
}

#[cfg(test)]
#[path = "telemetry_tests.rs"]
mod tests;
