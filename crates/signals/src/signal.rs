use jido_core::{CorrelationId, SessionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The fixed set of signal types the bus will broadcast (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    Loaded,
    Updated,
    Saved,
    Rendered,
    Failed,
    SessionClosed,
    SubscriberCleaned,
}

impl SignalType {
    pub fn as_str(self) -> &'static str {
        match self {
            SignalType::Loaded => "loaded",
            SignalType::Updated => "updated",
            SignalType::Saved => "saved",
            SignalType::Rendered => "rendered",
            SignalType::Failed => "failed",
            SignalType::SessionClosed => "session_closed",
            SignalType::SubscriberCleaned => "subscriber_cleaned",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SignalType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "loaded" => Ok(SignalType::Loaded),
            "updated" => Ok(SignalType::Updated),
            "saved" => Ok(SignalType::Saved),
            "rendered" => Ok(SignalType::Rendered),
            "failed" => Ok(SignalType::Failed),
            "session_closed" => Ok(SignalType::SessionClosed),
            "subscriber_cleaned" => Ok(SignalType::SubscriberCleaned),
            _ => Err(()),
        }
    }
}

const SCHEMA_VERSION: u64 = 1;

/// A single signal delivered to subscribers of one session (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    #[serde(rename = "type")]
    pub type_: SignalType,
    pub session_id: SessionId,
    pub data: Value,
    pub schema_version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<CorrelationId>,
    pub emitted_at: u64,
    pub metadata: Value,
}

impl Signal {
    pub fn new(
        type_: SignalType,
        session_id: SessionId,
        data: Value,
        emitted_at: u64,
        correlation_id: Option<CorrelationId>,
        metadata: Value,
    ) -> Self {
        Self {
            type_,
            session_id,
            data,
            schema_version: SCHEMA_VERSION,
            correlation_id,
            emitted_at,
            metadata,
        }
    }
}
