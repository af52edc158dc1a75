//! Canonical error taxonomy surfaced at every command boundary (spec §6, §7).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The reason codes a command can fail with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidParams,
    ParseFailed,
    ValidationFailed,
    FilesystemError,
    RenderFailed,
    NotFound,
    Conflict,
    Busy,
    SubscriptionError,
    Forbidden,
    Internal,
}

/// The broad category a code belongs to, used for metrics/log grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Input,
    Parsing,
    Validation,
    Io,
    Render,
    Lifecycle,
    System,
}

impl ErrorCode {
    /// Category this code is filed under.
    pub fn category(self) -> ErrorCategory {
        match self {
            ErrorCode::InvalidParams => ErrorCategory::Input,
            ErrorCode::ParseFailed => ErrorCategory::Parsing,
            ErrorCode::ValidationFailed => ErrorCategory::Validation,
            ErrorCode::FilesystemError => ErrorCategory::Io,
            ErrorCode::RenderFailed => ErrorCategory::Render,
            ErrorCode::NotFound => ErrorCategory::Lifecycle,
            ErrorCode::Conflict => ErrorCategory::Lifecycle,
            ErrorCode::Busy => ErrorCategory::Lifecycle,
            ErrorCode::SubscriptionError => ErrorCategory::System,
            ErrorCode::Forbidden => ErrorCategory::System,
            ErrorCode::Internal => ErrorCategory::System,
        }
    }

    /// Whether a caller-side retry helper (§7) should consider this retryable.
    pub fn retryable(self) -> bool {
        matches!(
            self,
            ErrorCode::Busy | ErrorCode::FilesystemError | ErrorCode::RenderFailed
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidParams => "invalid_params",
            ErrorCode::ParseFailed => "parse_failed",
            ErrorCode::ValidationFailed => "validation_failed",
            ErrorCode::FilesystemError => "filesystem_error",
            ErrorCode::RenderFailed => "render_failed",
            ErrorCode::NotFound => "not_found",
            ErrorCode::Conflict => "conflict",
            ErrorCode::Busy => "busy",
            ErrorCode::SubscriptionError => "subscription_error",
            ErrorCode::Forbidden => "forbidden",
            ErrorCode::Internal => "internal",
        };
        write!(f, "{s}")
    }
}

/// A first-class error value. Never crosses a component boundary as a panic
/// or an exception — every fallible operation in this workspace returns one
/// of these wrapped in a `Result`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JidoError {
    pub code: ErrorCode,
    pub category: ErrorCategory,
    pub message: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
    pub retryable: bool,
}

impl JidoError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            category: code.category(),
            retryable: code.retryable(),
            code,
            message: message.into(),
            details: Value::Null,
        }
    }

    /// Attach structured details (e.g. `remediation`, conflicting hashes).
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Attach a `remediation` hint list, per spec §7 conflict guidance.
    pub fn with_remediation(self, steps: &[&str]) -> Self {
        let mut details = match self.details {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        details.insert(
            "remediation".to_string(),
            Value::Array(steps.iter().map(|s| Value::String(s.to_string())).collect()),
        );
        self.with_details(Value::Object(details))
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    pub fn busy(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Busy, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    pub fn parse_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseFailed, message)
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn filesystem(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::FilesystemError, message)
    }

    pub fn render_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RenderFailed, message)
    }
}

impl fmt::Display for JidoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for JidoError {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
