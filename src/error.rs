// src/error.rs
//! Error taxonomy for adapter runs and per-listing normalization.

use std::time::Duration;
use thiserror::Error;

/// Why one adapter produced no listings. Never escapes the orchestrator.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Parse(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("adapter panicked")]
    Panicked,

    #[error("adapter misconfigured: {0}")]
    Config(String),
}

impl AdapterError {
    /// Short label used for metrics and the diagnostics view.
    pub fn kind(&self) -> &'static str {
        match self {
            AdapterError::Network(_) => "network",
            AdapterError::Status(_) => "status",
            AdapterError::Parse(_) => "parse",
            AdapterError::Timeout(_) => "timeout",
            AdapterError::Panicked => "panic",
            AdapterError::Config(_) => "config",
        }
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(e: serde_json::Error) -> Self {
        AdapterError::Parse(e.to_string())
    }
}

/// A single listing that cannot enter the aggregate. Siblings are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceParseError {
    #[error("no valid price in {0:?}")]
    NoPrice(String),

    #[error("empty product name")]
    EmptyName,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_names_the_budget() {
        let e = AdapterError::Timeout(Duration::from_secs(10));
        assert_eq!(e.to_string(), "timed out after 10s");
        assert_eq!(e.kind(), "timeout");
    }
}
