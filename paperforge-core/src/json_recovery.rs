//! Recovery of JSON payloads from LLM completions.
//!
//! Completions arrive wrapped in Markdown fences, sprinkled with control
//! characters, or serialized as a JSON string one or more times. Recovery
//! strips the wrapping once and then unwraps string layers a bounded number
//! of times.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

/// Parse attempts allowed before giving up on a still-string payload
pub const MAX_UNWRAP_ITERATIONS: usize = 3;

/// Message shown to callers for every recovery failure
pub const RECOVERY_FAILED: &str = "Failed to parse JSON from API response.";

static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)```json").unwrap());

#[derive(Debug, Error)]
pub enum JsonRecoveryError {
    /// A parse attempt failed outright
    #[error("Failed to parse JSON from API response.")]
    Malformed {
        cleaned: String,
        #[source]
        source: serde_json::Error,
    },

    /// Still a string after `MAX_UNWRAP_ITERATIONS` parses
    #[error("Failed to parse JSON from API response.")]
    TooDeep { cleaned: String },

    /// Recovered, but the value does not fit the requested type
    #[error("Failed to parse JSON from API response.")]
    Schema {
        value: Value,
        #[source]
        source: serde_json::Error,
    },
}

impl JsonRecoveryError {
    /// The string that was being parsed when recovery stopped
    pub fn cleaned(&self) -> Option<&str> {
        match self {
            JsonRecoveryError::Malformed { cleaned, .. } | JsonRecoveryError::TooDeep { cleaned } => {
                Some(cleaned)
            }
            JsonRecoveryError::Schema { .. } => None,
        }
    }

    /// Underlying cause, for logs
    pub fn detail(&self) -> String {
        match self {
            JsonRecoveryError::Malformed { source, .. } | JsonRecoveryError::Schema { source, .. } => {
                source.to_string()
            }
            JsonRecoveryError::TooDeep { .. } => {
                format!("payload still a string after {MAX_UNWRAP_ITERATIONS} parses")
            }
        }
    }
}

/// Remove every ```` ```json ```` marker (any case) and every bare fence
pub fn strip_fences(raw: &str) -> String {
    JSON_FENCE.replace_all(raw, "").replace("```", "")
}

/// Drop C0 controls outright, newlines inside string values included
pub fn strip_control_chars(text: &str) -> String {
    text.chars().filter(|c| (*c as u32) > 0x1f).collect()
}

/// Salvage a JSON value from a raw completion.
///
/// The result is never a `Value::String`.
pub fn recover_json(raw: &str) -> Result<Value, JsonRecoveryError> {
    let mut current = strip_control_chars(&strip_fences(raw)).trim().to_string();

    for iteration in 1..=MAX_UNWRAP_ITERATIONS {
        let value: Value = serde_json::from_str(&current).map_err(|source| {
            debug!("JSON parse failed on attempt {iteration}: {source}");
            JsonRecoveryError::Malformed {
                cleaned: current.clone(),
                source,
            }
        })?;

        match value {
            Value::String(inner) => {
                debug!("Payload was string-encoded, unwrapping (attempt {iteration})");
                current = inner;
            }
            other => return Ok(other),
        }
    }

    Err(JsonRecoveryError::TooDeep { cleaned: current })
}

/// `recover_json` followed by deserialization into `T`
pub fn recover_as<T: DeserializeOwned>(raw: &str) -> Result<T, JsonRecoveryError> {
    let value = recover_json(raw)?;
    serde_json::from_value(value.clone()).map_err(|source| JsonRecoveryError::Schema { value, source })
}
