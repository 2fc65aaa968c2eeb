//! Contract interface loading and event descriptor lookup.

use std::fs;
use std::path::Path;

use alloy::json_abi::{Event, JsonAbi};

use crate::events::types::{EventError, EventResult};

/// Parse a contract interface from JSON.
///
/// Accepts either a bare ABI array or a compiler artifact object carrying
/// the ABI under an `abi` key.
pub fn parse_abi(json: &str) -> EventResult<JsonAbi> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| EventError::InvalidAbi(e.to_string()))?;
    let abi = match value {
        serde_json::Value::Object(mut artifact) => artifact
            .remove("abi")
            .ok_or_else(|| EventError::InvalidAbi("object without an 'abi' field".to_string()))?,
        other => other,
    };
    serde_json::from_value(abi).map_err(|e| EventError::InvalidAbi(e.to_string()))
}

/// Load a contract interface from a JSON file.
pub fn load_abi(path: &Path) -> EventResult<JsonAbi> {
    let content = fs::read_to_string(path)
        .map_err(|e| EventError::InvalidAbi(format!("{}: {}", path.display(), e)))?;
    parse_abi(&content)
}

/// Find the event descriptor called `name`.
///
/// Overloaded names are rejected rather than resolved to the first match.
pub fn find_event<'a>(abi: &'a JsonAbi, name: &str) -> EventResult<&'a Event> {
    match abi.events.get(name).map(Vec::as_slice) {
        None | Some([]) => Err(EventError::EventNotFound(name.to_string())),
        Some([event]) => Ok(event),
        Some(overloads) => Err(EventError::AmbiguousEvent {
            name: name.to_string(),
            count: overloads.len(),
        }),
    }
}
