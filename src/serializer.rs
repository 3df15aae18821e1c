//! Conversion between stored JSON strings and typed collections
//!
//! Date fields are stored as RFC 3339 strings and come back as `chrono` values.
//! Both directions are lossy on failure: a collection that cannot be (de)serialized is replaced by an empty one.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

const EMPTY_COLLECTION: &str = "[]";

/// JSON-encode a collection. Returns `"[]"` in case of error
pub fn serialize<T: Serialize>(entities: &[T]) -> String {
    match serde_json::to_string(entities) {
        Ok(json) => json,
        Err(err) => {
            log::warn!("Unable to serialize {} entities: {}", entities.len(), err);
            EMPTY_COLLECTION.to_string()
        },
    }
}

/// JSON-decode a collection
pub fn try_deserialize<T: DeserializeOwned>(json: &str) -> Result<Vec<T>> {
    Ok(serde_json::from_str(json)?)
}

/// JSON-decode a collection. Returns an empty list in case of error, discarding corrupted data
pub fn deserialize<T: DeserializeOwned>(json: &str) -> Vec<T> {
    match try_deserialize(json) {
        Ok(entities) => entities,
        Err(err) => {
            log::warn!("Ignoring stored collection: {}", err);
            Vec::new()
        },
    }
}
