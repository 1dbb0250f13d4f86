//! Typed adapter between entity structs and flat records.

use crate::{Collection, Record, StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A typed entity persisted in one [`Collection`].
///
/// Implementors are plain `serde` structs. The conversion to and from [`Record`] happens
/// only here, at the storage boundary.
pub trait Entity: Serialize + DeserializeOwned {
    /// Collection the entity lives in.
    const COLLECTION: Collection;

    /// Value of the declared identifier field.
    fn id(&self) -> &str;

    /// Encodes the entity as a flat record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if encoding fails or does not produce a JSON object.
    fn to_record(&self) -> StoreResult<Record> {
        match serde_json::to_value(self).map_err(StoreError::Serialization)? {
            Value::Object(record) => Ok(record),
            _ => Err(StoreError::NotARecord(Self::COLLECTION)),
        }
    }

    /// Decodes a flat record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Deserialization` if the record does not fit the entity.
    fn from_record(record: Record) -> StoreResult<Self> {
        serde_json::from_value(Value::Object(record)).map_err(StoreError::Deserialization)
    }
}
