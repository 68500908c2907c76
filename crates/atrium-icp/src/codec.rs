use serde::{Serialize, de::DeserializeOwned};

use crate::CallError;

/// Serializes a value to CBOR bytes for wire transmission.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CallError> {
    serde_cbor::to_vec(value).map_err(|err| CallError::Encode(err.to_string()))
}

/// Deserializes a CBOR payload into a typed value.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CallError> {
    serde_cbor::from_slice(bytes).map_err(|err| CallError::Decode(err.to_string()))
}
