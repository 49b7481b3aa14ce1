//! Canonical byte encoding of secret payloads.
//!
//! Only the active variant is serialized, as JSON.  The tag is not part of
//! the encoded bytes; it travels in the clear on the record and selects
//! the variant on decode.
//!
//! ```text
//! credential  {"login": "...", "password": "..."}
//! text        {"content": "..."}
//! card        {"number": "...", "exp_year": 2030, "exp_month": 4, "cvv": 123}
//! blob        {"file_name": "...", "file_bytes": "<base64>"}
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::secret::{Secret, SecretData, SecretType};
use crate::errors::{KeepsakeError, Result};

/// Encode the active variant of `secret`.
///
/// Fails with `MissingVariant` when there is no payload and
/// `VariantMismatch` when the payload disagrees with the tag.
pub fn encode(secret: &Secret) -> Result<Vec<u8>> {
    let data = secret
        .data
        .as_ref()
        .ok_or(KeepsakeError::MissingVariant(secret.secret_type))?;

    let found = data.secret_type();
    if found != secret.secret_type {
        return Err(KeepsakeError::VariantMismatch {
            expected: secret.secret_type,
            found,
        });
    }

    encode_data(data)
}

/// Encode a bare payload.
pub fn encode_data(data: &SecretData) -> Result<Vec<u8>> {
    match data {
        SecretData::Credential(c) => to_bytes(c),
        SecretData::Text(t) => to_bytes(t),
        SecretData::Card(c) => to_bytes(c),
        SecretData::Blob(b) => to_bytes(b),
    }
}

/// Decode `bytes` into the variant named by the wire tag `secret_type`.
///
/// An unrecognised tag is an error, never a default.
pub fn decode(secret_type: &str, bytes: &[u8]) -> Result<SecretData> {
    decode_as(secret_type.parse()?, bytes)
}

/// Decode `bytes` into the variant for an already-parsed tag.
pub fn decode_as(secret_type: SecretType, bytes: &[u8]) -> Result<SecretData> {
    match secret_type {
        SecretType::Credential => from_bytes(bytes).map(SecretData::Credential),
        SecretType::Text => from_bytes(bytes).map(SecretData::Text),
        SecretType::Card => from_bytes(bytes).map(SecretData::Card),
        SecretType::Blob => from_bytes(bytes).map(SecretData::Blob),
    }
}

fn to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| KeepsakeError::SerializationError(e.to_string()))
}

fn from_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| KeepsakeError::MalformedPayload(e.to_string()))
}
