//! Remote store contract.
//!
//! The server is a generic authenticated CRUD store for opaque records.
//! This module defines what the client needs from it:
//! - `SecretRecord`, the wire form of a secret (ciphertext payload)
//! - `CallMetadata`, the credentials attached to each call
//! - `RemoteStore`, the six calls the core makes
//!
//! Implementations live in `http` (JSON over HTTP) and `memory`
//! (in-process, used by tests and embedders).

pub mod http;
pub mod memory;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::errors::Result;
use crate::vault::secret::{base64_decode, base64_encode};

pub use http::HttpRemote;
pub use memory::{InMemoryRemote, RecordedCall};

/// Header carrying the bearer token.
pub const ACCESS_TOKEN_HEADER: &str = "Access-Token";

/// Header carrying the numeric client id.
pub const CLIENT_ID_HEADER: &str = "X-Client-ID";

/// A secret as stored remotely: descriptive fields in the clear, the
/// variant only as ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
    /// 0 on a create request.
    #[serde(default)]
    pub id: u64,

    #[serde(default)]
    pub user_id: u64,

    pub title: String,

    #[serde(default)]
    pub metadata: String,

    /// Wire tag; may name a type this client does not know.
    pub secret_type: String,

    /// Hex ciphertext bytes (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub payload: Vec<u8>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Per-call credentials.
///
/// Before login there is no token and nothing is attached.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CallMetadata {
    pub access_token: Option<String>,
    pub client_id: u32,
}

impl CallMetadata {
    /// Metadata for calls made before authentication.
    pub fn anonymous(client_id: u32) -> Self {
        Self {
            access_token: None,
            client_id,
        }
    }

    /// Header pairs to attach to a request; empty without a token.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        match &self.access_token {
            Some(token) if !token.is_empty() => vec![
                (ACCESS_TOKEN_HEADER, token.clone()),
                (CLIENT_ID_HEADER, self.client_id.to_string()),
            ],
            _ => Vec::new(),
        }
    }
}

impl std::fmt::Debug for CallMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallMetadata")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("client_id", &self.client_id)
            .finish()
    }
}

/// One remote call: who is calling and how long they will wait.
#[derive(Debug, Clone, Copy)]
pub struct Call<'a> {
    pub metadata: &'a CallMetadata,
    pub cancel: &'a CancelToken,
}

impl<'a> Call<'a> {
    pub fn new(metadata: &'a CallMetadata, cancel: &'a CancelToken) -> Self {
        Self { metadata, cancel }
    }
}

/// The calls the client core makes against the server.
///
/// Errors use the transport part of the taxonomy: `Unauthenticated`,
/// `NotFound`, `AlreadyExists`, `Unavailable`, `Timeout`, `Cancelled`,
/// `Remote`.
pub trait RemoteStore: Send + Sync {
    /// Exchange credentials for a token.  Unknown user and wrong password
    /// are indistinguishable.
    fn login(&self, call: Call<'_>, login: &str, password: &str) -> Result<String>;

    /// Create an account and return its first token.
    fn register(&self, call: Call<'_>, login: &str, password: &str) -> Result<String>;

    fn get_secret(&self, call: Call<'_>, id: u64) -> Result<SecretRecord>;

    /// Every record owned by the caller.
    fn list_secrets(&self, call: Call<'_>) -> Result<Vec<SecretRecord>>;

    /// Create (id 0) or overwrite a record; returns its id.
    fn save_secret(&self, call: Call<'_>, record: &SecretRecord) -> Result<u64>;

    fn delete_secret(&self, call: Call<'_>, id: u64) -> Result<()>;
}

impl<R: RemoteStore + ?Sized> RemoteStore for Arc<R> {
    fn login(&self, call: Call<'_>, login: &str, password: &str) -> Result<String> {
        (**self).login(call, login, password)
    }

    fn register(&self, call: Call<'_>, login: &str, password: &str) -> Result<String> {
        (**self).register(call, login, password)
    }

    fn get_secret(&self, call: Call<'_>, id: u64) -> Result<SecretRecord> {
        (**self).get_secret(call, id)
    }

    fn list_secrets(&self, call: Call<'_>) -> Result<Vec<SecretRecord>> {
        (**self).list_secrets(call)
    }

    fn save_secret(&self, call: Call<'_>, record: &SecretRecord) -> Result<u64> {
        (**self).save_secret(call, record)
    }

    fn delete_secret(&self, call: Call<'_>, id: u64) -> Result<()> {
        (**self).delete_secret(call, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_metadata_attaches_nothing() {
        assert!(CallMetadata::anonymous(7).headers().is_empty());

        let empty_token = CallMetadata {
            access_token: Some(String::new()),
            client_id: 7,
        };
        assert!(empty_token.headers().is_empty());
    }

    #[test]
    fn authenticated_metadata_attaches_token_and_client_id() {
        let meta = CallMetadata {
            access_token: Some("tok".into()),
            client_id: 42,
        };
        assert_eq!(
            meta.headers(),
            vec![
                (ACCESS_TOKEN_HEADER, "tok".to_string()),
                (CLIENT_ID_HEADER, "42".to_string()),
            ]
        );
        assert!(!format!("{meta:?}").contains("tok"));
    }

    #[test]
    fn record_payload_is_base64_in_json() {
        let now = Utc::now();
        let record = SecretRecord {
            id: 1,
            user_id: 2,
            title: "t".into(),
            metadata: String::new(),
            secret_type: "text".into(),
            payload: b"abcd".to_vec(),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["payload"], "YWJjZA==");

        let back: SecretRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
