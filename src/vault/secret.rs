//! The plaintext secret model handed to the presentation layer.
//!
//! A `Secret` carries descriptive fields that are never encrypted plus
//! at most one `SecretData` variant.  Ciphertext never appears here; it
//! only exists on the wire record exchanged with the remote store.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{KeepsakeError, Result};

/// The closed set of secret kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretType {
    Credential,
    Text,
    Card,
    Blob,
}

impl SecretType {
    /// Every kind, in display order.
    pub const ALL: [SecretType; 4] = [Self::Credential, Self::Text, Self::Card, Self::Blob];

    /// The tag used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Credential => "credential",
            Self::Text => "text",
            Self::Card => "card",
            Self::Blob => "blob",
        }
    }
}

impl fmt::Display for SecretType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecretType {
    type Err = KeepsakeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "credential" => Ok(Self::Credential),
            "text" => Ok(Self::Text),
            "card" => Ok(Self::Card),
            "blob" => Ok(Self::Blob),
            other => Err(KeepsakeError::UnknownSecretType(other.to_string())),
        }
    }
}

/// A login/password pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub login: String,
    pub password: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("login", &self.login)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Free-form text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    pub content: String,
}

/// Payment card details.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub number: String,
    #[serde(rename = "exp_year")]
    pub expiry_year: u32,
    #[serde(rename = "exp_month")]
    pub expiry_month: u32,
    pub cvv: u32,
}

impl Card {
    /// Check the fields a card form would reject.
    pub fn validate(&self) -> Result<()> {
        let all_digits = self
            .number
            .chars()
            .filter(|c| !c.is_whitespace())
            .all(|c| c.is_ascii_digit());
        if self.number.trim().is_empty() || !all_digits {
            return Err(KeepsakeError::InvalidInput(
                "card number must contain only digits".into(),
            ));
        }
        if !(1..=12).contains(&self.expiry_month) {
            return Err(KeepsakeError::InvalidInput(format!(
                "expiry month must be between 1 and 12 (got {})",
                self.expiry_month
            )));
        }
        if self.cvv > 9999 {
            return Err(KeepsakeError::InvalidInput(
                "cvv must have at most 4 digits".into(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tail: String = self
            .number
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        f.debug_struct("Card")
            .field("number", &format!("****{tail}"))
            .field("expiry_month", &self.expiry_month)
            .field("expiry_year", &self.expiry_year)
            .field("cvv", &"[REDACTED]")
            .finish()
    }
}

/// A named file.
///
/// Bytes are base64 in the encoded form, matching how the rest of the
/// ecosystem serializes raw bytes in JSON.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    #[serde(rename = "file_name")]
    pub filename: String,
    #[serde(
        rename = "file_bytes",
        serialize_with = "base64_encode",
        deserialize_with = "base64_decode"
    )]
    pub bytes: Vec<u8>,
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob")
            .field("filename", &self.filename)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

/// Exactly one payload shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretData {
    Credential(Credential),
    Text(Text),
    Card(Card),
    Blob(Blob),
}

impl SecretData {
    /// The tag matching this variant.
    pub fn secret_type(&self) -> SecretType {
        match self {
            Self::Credential(_) => SecretType::Credential,
            Self::Text(_) => SecretType::Text,
            Self::Card(_) => SecretType::Card,
            Self::Blob(_) => SecretType::Blob,
        }
    }
}

/// A secret as the presentation layer sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secret {
    /// Server-assigned id; 0 until first persisted.
    pub id: u64,

    /// Owning user, as reported by the remote store.
    pub user_id: u64,

    pub title: String,

    /// Opaque descriptive string, never encrypted.
    pub metadata: String,

    pub secret_type: SecretType,

    /// The decrypted payload, if any.
    pub data: Option<SecretData>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Secret {
    /// A new, unsaved secret whose tag matches `data`.
    pub fn new(title: impl Into<String>, data: SecretData) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            user_id: 0,
            title: title.into(),
            metadata: String::new(),
            secret_type: data.secret_type(),
            data: Some(data),
            created_at: now,
            updated_at: now,
        }
    }

    /// An unsaved secret of the given kind with no payload yet.
    pub fn empty(secret_type: SecretType) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            user_id: 0,
            title: String::new(),
            metadata: String::new(),
            secret_type,
            data: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder-style metadata setter.
    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = metadata.into();
        self
    }

    /// Replace the payload, retagging the secret to match.
    pub fn set_data(&mut self, data: SecretData) {
        self.secret_type = data.secret_type();
        self.data = Some(data);
    }

    /// `true` once the remote store has assigned an id.
    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }

    /// Render the payload as text suitable for the clipboard.
    ///
    /// Blobs are binary and have no text form.
    pub fn to_clipboard(&self) -> Result<String> {
        match &self.data {
            Some(SecretData::Credential(c)) => {
                Ok(format!("login: {}\npassword: {}", c.login, c.password))
            }
            Some(SecretData::Text(t)) => Ok(t.content.clone()),
            Some(SecretData::Card(c)) => Ok(format!(
                "Card Number: {}\nExp: {:02}/{}\nCVV: {}",
                c.number, c.expiry_month, c.expiry_year, c.cvv
            )),
            Some(SecretData::Blob(_)) => Err(KeepsakeError::InvalidInput(
                "file data cannot be copied to the clipboard".into(),
            )),
            None => Err(KeepsakeError::MissingVariant(self.secret_type)),
        }
    }
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let encoded = BASE64.encode(data);
    serializer.serialize_str(&encoded)
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}
