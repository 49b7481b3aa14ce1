use std::fmt;

use thiserror::Error;

use crate::vault::SecretType;

/// The store operation an error was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    List,
    Create,
    Update,
    Delete,
    Login,
    Register,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "get",
            Self::List => "list",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Login => "login",
            Self::Register => "register",
        };
        f.write_str(name)
    }
}

/// Coarse classification callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller handed us something unusable.
    Input,
    /// Key derivation or AEAD failure.
    Crypto,
    /// Decrypted bytes did not decode into a secret.
    Codec,
    /// The remote store could not serve the call.
    Transport,
    /// Local configuration, I/O or CLI problems.
    Local,
}

/// All errors that can occur in Keepsake.
#[derive(Debug, Error)]
pub enum KeepsakeError {
    // --- Input errors ---
    #[error("Password must not be empty")]
    EmptyPassword,

    #[error("Invalid key size: expected 32 bytes, got {0}")]
    InvalidKeySize(usize),

    #[error("Unknown secret type '{0}'")]
    UnknownSecretType(String),

    #[error("Secret of type '{0}' has no data to encode")]
    MissingVariant(SecretType),

    #[error("Secret is tagged '{expected}' but holds '{found}' data")]
    VariantMismatch {
        expected: SecretType,
        found: SecretType,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // --- Crypto errors ---
    #[error("Ciphertext is not valid hex: {0}")]
    InvalidEncoding(String),

    #[error("Ciphertext too short: {0} bytes cannot hold a 12-byte nonce")]
    CiphertextTooShort(usize),

    #[error("Ciphertext authentication failed: wrong password or tampered data")]
    AuthenticationFailed,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Codec errors ---
    #[error("Malformed secret payload: {0}")]
    MalformedPayload(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- Transport errors ---
    #[error("Server unavailable: {0}")]
    Unavailable(String),

    #[error("Authentication failed")]
    Unauthenticated,

    #[error("Secret {0} not found")]
    NotFound(u64),

    #[error("User '{0}' already exists")]
    AlreadyExists(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Remote store error: {0}")]
    Remote(String),

    // --- Store context ---
    #[error("Failed to decrypt secret {id} during {op}")]
    DecryptionFailed {
        op: Operation,
        id: u64,
        #[source]
        source: Box<KeepsakeError>,
    },

    #[error("Failed to decode secret {id} during {op}")]
    DecodeFailed {
        op: Operation,
        id: u64,
        #[source]
        source: Box<KeepsakeError>,
    },

    #[error("Failed to seal secret {id} during {op}")]
    EncodeFailed {
        op: Operation,
        id: u64,
        #[source]
        source: Box<KeepsakeError>,
    },

    #[error("Remote {op} failed{}", fmt_id(.id))]
    RemoteCall {
        op: Operation,
        id: Option<u64>,
        #[source]
        source: Box<KeepsakeError>,
    },

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("User cancelled operation")]
    UserCancelled,
}

fn fmt_id(id: &Option<u64>) -> String {
    id.map(|id| format!(" for secret {id}")).unwrap_or_default()
}

impl KeepsakeError {
    /// Classify the error, looking through store context wrappers.
    pub fn kind(&self) -> ErrorKind {
        match self.root_cause() {
            Self::EmptyPassword
            | Self::InvalidKeySize(_)
            | Self::UnknownSecretType(_)
            | Self::MissingVariant(_)
            | Self::VariantMismatch { .. }
            | Self::InvalidInput(_) => ErrorKind::Input,

            Self::InvalidEncoding(_)
            | Self::CiphertextTooShort(_)
            | Self::AuthenticationFailed
            | Self::EncryptionFailed(_)
            | Self::KeyDerivationFailed(_) => ErrorKind::Crypto,

            Self::MalformedPayload(_) | Self::SerializationError(_) => ErrorKind::Codec,

            Self::Unavailable(_)
            | Self::Unauthenticated
            | Self::NotFound(_)
            | Self::AlreadyExists(_)
            | Self::Timeout
            | Self::Cancelled
            | Self::Remote(_) => ErrorKind::Transport,

            Self::ConfigError(_)
            | Self::Io(_)
            | Self::CommandFailed(_)
            | Self::Clipboard(_)
            | Self::UserCancelled => ErrorKind::Local,

            // root_cause never returns a wrapper.
            Self::DecryptionFailed { .. }
            | Self::DecodeFailed { .. }
            | Self::EncodeFailed { .. }
            | Self::RemoteCall { .. } => ErrorKind::Local,
        }
    }

    /// The innermost error beneath any store context.
    pub fn root_cause(&self) -> &KeepsakeError {
        let mut current = self;
        while let Self::DecryptionFailed { source, .. }
        | Self::DecodeFailed { source, .. }
        | Self::EncodeFailed { source, .. }
        | Self::RemoteCall { source, .. } = current
        {
            current = source.as_ref();
        }
        current
    }

    /// `true` when the record does not exist on the remote.
    pub fn is_not_found(&self) -> bool {
        matches!(self.root_cause(), Self::NotFound(_))
    }
}

/// Convenience type alias for Keepsake results.
pub type Result<T> = std::result::Result<T, KeepsakeError>;
