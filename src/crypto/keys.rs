//! The in-memory session key.
//!
//! A `SessionKey` is derived once per login and lives exactly as long as
//! the store that owns it.  It is never serialized, never printed, and its
//! bytes are wiped when it is dropped.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{KeepsakeError, Result};

/// Length of the session key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// A 32-byte symmetric key that zeroes its memory when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey {
    bytes: [u8; KEY_LEN],
}

impl SessionKey {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Build a key from a slice, rejecting anything that is not 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| KeepsakeError::InvalidKeySize(bytes.len()))?;
        Ok(Self { bytes })
    }

    /// Access the raw key bytes (e.g. to pass to the cipher).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

// Never print key material.
impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey([REDACTED])")
    }
}

impl PartialEq for SessionKey {
    fn eq(&self, other: &Self) -> bool {
        use subtle::ConstantTimeEq;
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl Eq for SessionKey {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_is_redacted() {
        let key = SessionKey::new([0x42; KEY_LEN]);
        let printed = format!("{key:?}");
        assert!(!printed.contains("42"));
        assert!(printed.contains("REDACTED"));
    }

    #[test]
    fn from_slice_rejects_wrong_lengths() {
        assert!(matches!(
            SessionKey::from_slice(&[0u8; 16]),
            Err(KeepsakeError::InvalidKeySize(16))
        ));
        assert!(matches!(
            SessionKey::from_slice(&[0u8; 33]),
            Err(KeepsakeError::InvalidKeySize(33))
        ));
        assert!(SessionKey::from_slice(&[0u8; 32]).is_ok());
    }
}
