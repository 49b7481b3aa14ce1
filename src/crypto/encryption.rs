//! AES-256-GCM authenticated encryption with a hex envelope.
//!
//! Each call to `encrypt` generates a fresh random 12-byte nonce and
//! prepends it to the ciphertext.  The whole buffer is then hex-encoded so
//! the payload can travel as text or bytes without escaping.
//!
//! Layout before hex encoding:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};

use super::keys::KEY_LEN;
use crate::errors::{KeepsakeError, Result};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Encrypt `plaintext` with a 32-byte `key`.
///
/// Returns lowercase hex of `nonce || ciphertext || tag`.
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<String> {
    let cipher = build_cipher(key)?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| KeepsakeError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(hex::encode(output))
}

/// Decrypt a hex string produced by `encrypt`.
///
/// The key is validated before the input is even looked at.  A failed tag
/// check returns `AuthenticationFailed` and no plaintext at all.
pub fn decrypt(ciphertext_hex: &str, key: &[u8]) -> Result<Vec<u8>> {
    let cipher = build_cipher(key)?;

    let data = hex::decode(ciphertext_hex)
        .map_err(|e| KeepsakeError::InvalidEncoding(e.to_string()))?;

    if data.len() < NONCE_LEN {
        return Err(KeepsakeError::CiphertextTooShort(data.len()));
    }

    let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| KeepsakeError::AuthenticationFailed)
}

fn build_cipher(key: &[u8]) -> Result<Aes256Gcm> {
    if key.len() != KEY_LEN {
        return Err(KeepsakeError::InvalidKeySize(key.len()));
    }
    Aes256Gcm::new_from_slice(key).map_err(|_| KeepsakeError::InvalidKeySize(key.len()))
}
