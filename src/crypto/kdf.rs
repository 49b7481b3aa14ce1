//! Password-based key derivation using scrypt.
//!
//! scrypt is memory-hard and CPU-hard, which makes offline brute force
//! against a stolen ciphertext dump expensive.  The default parameters
//! (N = 2^15, r = 8, p = 1) cost roughly 32 MB and tens of milliseconds per
//! derivation, paid once per login.

use scrypt::Params;
use zeroize::Zeroize;

use super::keys::{SessionKey, KEY_LEN};
use crate::errors::{KeepsakeError, Result};

/// Configurable scrypt parameters.
///
/// These map 1:1 to the fields in `Settings` so the CLI can pass
/// whatever the user configured in `.keepsake.toml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScryptParams {
    /// log2 of the CPU/memory cost N (default: 15, i.e. N = 32768).
    pub log_n: u8,
    /// Block size r (default: 8).
    pub r: u32,
    /// Parallelism p (default: 1).
    pub p: u32,
}

impl Default for ScryptParams {
    fn default() -> Self {
        Self {
            log_n: MIN_LOG_N,
            r: MIN_R,
            p: 1,
        }
    }
}

/// The defaults are also the floor; configuration may only strengthen them.
const MIN_LOG_N: u8 = 15;
const MIN_R: u32 = 8;

/// Derive the 32-byte session key from a master password and salt.
///
/// The salt may be empty, the password may not.  Same inputs always
/// produce the same key, which is what lets a user reopen their vault
/// from any device without the key ever being stored.
pub fn derive_key(password: &str, salt: &str) -> Result<SessionKey> {
    derive_key_with_params(password, salt, &ScryptParams::default())
}

/// Derive the session key with explicit scrypt parameters.
///
/// Rejects parameters weaker than the defaults.
pub fn derive_key_with_params(
    password: &str,
    salt: &str,
    scrypt_params: &ScryptParams,
) -> Result<SessionKey> {
    if password.is_empty() {
        return Err(KeepsakeError::EmptyPassword);
    }
    if scrypt_params.log_n < MIN_LOG_N {
        return Err(KeepsakeError::KeyDerivationFailed(format!(
            "scrypt log_n must be at least {MIN_LOG_N} (got {})",
            scrypt_params.log_n
        )));
    }
    if scrypt_params.r < MIN_R {
        return Err(KeepsakeError::KeyDerivationFailed(format!(
            "scrypt r must be at least {MIN_R} (got {})",
            scrypt_params.r
        )));
    }
    if scrypt_params.p < 1 {
        return Err(KeepsakeError::KeyDerivationFailed(
            "scrypt p must be at least 1".into(),
        ));
    }

    let params = Params::new(scrypt_params.log_n, scrypt_params.r, scrypt_params.p, KEY_LEN)
        .map_err(|e| KeepsakeError::KeyDerivationFailed(format!("invalid scrypt params: {e}")))?;

    let mut key = [0u8; KEY_LEN];
    scrypt::scrypt(password.as_bytes(), salt.as_bytes(), &params, &mut key)
        .map_err(|e| KeepsakeError::KeyDerivationFailed(format!("scrypt failed: {e}")))?;

    let session_key = SessionKey::new(key);
    key.zeroize();
    Ok(session_key)
}
