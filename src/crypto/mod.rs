//! Cryptographic primitives for Keepsake.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption with hex output (`encryption`)
//! - scrypt password-based key derivation (`kdf`)
//! - The zeroize-on-drop session key wrapper (`keys`)

pub mod encryption;
pub mod kdf;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, derive_key, ...};
pub use encryption::{decrypt, encrypt, NONCE_LEN};
pub use kdf::{derive_key, derive_key_with_params, ScryptParams};
pub use keys::{SessionKey, KEY_LEN};
